//! Device session state
//!
//! Holds the fields a controller can read back with `CurrentState` and the
//! serialization of those fields into the state response payload.

use crate::payload::{encode_name, FromPayload, NAME_SIZE};
use crate::{Error, Result, Rgb, DEVICE_TYPE_SIDEKICK};
use serde::{Deserialize, Serialize};

/// Size of the zero-filled buffer a state response is serialized into
pub const STATE_PAYLOAD_SIZE: usize = 64;

/// Bytes actually produced by [`DeviceState::write_payload`]
pub const STATE_SERIALIZED_SIZE: usize = NAME_SIZE * 2 + 7;

/// Default device name
pub const DEFAULT_NAME: &str = "DreamStream-mac";

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DeviceMode {
    Sleep = 0,
    Video = 1,
    Music = 2,
    #[default]
    Ambient = 3,
}

impl DeviceMode {
    pub fn from_u8(val: u8) -> Option<Self> {
        match val {
            0 => Some(DeviceMode::Sleep),
            1 => Some(DeviceMode::Video),
            2 => Some(DeviceMode::Music),
            3 => Some(DeviceMode::Ambient),
            _ => None,
        }
    }
}

impl FromPayload for DeviceMode {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        let raw = u8::from_payload(payload)?;
        DeviceMode::from_u8(raw).ok_or(Error::InvalidPayload {
            kind: "mode",
            len: payload.len(),
        })
    }
}

/// Mutable state of one emulated endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub ambient_color: Rgb,
    pub brightness: u8,
    pub mode: DeviceMode,
    pub group_number: u8,
    /// Display name; also reported as the group name
    pub name: String,
    /// Most recent sector color taken from a broadcast
    pub last_sector_color: Option<Rgb>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            ambient_color: Rgb::BLACK,
            brightness: u8::MAX,
            mode: DeviceMode::Ambient,
            group_number: 1,
            name: DEFAULT_NAME.to_string(),
            last_sector_color: None,
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize into `buf`, returning the number of bytes written
    ///
    /// Layout:
    /// ```text
    /// 0..16   name
    /// 16..32  group name
    /// 32      group number
    /// 33      mode
    /// 34      brightness
    /// 35..38  ambient R, G, B
    /// 38      device type
    /// ```
    pub fn write_payload(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < STATE_SERIALIZED_SIZE {
            return Err(Error::BufferTooSmall {
                needed: STATE_SERIALIZED_SIZE,
                have: buf.len(),
            });
        }

        let name = encode_name(&self.name);
        buf[..NAME_SIZE].copy_from_slice(&name);
        buf[NAME_SIZE..NAME_SIZE * 2].copy_from_slice(&name);

        let tail = NAME_SIZE * 2;
        buf[tail] = self.group_number;
        buf[tail + 1] = self.mode as u8;
        buf[tail + 2] = self.brightness;
        buf[tail + 3..tail + 6].copy_from_slice(&self.ambient_color.to_bytes());
        buf[tail + 6] = DEVICE_TYPE_SIDEKICK;

        Ok(STATE_SERIALIZED_SIZE)
    }

    /// Serialize into a zero-filled state buffer
    ///
    /// Returns the buffer and the real serialized size, which is what goes
    /// on the wire.
    pub fn to_state_payload(&self) -> ([u8; STATE_PAYLOAD_SIZE], usize) {
        let mut payload = [0u8; STATE_PAYLOAD_SIZE];
        let size = match self.write_payload(&mut payload) {
            Ok(size) => size,
            // STATE_PAYLOAD_SIZE >= STATE_SERIALIZED_SIZE
            Err(_) => 0,
        };
        (payload, size)
    }
}
