//! Typed payload views
//!
//! Every view checks the payload size before reading a single field, so a
//! short or garbled payload from a mismatched peer is an `Err`, never a panic.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Size of the fixed name buffer
pub const NAME_SIZE: usize = 16;

/// Number of RGB zones in a sector data payload
pub const SECTOR_ZONES: usize = 12;

/// Sector data payload size
pub const SECTOR_DATA_SIZE: usize = SECTOR_ZONES * 3;

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Overwrite channels with whatever bytes are present, without validation
    pub fn copy_from_raw(&mut self, raw: &[u8]) {
        let mut bytes = self.to_bytes();
        let n = raw.len().min(3);
        bytes[..n].copy_from_slice(&raw[..n]);
        *self = Rgb::from(bytes);
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Rgb::new(bytes[0], bytes[1], bytes[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(rgb: Rgb) -> Self {
        rgb.to_bytes()
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Sector color block broadcast by a DreamScreen controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorData {
    pub zones: [Rgb; SECTOR_ZONES],
}

impl SectorData {
    /// Color of the first zone; the one a single-LED endpoint displays
    pub fn primary(&self) -> Rgb {
        self.zones[0]
    }

    pub fn to_bytes(&self) -> [u8; SECTOR_DATA_SIZE] {
        let mut out = [0u8; SECTOR_DATA_SIZE];
        for (chunk, zone) in out.chunks_exact_mut(3).zip(self.zones.iter()) {
            chunk.copy_from_slice(&zone.to_bytes());
        }
        out
    }
}

/// Decode a value from a packet payload
pub trait FromPayload: Sized {
    fn from_payload(payload: &[u8]) -> Result<Self>;
}

impl FromPayload for u8 {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload {
            [value] => Ok(*value),
            _ => Err(Error::InvalidPayload {
                kind: "u8",
                len: payload.len(),
            }),
        }
    }
}

impl FromPayload for String {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() > NAME_SIZE {
            return Err(Error::NameTooLong(payload.len()));
        }

        let end = payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(payload.len());
        let name = std::str::from_utf8(&payload[..end]).map_err(|_| Error::InvalidPayload {
            kind: "name",
            len: payload.len(),
        })?;

        if name.is_empty() {
            return Err(Error::InvalidPayload {
                kind: "name",
                len: payload.len(),
            });
        }

        Ok(name.to_string())
    }
}

impl FromPayload for Rgb {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        match payload {
            [r, g, b, ..] => Ok(Rgb::new(*r, *g, *b)),
            _ => Err(Error::InvalidPayload {
                kind: "rgb",
                len: payload.len(),
            }),
        }
    }
}

impl FromPayload for SectorData {
    fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < SECTOR_DATA_SIZE {
            return Err(Error::InvalidPayload {
                kind: "sector data",
                len: payload.len(),
            });
        }

        let mut zones = [Rgb::BLACK; SECTOR_ZONES];
        for (zone, chunk) in zones
            .iter_mut()
            .zip(payload[..SECTOR_DATA_SIZE].chunks_exact(3))
        {
            *zone = Rgb::new(chunk[0], chunk[1], chunk[2]);
        }

        Ok(Self { zones })
    }
}

/// Assign `target` from `payload`, leaving it untouched if the payload
/// does not decode. Returns whether the assignment happened.
pub fn try_set_from_payload<T: FromPayload>(target: &mut T, payload: &[u8]) -> bool {
    match T::from_payload(payload) {
        Ok(value) => {
            *target = value;
            true
        }
        Err(_) => false,
    }
}

/// Encode a name into the fixed, NUL padded name buffer
///
/// Names longer than the buffer are cut at the last full UTF-8 character.
pub fn encode_name(name: &str) -> [u8; NAME_SIZE] {
    let mut out = [0u8; NAME_SIZE];
    let mut end = name.len().min(NAME_SIZE);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    out[..end].copy_from_slice(&name.as_bytes()[..end]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_requires_exact_size() {
        assert_eq!(u8::from_payload(&[7]), Ok(7));
        assert!(u8::from_payload(&[]).is_err());
        assert!(u8::from_payload(&[1, 2]).is_err());
    }

    #[test]
    fn test_name_trims_padding() {
        let buf = encode_name("Living Room");
        assert_eq!(String::from_payload(&buf).unwrap(), "Living Room");
        assert!(String::from_payload(&[0u8; 4]).is_err());
        assert!(String::from_payload(&[b'a'; 17]).is_err());
        assert!(String::from_payload(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_encode_name_truncates_on_char_boundary() {
        // 15 ASCII bytes followed by a 2-byte character
        let name = "abcdefghijklmnoé";
        let buf = encode_name(name);
        assert_eq!(&buf[..15], b"abcdefghijklmno");
        assert_eq!(buf[15], 0);
    }

    #[test]
    fn test_sector_data_rejects_short_payload() {
        assert!(SectorData::from_payload(&[0u8; SECTOR_DATA_SIZE - 1]).is_err());

        let mut payload = [0u8; SECTOR_DATA_SIZE];
        payload[..3].copy_from_slice(&[40, 50, 60]);
        payload[33..].copy_from_slice(&[1, 2, 3]);
        let data = SectorData::from_payload(&payload).unwrap();
        assert_eq!(data.primary(), Rgb::new(40, 50, 60));
        assert_eq!(data.zones[11], Rgb::new(1, 2, 3));
        assert_eq!(data.to_bytes(), payload);
    }

    #[test]
    fn test_try_set_leaves_target_on_failure() {
        let mut brightness = 128u8;
        assert!(!try_set_from_payload(&mut brightness, &[]));
        assert_eq!(brightness, 128);
        assert!(try_set_from_payload(&mut brightness, &[200]));
        assert_eq!(brightness, 200);
    }

    #[test]
    fn test_rgb_raw_copy_partial() {
        let mut color = Rgb::new(1, 2, 3);
        color.copy_from_raw(&[9]);
        assert_eq!(color, Rgb::new(9, 2, 3));
        color.copy_from_raw(&[10, 20, 30, 40]);
        assert_eq!(color, Rgb::new(10, 20, 30));
    }
}
