//! Packet encoding/decoding
//!
//! DreamScreen packet format:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ Byte 0:     Magic (0xFC)                                        │
//! │ Byte 1:     Length (bytes after this one: payload + 4)          │
//! │ Byte 2:     Group address (0xFF = all groups)                   │
//! │ Byte 3:     Flags                                               │
//! │             [6] Response                                        │
//! │             [5] Broadcast                                       │
//! │             [4] Response requested                              │
//! │             [0] Write constant                                  │
//! │ Byte 4:     Command type                                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ Payload (command specific, 0..=251 bytes)                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ CRC-8 (poly 0x07) over every preceding byte                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use crate::{Command, Error, Result, MAGIC_BYTE};
use bytes::{BufMut, Bytes, BytesMut};
use std::ops::{BitOr, BitOrAssign};

/// Header size: magic, length, group, flags, command
pub const HEADER_SIZE: usize = 5;

/// Smallest valid packet (header + CRC, empty payload)
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + 1;

/// Maximum payload the length byte can describe
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - 4;

/// Packet flags bitfield
///
/// Classes are not exclusive; a packet may carry any combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketFlags(u8);

impl PacketFlags {
    pub const NONE: PacketFlags = PacketFlags(0x00);
    pub const WRITE_CONSTANT: PacketFlags = PacketFlags(0x01);
    pub const RESPONSE_REQUEST: PacketFlags = PacketFlags(0x10);
    pub const BROADCAST: PacketFlags = PacketFlags(0x20);
    pub const RESPONSE: PacketFlags = PacketFlags(0x40);

    pub fn from_byte(byte: u8) -> Self {
        PacketFlags(byte)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set
    pub fn contains(self, other: PacketFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set
    pub fn intersects(self, other: PacketFlags) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for PacketFlags {
    type Output = PacketFlags;

    fn bitor(self, rhs: PacketFlags) -> PacketFlags {
        PacketFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PacketFlags {
    fn bitor_assign(&mut self, rhs: PacketFlags) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for PacketFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (PacketFlags::RESPONSE, "RESPONSE"),
            (PacketFlags::BROADCAST, "BROADCAST"),
            (PacketFlags::RESPONSE_REQUEST, "RESPONSE_REQUEST"),
            (PacketFlags::WRITE_CONSTANT, "WRITE_CONSTANT"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if set.is_empty() {
            write!(f, "0x{:02x}", self.0)
        } else {
            write!(f, "{} (0x{:02x})", set.join("|"), self.0)
        }
    }
}

/// A DreamScreen packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub group: u8,
    pub flags: PacketFlags,
    pub command: Command,
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet addressed to all groups with an empty payload
    pub fn new(command: Command, flags: PacketFlags) -> Self {
        Self {
            group: crate::GROUP_ALL,
            flags,
            command,
            payload: Bytes::new(),
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Set the group address
    pub fn with_group(mut self, group: u8) -> Self {
        self.group = group;
        self
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        MIN_PACKET_SIZE + self.payload.len()
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> Result<Bytes> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge(self.payload.len()));
        }

        let mut buf = BytesMut::with_capacity(self.size());
        buf.put_u8(MAGIC_BYTE);
        buf.put_u8((self.payload.len() + 4) as u8);
        buf.put_u8(self.group);
        buf.put_u8(self.flags.to_byte());
        buf.put_u8(self.command.to_u8());
        buf.extend_from_slice(&self.payload);

        let crc = crc8(&buf);
        buf.put_u8(crc);

        Ok(buf.freeze())
    }

    /// Decode a packet from a datagram
    ///
    /// Bytes past the declared length are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < MIN_PACKET_SIZE {
            return Err(Error::BufferTooSmall {
                needed: MIN_PACKET_SIZE,
                have: buf.len(),
            });
        }

        if buf[0] != MAGIC_BYTE {
            return Err(Error::InvalidMagic(buf[0]));
        }

        let length = buf[1];
        if (length as usize) < MIN_PACKET_SIZE - 2 {
            return Err(Error::InvalidLength(length));
        }

        let total = length as usize + 2;
        if buf.len() < total {
            return Err(Error::BufferTooSmall {
                needed: total,
                have: buf.len(),
            });
        }

        let expected = crc8(&buf[..total - 1]);
        let actual = buf[total - 1];
        if expected != actual {
            return Err(Error::ChecksumMismatch { expected, actual });
        }

        Ok(Self {
            group: buf[2],
            flags: PacketFlags::from_byte(buf[3]),
            command: Command::from_u8(buf[4]),
            payload: Bytes::copy_from_slice(&buf[HEADER_SIZE..total - 1]),
        })
    }
}

/// CRC-8 with polynomial 0x07 and zero init
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |mut crc, &byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
        crc
    })
}
