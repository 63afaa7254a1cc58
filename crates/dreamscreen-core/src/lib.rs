//! DreamScreen Core
//!
//! Wire types and device state for the DreamScreen UDP control protocol.
//!
//! This crate provides:
//! - Packet framing with CRC-8 ([`Packet`], [`PacketFlags`])
//! - Command codes ([`Command`])
//! - Typed payload views ([`Rgb`], [`SectorData`], [`FromPayload`])
//! - Device session state and its wire serialization ([`DeviceState`])

pub mod command;
pub mod error;
pub mod packet;
pub mod payload;
pub mod state;

pub use command::Command;
pub use error::{Error, Result};
pub use packet::{Packet, PacketFlags};
pub use payload::{FromPayload, Rgb, SectorData, NAME_SIZE, SECTOR_DATA_SIZE};
pub use state::{DeviceMode, DeviceState, STATE_PAYLOAD_SIZE, STATE_SERIALIZED_SIZE};

/// Magic byte that starts every packet
pub const MAGIC_BYTE: u8 = 0xFC;

/// Default UDP port devices and controllers listen on
pub const DEFAULT_PORT: u16 = 8888;

/// Group address that targets every group
pub const GROUP_ALL: u8 = 0xFF;

/// Device type code reported by a SideKick
pub const DEVICE_TYPE_SIDEKICK: u8 = 0x03;
