//! Error types for DreamScreen framing

use thiserror::Error;

/// Result type alias for DreamScreen core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Framing and payload errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid magic byte in packet header
    #[error("invalid magic byte: expected 0xfc, got 0x{0:02x}")]
    InvalidMagic(u8),

    /// Packet payload too large to describe in the length byte
    #[error("payload too large: {0} bytes (max 251)")]
    PayloadTooLarge(usize),

    /// Buffer too small for the declared packet
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },

    /// Length byte smaller than the fixed part of a packet
    #[error("invalid length byte: {0}")]
    InvalidLength(u8),

    /// CRC-8 trailer does not match the packet contents
    #[error("checksum mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Payload could not be interpreted as the requested type
    #[error("invalid payload for {kind}: {len} bytes")]
    InvalidPayload { kind: &'static str, len: usize },

    /// Name longer than the fixed name buffer
    #[error("name too long: {0} bytes (max 16)")]
    NameTooLong(usize),
}
