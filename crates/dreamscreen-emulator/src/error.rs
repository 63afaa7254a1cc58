//! Emulator error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmulatorError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("encode error: {0}")]
    Encode(#[from] dreamscreen_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("core protocol error: {0}")]
    Core(#[from] dreamscreen_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
