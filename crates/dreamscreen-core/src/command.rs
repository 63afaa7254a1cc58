//! Command type codes

/// Command carried in the type byte of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Mode,
    Brightness,
    AmbientColor,
    Name,
    GroupName,
    GroupNumber,
    CurrentState,
    Ping,
    SubscribeToSectorData,
    SectorData,
    /// A code this endpoint does not model
    Unknown(u8),
}

impl Command {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0x01 => Command::Mode,
            0x02 => Command::Brightness,
            0x05 => Command::AmbientColor,
            0x07 => Command::Name,
            0x08 => Command::GroupName,
            0x09 => Command::GroupNumber,
            0x0A => Command::CurrentState,
            0x0B => Command::Ping,
            0x0C => Command::SubscribeToSectorData,
            0x16 => Command::SectorData,
            other => Command::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Command::Mode => 0x01,
            Command::Brightness => 0x02,
            Command::AmbientColor => 0x05,
            Command::Name => 0x07,
            Command::GroupName => 0x08,
            Command::GroupNumber => 0x09,
            Command::CurrentState => 0x0A,
            Command::Ping => 0x0B,
            Command::SubscribeToSectorData => 0x0C,
            Command::SectorData => 0x16,
            Command::Unknown(code) => code,
        }
    }

    /// Whether this is one of the modeled commands
    pub fn is_known(self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}

impl From<u8> for Command {
    fn from(val: u8) -> Self {
        Command::from_u8(val)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Unknown(code) => write!(f, "Unknown(0x{:02x})", code),
            other => write!(f, "{:?}", other),
        }
    }
}
