//! Emulator configuration

use dreamscreen_core::{DeviceMode, DeviceState, Rgb, NAME_SIZE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{EmulatorError, Result};
use crate::subscription::SECTOR_SUBSCRIPTION_TIMEOUT;

/// How the endpoint picks the controller it talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerPolicy {
    /// Bind to whichever controller subscribes first; unbind on timeout
    #[default]
    Dynamic,
    /// Always talk to this address; never rebind or unbind
    Fixed(SocketAddr),
}

impl PeerPolicy {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, PeerPolicy::Dynamic)
    }

    /// Address bound at construction
    pub fn initial_host(&self) -> Option<SocketAddr> {
        match self {
            PeerPolicy::Dynamic => None,
            PeerPolicy::Fixed(addr) => Some(*addr),
        }
    }
}

/// Settings for one emulated endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub name: String,
    pub group_number: u8,
    pub brightness: u8,
    pub mode: DeviceMode,
    pub ambient_color: Rgb,
    pub peer: PeerPolicy,
    pub subscription_timeout_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        let state = DeviceState::default();
        Self {
            name: state.name,
            group_number: state.group_number,
            brightness: state.brightness,
            mode: state.mode,
            ambient_color: state.ambient_color,
            peer: PeerPolicy::Dynamic,
            subscription_timeout_ms: SECTOR_SUBSCRIPTION_TIMEOUT.as_millis() as u64,
            tick_interval_ms: 100,
        }
    }
}

impl EmulatorConfig {
    pub fn new(name: &str) -> Self {
        Self::default().with_name(name)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_peer(mut self, peer: PeerPolicy) -> Self {
        self.peer = peer;
        self
    }

    pub fn with_subscription_timeout(mut self, timeout: Duration) -> Self {
        self.subscription_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn subscription_timeout(&self) -> Duration {
        Duration::from_millis(self.subscription_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// State the endpoint starts with
    pub fn initial_state(&self) -> DeviceState {
        DeviceState {
            ambient_color: self.ambient_color,
            brightness: self.brightness,
            mode: self.mode,
            group_number: self.group_number,
            name: self.name.clone(),
            last_sector_color: None,
        }
    }

    /// Check settings that would make the endpoint misbehave
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > NAME_SIZE {
            return Err(EmulatorError::Config(format!(
                "name must be 1..={} bytes, got {}",
                NAME_SIZE,
                self.name.len()
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(EmulatorError::Config("tick interval must be non-zero".to_string()));
        }

        // Expiry is only detected on ticks
        if self.tick_interval_ms >= self.subscription_timeout_ms {
            return Err(EmulatorError::Config(format!(
                "tick interval ({} ms) must be shorter than the subscription timeout ({} ms)",
                self.tick_interval_ms, self.subscription_timeout_ms
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EmulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.name, "DreamStream-mac");
        assert_eq!(config.subscription_timeout(), SECTOR_SUBSCRIPTION_TIMEOUT);
    }

    #[test]
    fn test_validate_rejects_slow_tick() {
        let config = EmulatorConfig::default()
            .with_subscription_timeout(Duration::from_millis(100))
            .with_tick_interval(Duration::from_millis(100));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let config = EmulatorConfig::new("a name that is far too long");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fixed_peer_initial_host() {
        let addr: SocketAddr = "192.168.1.20:8888".parse().unwrap();
        assert_eq!(PeerPolicy::Fixed(addr).initial_host(), Some(addr));
        assert_eq!(PeerPolicy::Dynamic.initial_host(), None);
    }
}
