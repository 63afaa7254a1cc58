//! DreamScreen SideKick Emulator
//!
//! One emulated ambient-light endpoint:
//! - Classifies inbound packets by flag class and routes them by command
//! - Keeps device state (color, brightness, mode, group, name)
//! - Tracks a sector-data subscription that lapses without refreshes
//! - Drives an attached light output
//!
//! Transport is injected through [`PacketSender`]; the `udp` feature adds a
//! tokio socket runtime that does the wiring.
//!
//! # Example
//!
//! ```no_run
//! use dreamscreen_emulator::{EmulatorConfig, LogOutput, SideKickEmulator, UdpConfig, UdpEndpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = UdpEndpoint::bind(UdpConfig::default()).await?;
//!     let mut emulator = SideKickEmulator::new(EmulatorConfig::default(), endpoint.sender())
//!         .with_output(LogOutput::new());
//!
//!     let (_shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel(1);
//!     endpoint.run(&mut emulator, &mut shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod emulator;
pub mod error;
pub mod output;
pub mod subscription;
pub mod transport;

#[cfg(feature = "udp")]
pub mod udp;

pub use config::{EmulatorConfig, PeerPolicy};
pub use dispatch::{FlagClass, HandleState, Outcome};
pub use emulator::SideKickEmulator;
pub use error::{EmulatorError, Result, TransportError};
pub use output::{LogOutput, NullOutput, OutputSink};
pub use subscription::{SubscriptionState, SubscriptionTimer, SECTOR_SUBSCRIPTION_TIMEOUT};
pub use transport::{Clock, PacketSender, SystemClock};

#[cfg(feature = "udp")]
pub use udp::{UdpConfig, UdpEndpoint, UdpPacketSender};
