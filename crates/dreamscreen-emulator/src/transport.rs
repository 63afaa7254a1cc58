//! Outbound packet trait and monotonic clock

use dreamscreen_core::Packet;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::TransportError;

/// Fire-and-forget packet delivery
///
/// Implementations must not block; the emulator calls this from its
/// dispatch path and only logs failures.
pub trait PacketSender: Send + Sync {
    /// Frame and send a packet to `target`
    fn send_packet(&self, target: SocketAddr, packet: &Packet) -> Result<(), TransportError>;
}

/// Monotonic time source for the subscription timer
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
