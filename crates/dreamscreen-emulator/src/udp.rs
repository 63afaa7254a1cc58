//! UDP endpoint runtime
//!
//! Binds a broadcast-capable socket, feeds every datagram to one emulator
//! and ticks it on a fixed interval until shutdown.

use dreamscreen_core::{Packet, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::dispatch::HandleState;
use crate::emulator::SideKickEmulator;
use crate::error::{EmulatorError, Result, TransportError};
use crate::transport::PacketSender;

/// UDP configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UdpConfig {
    /// Local address to bind
    pub bind_address: SocketAddr,
    /// Receive buffer size; larger datagrams are truncated by the OS
    pub max_packet_size: usize,
    /// Allow sending to broadcast addresses
    pub broadcast: bool,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_packet_size: 1024,
            broadcast: true,
        }
    }
}

/// Socket shared by the receive loop and the packet sender
pub struct UdpEndpoint {
    socket: Arc<UdpSocket>,
    config: UdpConfig,
}

impl UdpEndpoint {
    /// Bind with address reuse so several tools can share the port
    pub async fn bind(config: UdpConfig) -> Result<Self> {
        let addr = config.bind_address;
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_broadcast(config.broadcast)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let socket = UdpSocket::from_std(socket.into())?;
        info!("UDP bound to {}", socket.local_addr()?);

        Ok(Self {
            socket: Arc::new(socket),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Sender that writes through this endpoint's socket
    pub fn sender(&self) -> Arc<UdpPacketSender> {
        Arc::new(UdpPacketSender {
            socket: self.socket.clone(),
        })
    }

    /// Drive `emulator` until `shutdown` fires or its sender is dropped
    ///
    /// Fails before touching the socket if the emulator's tick interval is
    /// zero.
    pub async fn run(
        &self,
        emulator: &mut SideKickEmulator,
        shutdown: &mut mpsc::Receiver<()>,
    ) -> Result<()> {
        let period = emulator.tick_interval();
        if period.is_zero() {
            return Err(EmulatorError::Config("tick interval must be non-zero".to_string()));
        }

        let mut buf = vec![0u8; self.config.max_packet_size];
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, from)) => {
                            let mut hs = HandleState::new();
                            let outcome = emulator.handle_datagram(&mut hs, from, &buf[..len]);
                            if !outcome.is_handled() {
                                debug!("Unhandled datagram ({} bytes) from {}", len, from);
                            }
                        }
                        // ICMP port-unreachable surfaces here on some platforms
                        Err(e) => error!("UDP receive error: {}", e),
                    }
                }
                _ = ticker.tick() => emulator.update(),
                _ = shutdown.recv() => {
                    info!("UDP endpoint shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Non-blocking sender over a shared UDP socket
pub struct UdpPacketSender {
    socket: Arc<UdpSocket>,
}

impl PacketSender for UdpPacketSender {
    fn send_packet(
        &self,
        target: SocketAddr,
        packet: &Packet,
    ) -> std::result::Result<(), TransportError> {
        let data = packet.encode()?;
        self.socket
            .try_send_to(&data, target)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        Ok(())
    }
}
