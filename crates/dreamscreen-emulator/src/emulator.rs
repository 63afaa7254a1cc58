//! Emulated SideKick endpoint
//!
//! Inbound packets are classified by flag class and routed through one
//! command table per class; see [`crate::dispatch`]. All handlers run to
//! completion synchronously. Replies are fire-and-forget through the
//! injected [`PacketSender`].

use bytes::Bytes;
use dreamscreen_core::payload::try_set_from_payload;
use dreamscreen_core::{
    Command, DeviceMode, DeviceState, FromPayload, Packet, PacketFlags, SectorData,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::config::{EmulatorConfig, PeerPolicy};
use crate::dispatch::{FlagClass, HandleState, Outcome};
use crate::output::{NullOutput, OutputSink};
use crate::subscription::{SectorSubscription, SubscriptionState};
use crate::transport::{Clock, PacketSender, SystemClock};

type ClassHandler = fn(&mut SideKickEmulator, SocketAddr, &Packet) -> Outcome;

/// Flag classes paired with their command tables, in evaluation order
const DISPATCH_TABLE: [(FlagClass, ClassHandler); 3] = [
    (
        FlagClass::ResponseOrBroadcast,
        SideKickEmulator::route_response_or_broadcast,
    ),
    (
        FlagClass::ResponseRequested,
        SideKickEmulator::route_response_requested,
    ),
    (FlagClass::WriteConstant, SideKickEmulator::route_write_constant),
];

/// Acknowledgement payload for `SubscribeToSectorData`
const SUBSCRIBE_ACK: [u8; 1] = [1];

/// One emulated SideKick
pub struct SideKickEmulator {
    state: DeviceState,
    subscription: SectorSubscription,
    peer_policy: PeerPolicy,
    host: Option<SocketAddr>,
    tick_interval: Duration,
    sender: Arc<dyn PacketSender>,
    output: Box<dyn OutputSink>,
    clock: Arc<dyn Clock>,
    last_sector_at: Option<Instant>,
}

impl SideKickEmulator {
    /// Create an endpoint with no light attached and the system clock
    pub fn new(config: EmulatorConfig, sender: Arc<dyn PacketSender>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            state: config.initial_state(),
            subscription: SectorSubscription::new(config.subscription_timeout(), clock.now()),
            peer_policy: config.peer,
            host: config.peer.initial_host(),
            tick_interval: config.tick_interval(),
            sender,
            output: Box::new(NullOutput),
            clock,
            last_sector_at: None,
        }
    }

    /// Attach a light output; the current brightness is applied immediately
    pub fn with_output(mut self, output: impl OutputSink + 'static) -> Self {
        self.output = Box::new(output);
        self.output.set_brightness(self.state.brightness);
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let timeout = self.subscription.timer().timeout();
        self.subscription = SectorSubscription::new(timeout, clock.now());
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscription.state()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn host_address(&self) -> Option<SocketAddr> {
        self.host
    }

    pub fn peer_policy(&self) -> PeerPolicy {
        self.peer_policy
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Bind or unbind the active controller
    pub fn set_host_address(&mut self, addr: Option<SocketAddr>) {
        debug!(from = ?self.host, to = ?addr, "Host address changed");
        self.host = addr;
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Decode a datagram and dispatch it
    ///
    /// Undecodable datagrams leave `hs` untouched.
    pub fn handle_datagram(
        &mut self,
        hs: &mut HandleState,
        source: SocketAddr,
        data: &[u8],
    ) -> Outcome {
        match Packet::decode(data) {
            Ok(packet) => self.handle_packet(hs, source, &packet),
            Err(e) => {
                debug!(%source, len = data.len(), "Dropping undecodable datagram: {}", e);
                hs.outcome()
            }
        }
    }

    /// Route a packet through every flag class it matches
    pub fn handle_packet(
        &mut self,
        hs: &mut HandleState,
        source: SocketAddr,
        packet: &Packet,
    ) -> Outcome {
        for (class, handler) in DISPATCH_TABLE {
            if !class.matches(packet.flags) {
                continue;
            }

            let outcome = handler(self, source, packet);
            debug!(
                %source,
                command = %packet.command,
                flags = %packet.flags,
                ?class,
                ?outcome,
                "Packet routed"
            );
            hs.record(class, outcome);
        }

        hs.outcome()
    }

    /// Command table for `RESPONSE` / `BROADCAST` packets
    pub fn route_response_or_broadcast(&mut self, _source: SocketAddr, packet: &Packet) -> Outcome {
        match packet.command {
            Command::SectorData => {
                self.handle_sector_data(packet);
                Outcome::Handled
            }
            _ => Outcome::Unhandled,
        }
    }

    /// Command table for `RESPONSE_REQUEST` packets
    pub fn route_response_requested(&mut self, source: SocketAddr, packet: &Packet) -> Outcome {
        match packet.command {
            Command::SubscribeToSectorData => self.handle_subscribe(source),
            Command::CurrentState => self.handle_current_state(source),
            Command::Ping => self.send_packet(source, Command::Ping, PacketFlags::RESPONSE, &[]),
            _ => return Outcome::Unhandled,
        }
        Outcome::Handled
    }

    /// Command table for `WRITE_CONSTANT` packets
    ///
    /// Typed writes that fail to decode leave the field as it was.
    pub fn route_write_constant(&mut self, _source: SocketAddr, packet: &Packet) -> Outcome {
        let payload = &packet.payload[..];
        let applied = match packet.command {
            Command::AmbientColor => {
                self.state.ambient_color.copy_from_raw(payload);
                true
            }
            Command::Brightness => {
                let applied = try_set_from_payload(&mut self.state.brightness, payload);
                if applied {
                    self.output.set_brightness(self.state.brightness);
                }
                applied
            }
            Command::Mode => try_set_from_payload(&mut self.state.mode, payload),
            Command::GroupNumber => try_set_from_payload(&mut self.state.group_number, payload),
            Command::Name | Command::GroupName => {
                try_set_from_payload(&mut self.state.name, payload)
            }
            _ => return Outcome::Unhandled,
        };

        if !applied {
            trace!(
                command = %packet.command,
                len = payload.len(),
                "Ignoring write with malformed payload"
            );
        }
        Outcome::Handled
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn handle_current_state(&mut self, source: SocketAddr) {
        let (payload, size) = self.state.to_state_payload();
        self.send_packet(
            source,
            Command::CurrentState,
            PacketFlags::RESPONSE,
            &payload[..size],
        );
    }

    fn handle_subscribe(&mut self, source: SocketAddr) {
        if self.subscription.activate() {
            if self.peer_policy.is_dynamic() {
                self.set_host_address(Some(source));
            }
            info!(
                controller = %source,
                "Received SubscribeToSectorData broadcast, subscribing to sector data"
            );
        }

        self.send_command(
            Command::SubscribeToSectorData,
            PacketFlags::RESPONSE_REQUEST,
            &SUBSCRIBE_ACK,
        );
        self.subscription.refresh(self.clock.now());
    }

    fn handle_sector_data(&mut self, packet: &Packet) {
        if !packet.flags.contains(PacketFlags::RESPONSE) {
            trace!(flags = %packet.flags, "Ignoring sector data without RESPONSE flag");
            return;
        }

        let data = match SectorData::from_payload(&packet.payload) {
            Ok(data) => data,
            Err(e) => {
                trace!("Ignoring sector data: {}", e);
                return;
            }
        };

        let now = self.clock.now();
        let interval = self
            .last_sector_at
            .map(|prev| now.saturating_duration_since(prev));
        self.last_sector_at = Some(now);

        let color = data.primary();
        debug!(
            %color,
            interval_ms = interval.map(|d| d.as_millis() as u64),
            "Sector data received"
        );

        self.state.last_sector_color = Some(color);
        self.output.show_sectors(&data, interval);
        self.output.set_color(color);
        self.output.show();
    }

    // =========================================================================
    // Periodic tick
    // =========================================================================

    /// Expire a lapsed subscription, then render
    ///
    /// Must be called more often than the subscription timeout.
    pub fn update(&mut self) {
        if self.subscription.expire_if_lapsed(self.clock.now()) {
            if self.peer_policy.is_dynamic() {
                self.set_host_address(None);
            }
            info!("Sector subscription timed out");
        }

        self.render();
    }

    /// Show the ambient color when in ambient mode
    pub fn render(&mut self) {
        if self.state.mode == DeviceMode::Ambient {
            self.output.set_color(self.state.ambient_color);
        }
        self.output.show();
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Send a packet to an explicit address
    pub fn send_packet(
        &self,
        target: SocketAddr,
        command: Command,
        flags: PacketFlags,
        payload: &[u8],
    ) {
        let packet = Packet::new(command, flags)
            .with_group(self.state.group_number)
            .with_payload(Bytes::copy_from_slice(payload));

        if let Err(e) = self.sender.send_packet(target, &packet) {
            warn!(%target, %command, "Failed to send packet: {}", e);
        }
    }

    /// Send a packet to the bound controller
    pub fn send_command(&self, command: Command, flags: PacketFlags, payload: &[u8]) {
        match self.host {
            Some(host) => self.send_packet(host, command, flags, payload),
            None => debug!(%command, "No host bound, dropping command"),
        }
    }
}

impl std::fmt::Debug for SideKickEmulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SideKickEmulator")
            .field("state", &self.state)
            .field("subscription", &self.subscription.state())
            .field("peer_policy", &self.peer_policy)
            .field("host", &self.host)
            .finish()
    }
}
