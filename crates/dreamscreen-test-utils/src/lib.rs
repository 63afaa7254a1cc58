//! Common test helpers for DreamScreen emulator tests
//!
//! This crate provides:
//! - A packet sender that records instead of sending
//! - An output sink that records what would be displayed
//! - A manually advanced clock for subscription timeouts
//! - A `tracing` layer that captures log events for assertions
//! - Packet builders for the commands a controller sends
//! - A [`Harness`] wiring all of the above around one emulator

use bytes::Bytes;
use dreamscreen_core::{Command, Packet, PacketFlags, Rgb, SectorData, SECTOR_DATA_SIZE};
use dreamscreen_emulator::{
    Clock, EmulatorConfig, HandleState, OutputSink, Outcome, PacketSender, SideKickEmulator,
    TransportError,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

/// Address used as "the controller" in tests
pub fn controller_addr() -> SocketAddr {
    "192.168.1.50:8888".parse().unwrap()
}

/// A second controller address
pub fn other_controller_addr() -> SocketAddr {
    "192.168.1.51:8888".parse().unwrap()
}

// ============================================================================
// Recording Sender
// ============================================================================

/// A packet handed to the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
    pub target: SocketAddr,
    pub packet: Packet,
}

/// Sender that stores packets; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentPacket>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send return an error
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn sent(&self) -> Vec<SentPacket> {
        self.sent.lock().clone()
    }

    /// Drain recorded packets
    pub fn take(&self) -> Vec<SentPacket> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl PacketSender for RecordingSender {
    fn send_packet(&self, target: SocketAddr, packet: &Packet) -> Result<(), TransportError> {
        // Encode like a real transport would, to catch oversized payloads
        packet.encode()?;
        if *self.fail.lock() {
            return Err(TransportError::SendFailed("simulated failure".to_string()));
        }
        self.sent.lock().push(SentPacket {
            target,
            packet: packet.clone(),
        });
        Ok(())
    }
}

// ============================================================================
// Recording Output
// ============================================================================

/// What a [`RecordingOutput`] has seen
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    pub staged: Option<Rgb>,
    pub shown: Option<Rgb>,
    pub show_calls: usize,
    pub brightness_calls: Vec<u8>,
    pub sector_frames: Vec<(SectorData, Option<Duration>)>,
}

/// Output sink that records; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> OutputLog {
        self.log.lock().clone()
    }

    /// Color last pushed to the "LED"
    pub fn shown(&self) -> Option<Rgb> {
        self.log.lock().shown
    }

    pub fn brightness_calls(&self) -> Vec<u8> {
        self.log.lock().brightness_calls.clone()
    }
}

impl OutputSink for RecordingOutput {
    fn set_color(&mut self, color: Rgb) {
        self.log.lock().staged = Some(color);
    }

    fn set_brightness(&mut self, level: u8) {
        self.log.lock().brightness_calls.push(level);
    }

    fn show(&mut self) {
        let mut log = self.log.lock();
        log.shown = log.staged;
        log.show_calls += 1;
    }

    fn show_sectors(&mut self, data: &SectorData, interval: Option<Duration>) {
        self.log.lock().sector_frames.push((*data, interval));
    }
}

// ============================================================================
// Manual Clock
// ============================================================================

/// Clock that only moves when told to
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

// ============================================================================
// Log Capture
// ============================================================================

/// A log event seen by [`LogCapture`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Layer that records every event's level and message; clones share the
/// same log
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this layer as the thread's subscriber
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// Number of events at `level` whose message contains `needle`
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .count()
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

// ============================================================================
// Packet Builders
// ============================================================================

/// `WRITE_CONSTANT` packet with a payload
pub fn write(command: Command, payload: &[u8]) -> Packet {
    Packet::new(command, PacketFlags::WRITE_CONSTANT)
        .with_payload(Bytes::copy_from_slice(payload))
}

/// `RESPONSE_REQUEST` packet with no payload
pub fn request(command: Command) -> Packet {
    Packet::new(command, PacketFlags::RESPONSE_REQUEST)
}

/// `SubscribeToSectorData` as a controller broadcasts it
pub fn subscribe() -> Packet {
    Packet::new(
        Command::SubscribeToSectorData,
        PacketFlags::RESPONSE_REQUEST | PacketFlags::BROADCAST,
    )
    .with_payload(vec![1u8])
}

/// 36-byte sector payload with `first` in zone 0 and a gradient after it
pub fn sector_payload(first: Rgb) -> Vec<u8> {
    let mut payload = vec![0u8; SECTOR_DATA_SIZE];
    payload[..3].copy_from_slice(&first.to_bytes());
    for (i, byte) in payload.iter_mut().enumerate().skip(3) {
        *byte = i as u8;
    }
    payload
}

/// `SectorData` broadcast with the given flags
pub fn sector_data(flags: PacketFlags, payload: Vec<u8>) -> Packet {
    Packet::new(Command::SectorData, flags).with_payload(payload)
}

/// Well-formed `SectorData` response broadcast
pub fn sector_broadcast(first: Rgb) -> Packet {
    sector_data(
        PacketFlags::RESPONSE | PacketFlags::BROADCAST,
        sector_payload(first),
    )
}

// ============================================================================
// Harness
// ============================================================================

/// One emulator with recording collaborators
pub struct Harness {
    pub emulator: SideKickEmulator,
    pub sender: RecordingSender,
    pub output: RecordingOutput,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    pub fn with_config(config: EmulatorConfig) -> Self {
        let sender = RecordingSender::new();
        let output = RecordingOutput::new();
        let clock = ManualClock::new();

        let emulator = SideKickEmulator::new(config, Arc::new(sender.clone()))
            .with_clock(Arc::new(clock.clone()))
            .with_output(output.clone());

        Self {
            emulator,
            sender,
            output,
            clock,
        }
    }

    /// Deliver a packet from the default controller
    pub fn deliver(&mut self, packet: &Packet) -> Outcome {
        self.deliver_from(controller_addr(), packet)
    }

    pub fn deliver_from(&mut self, source: SocketAddr, packet: &Packet) -> Outcome {
        let mut hs = HandleState::new();
        self.emulator.handle_packet(&mut hs, source, packet)
    }

    /// Advance the clock and run one tick
    pub fn tick_after(&mut self, elapsed: Duration) {
        self.clock.advance(elapsed);
        self.emulator.update();
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
