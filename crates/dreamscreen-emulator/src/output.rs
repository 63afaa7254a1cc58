//! Light output sinks
//!
//! An endpoint owns exactly one sink. Ambient rendering on the update tick
//! and sector broadcasts both write the same color slot; the later write
//! wins.

use dreamscreen_core::{Rgb, SectorData};
use std::time::Duration;
use tracing::{debug, trace};

/// Attached light source
pub trait OutputSink: Send {
    /// Stage the color to display
    fn set_color(&mut self, color: Rgb);

    /// Apply a new brightness level
    fn set_brightness(&mut self, level: u8);

    /// Push the staged color to the physical output
    fn show(&mut self) {}

    /// Diagnostic hook for every accepted sector broadcast
    ///
    /// `interval` is the time since the previous accepted broadcast.
    fn show_sectors(&mut self, _data: &SectorData, _interval: Option<Duration>) {}
}

/// Sink for endpoints without a light attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl OutputSink for NullOutput {
    fn set_color(&mut self, _color: Rgb) {}

    fn set_brightness(&mut self, _level: u8) {}
}

/// Sink that reports color changes through `tracing`
#[derive(Debug, Default)]
pub struct LogOutput {
    staged: Rgb,
    shown: Option<Rgb>,
    brightness: u8,
}

impl LogOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color last pushed by [`OutputSink::show`]
    pub fn shown(&self) -> Option<Rgb> {
        self.shown
    }
}

impl OutputSink for LogOutput {
    fn set_color(&mut self, color: Rgb) {
        self.staged = color;
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        debug!(brightness = level, "Output brightness changed");
    }

    fn show(&mut self) {
        if self.shown != Some(self.staged) {
            debug!(color = %self.staged, brightness = self.brightness, "Output color changed");
            self.shown = Some(self.staged);
        }
    }

    fn show_sectors(&mut self, data: &SectorData, interval: Option<Duration>) {
        trace!(
            zones = ?data.zones.iter().map(|z| z.to_string()).collect::<Vec<_>>(),
            interval_ms = interval.map(|d| d.as_millis() as u64),
            "Sector colors"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_output_tracks_shown_color() {
        let mut output = LogOutput::new();
        assert_eq!(output.shown(), None);

        output.set_color(Rgb::new(1, 2, 3));
        assert_eq!(output.shown(), None);

        output.show();
        assert_eq!(output.shown(), Some(Rgb::new(1, 2, 3)));
    }
}
