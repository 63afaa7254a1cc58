//! Terminal light output
//!
//! Draws the emulated LED as a truecolor swatch and, for every sector
//! broadcast, one swatch per zone with the time since the previous frame.

use colored::Colorize;
use dreamscreen_core::{Rgb, SectorData};
use dreamscreen_emulator::OutputSink;
use std::time::Duration;

/// Frames arriving faster than this are drawn with a green interval
const FAST_FRAME: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct TerminalOutput {
    staged: Rgb,
    shown: Option<Rgb>,
    brightness: u8,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

fn swatch(color: Rgb) -> colored::ColoredString {
    "  ".on_truecolor(color.r, color.g, color.b)
}

fn interval_label(interval: Option<Duration>) -> colored::ColoredString {
    match interval {
        Some(d) if d < FAST_FRAME => format!("{:>5}ms", d.as_millis()).green(),
        Some(d) => format!("{:>5}ms", d.as_millis()).red(),
        None => "  first".dimmed(),
    }
}

impl OutputSink for TerminalOutput {
    fn set_color(&mut self, color: Rgb) {
        self.staged = color;
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
        println!("{} brightness {}", "LED".cyan().bold(), level);
    }

    fn show(&mut self) {
        if self.shown == Some(self.staged) {
            return;
        }
        self.shown = Some(self.staged);
        println!(
            "{} {} {} @ {}",
            "LED".cyan().bold(),
            swatch(self.staged),
            self.staged,
            self.brightness
        );
    }

    fn show_sectors(&mut self, data: &SectorData, interval: Option<Duration>) {
        let zones: String = data.zones.iter().map(|z| swatch(*z).to_string()).collect();
        println!("{} {} {}", "SECTORS".magenta().bold(), zones, interval_label(interval));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_only_tracks_changes() {
        let mut output = TerminalOutput::new();
        output.set_color(Rgb::new(9, 8, 7));
        output.show();
        assert_eq!(output.shown, Some(Rgb::new(9, 8, 7)));

        output.set_color(Rgb::BLACK);
        assert_eq!(output.shown, Some(Rgb::new(9, 8, 7)));
        output.show();
        assert_eq!(output.shown, Some(Rgb::BLACK));
    }

    #[test]
    fn test_interval_label_threshold() {
        colored::control::set_override(false);
        assert_eq!(
            interval_label(Some(Duration::from_millis(40))).to_string(),
            "   40ms"
        );
        assert_eq!(
            interval_label(Some(Duration::from_millis(250))).to_string(),
            "  250ms"
        );
        assert_eq!(interval_label(None).to_string(), "  first");
    }
}
