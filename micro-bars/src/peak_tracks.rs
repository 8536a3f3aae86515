use alloc::{vec, vec::Vec};

use crate::{millis_since, Instant};

/// The two decaying maxima kept for one band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPeak {
    /// Fast track, drawn as the highlight line.
    pub highlight: f32,
    /// Slow track, drawn as the bar.
    pub bar: f32,
    /// When `highlight` last rose.
    pub raised_at: Instant,
}

impl Default for BandPeak {
    fn default() -> Self {
        Self {
            highlight: 0.0,
            bar: 0.0,
            raised_at: Instant::from_ticks(0),
        }
    }
}

/// Per-band peak state between analysis passes. Values rise instantly on
/// [`PeakTracks::ingest`] and fall linearly on [`PeakTracks::decay`].
#[derive(Debug, Clone)]
pub struct PeakTracks {
    bands: Vec<BandPeak>,
    highlight_decay: f32,
    bar_decay: f32,
}

impl PeakTracks {
    /// Rates are in full scale per second. A negative `highlight_decay` hides
    /// the highlight instead of decaying it.
    pub fn new(band_count: usize, highlight_decay: f32, bar_decay: f32) -> Self {
        Self {
            bands: vec![BandPeak::default(); band_count],
            highlight_decay,
            bar_decay,
        }
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn band(&self, index: usize) -> Option<&BandPeak> {
        self.bands.get(index)
    }

    pub fn bands(&self) -> &[BandPeak] {
        &self.bands
    }

    pub fn highlight_visible(&self) -> bool {
        self.highlight_decay >= 0.0
    }

    /// Raises each track to the matching value of `peaks` where it is higher.
    pub fn ingest(&mut self, peaks: &[f32], now: Instant) {
        for (band, &value) in self.bands.iter_mut().zip(peaks) {
            if value > band.highlight {
                band.highlight = value;
                band.raised_at = now;
            }
            if value > band.bar {
                band.bar = value;
            }
        }
    }

    /// Lowers every track by `elapsed_secs` times its rate, stopping at zero.
    pub fn decay(&mut self, elapsed_secs: f32) {
        let elapsed_secs = elapsed_secs.max(0.0);
        let highlight_amount = (elapsed_secs * self.highlight_decay).max(0.0);
        let bar_amount = elapsed_secs * self.bar_decay.max(0.0);
        for band in self.bands.iter_mut() {
            band.highlight -= highlight_amount.min(band.highlight);
            band.bar -= bar_amount.min(band.bar);
        }
    }

    /// Milliseconds since band `index`'s highlight last rose.
    pub fn highlight_age(&self, index: usize, now: Instant) -> u32 {
        self.bands
            .get(index)
            .map_or(0, |band| millis_since(now, band.raised_at))
    }
}
