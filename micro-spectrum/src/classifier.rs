use fugit::HertzU32;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::bands::BandLayout;

/// First magnitude index that carries spectral information.
pub const FIRST_SPECTRAL_BIN: usize = 2;

/// Smoothed overall loudness. Rises instantly, falls by a quarter of the
/// gap per pass.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct VuLevel {
    level: f32,
}

impl VuLevel {
    pub const fn new() -> Self {
        Self { level: 0.0 }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Feeds the magnitudes of one pass (the whole `N` long array) and
    /// returns the new level.
    pub fn update(&mut self, magnitudes: &[f32]) -> f32 {
        let half = magnitudes.len() / 2;
        let sum: f32 = magnitudes
            .get(FIRST_SPECTRAL_BIN..half)
            .unwrap_or(&[])
            .iter()
            .sum();
        let average = if half > 0 { sum / half as f32 } else { 0.0 };
        self.level = average.max((self.level * 3.0 + average) / 4.0);
        self.level
    }
}

/// Assigns transformed magnitudes to bands and keeps the loudest per band.
#[derive(Debug, Clone)]
pub struct BandClassifier {
    layout: BandLayout,
    sample_rate: u32,
    window_size: usize,
    gate: f32,
}

impl BandClassifier {
    /// `noise_cutoff ^ log_scale` becomes the noise gate.
    pub fn new(
        layout: BandLayout,
        sample_rate: HertzU32,
        window_size: usize,
        noise_cutoff: f32,
        log_scale: f32,
    ) -> Self {
        Self {
            layout,
            sample_rate: sample_rate.raw(),
            window_size,
            gate: noise_cutoff.powf(log_scale),
        }
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    pub fn band_count(&self) -> usize {
        self.layout.len()
    }

    /// Magnitudes at or below this contribute nothing.
    pub fn noise_gate(&self) -> f32 {
        self.gate
    }

    /// Frequency in Hz represented by magnitude index `bin`.
    pub fn bin_frequency(&self, bin: usize) -> u32 {
        if bin < FIRST_SPECTRAL_BIN {
            return 0;
        }
        let offset = (bin - FIRST_SPECTRAL_BIN) as u64;
        let half_rate = (self.sample_rate / 2) as u64;
        let half_window = (self.window_size / 2).max(1) as u64;
        (offset * half_rate / half_window) as u32
    }

    /// Raises each band of `peaks` to the loudest gated magnitude that falls
    /// into it. `peaks` is expected to start at zero for a fresh pass.
    pub fn classify(&self, magnitudes: &[f32], peaks: &mut [f32]) {
        let half = magnitudes.len().min(self.window_size) / 2;
        for bin in FIRST_SPECTRAL_BIN..half {
            let magnitude = magnitudes[bin];
            if magnitude <= self.gate {
                continue;
            }
            let band = self.layout.band_for(self.bin_frequency(bin));
            if let Some(peak) = peaks.get_mut(band) {
                if magnitude > *peak {
                    *peak = magnitude;
                }
            }
        }
    }
}
