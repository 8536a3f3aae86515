use heapless::Vec;

use crate::config::{BandCorrection, MAX_BANDS};
use crate::error::ConfigError;

// Upper cutoff in Hz of each band, by band count. Only the 32 band layout
// follows third-octave centres; the others are tuned by eye.

const CUTOFFS_8: [u32; 8] = [20, 150, 400, 750, 751, 752, 800, 1200];

const CUTOFFS_16: [u32; 16] = [
    100, 250, 450, 565, 715, 900, 1125, 1400, 1750, 2250, 2800, 3150, 4000, 5000, 6400, 12500,
];

const CUTOFFS_24: [u32; 24] = [
    40, 80, 150, 220, 270, 320, 380, 440, 540, 630, 800, 1000, 1250, 1600, 2000, 2500, 3150,
    3800, 4200, 4800, 5400, 6200, 7400, 12500,
];

const CUTOFFS_32: [u32; 32] = [
    10, 20, 25, 31, 40, 50, 63, 80, 100, 125, 160, 200, 250, 315, 400, 500, 630, 800, 1000, 1250,
    1600, 2000, 2500, 3150, 4000, 5000, 6400, 8000, 10000, 12500, 16500, 20000,
];

// Flattens the response to pink noise on the 16 band layout.
const TUNED_16: [f32; 16] = [
    0.30, 0.60, 0.80, 1.00, 1.00, 1.00, 1.00, 1.00, 1.00, 1.10, 1.25, 1.40, 1.60, 1.80, 1.90, 2.00,
];

pub const SUPPORTED_BAND_COUNTS: [usize; 4] = [8, 16, 24, 32];

pub fn is_supported_band_count(count: usize) -> bool {
    SUPPORTED_BAND_COUNTS.contains(&count)
}

/// Cutoff table for one of the supported band counts.
pub fn cutoff_table(count: usize) -> Option<&'static [u32]> {
    match count {
        8 => Some(&CUTOFFS_8),
        16 => Some(&CUTOFFS_16),
        24 => Some(&CUTOFFS_24),
        32 => Some(&CUTOFFS_32),
        _ => None,
    }
}

/// The band cutoffs and correction multipliers chosen at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct BandLayout {
    cutoffs: &'static [u32],
    correction: Vec<f32, MAX_BANDS>,
}

impl BandLayout {
    /// Layout for one of [`SUPPORTED_BAND_COUNTS`].
    pub fn new(count: usize, correction: &BandCorrection) -> Result<Self, ConfigError> {
        let cutoffs = cutoff_table(count).ok_or(ConfigError::UnsupportedBandCount(count))?;
        Self::build(cutoffs, correction)
    }

    /// Layout from a caller supplied cutoff table. The cutoffs must be
    /// strictly increasing and there may be at most [`MAX_BANDS`] of them.
    pub fn from_cutoffs(
        cutoffs: &'static [u32],
        correction: &BandCorrection,
    ) -> Result<Self, ConfigError> {
        if cutoffs.is_empty() || cutoffs.len() > MAX_BANDS {
            return Err(ConfigError::UnsupportedBandCount(cutoffs.len()));
        }
        if cutoffs.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::CutoffsNotIncreasing);
        }
        Self::build(cutoffs, correction)
    }

    fn build(cutoffs: &'static [u32], correction: &BandCorrection) -> Result<Self, ConfigError> {
        let count = cutoffs.len();
        let mut table = Vec::new();
        match correction {
            BandCorrection::Tuned if count == TUNED_16.len() => {
                table.extend(TUNED_16.iter().copied());
            }
            BandCorrection::Tuned | BandCorrection::Flat => {
                table.extend(core::iter::repeat(1.0).take(count));
            }
            BandCorrection::Custom(custom) => {
                if custom.len() != count {
                    return Err(ConfigError::CorrectionLength {
                        expected: count,
                        actual: custom.len(),
                    });
                }
                table.clone_from(custom);
            }
        }

        Ok(Self {
            cutoffs,
            correction: table,
        })
    }

    pub fn len(&self) -> usize {
        self.cutoffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }

    pub fn cutoffs(&self) -> &'static [u32] {
        self.cutoffs
    }

    pub fn correction(&self) -> &[f32] {
        &self.correction
    }

    /// First band whose cutoff lies above `frequency`, or the last band when
    /// the frequency is beyond every cutoff.
    pub fn band_for(&self, frequency: u32) -> usize {
        self.cutoffs
            .iter()
            .position(|&cutoff| frequency < cutoff)
            .unwrap_or(self.cutoffs.len() - 1)
    }

    /// Multiplies each band peak by its correction factor.
    pub fn apply_correction(&self, peaks: &mut [f32]) {
        for (peak, factor) in peaks.iter_mut().zip(self.correction.iter()) {
            *peak *= factor;
        }
    }
}
