use fugit::HertzU32;
use heapless::Vec;

use crate::bands::BandLayout;
use crate::error::ConfigError;

// --- Buffer sizing ---
pub const MAX_BANDS: usize = 32;
pub const DEFAULT_WINDOW_SIZE: usize = 512;

// --- Audio ---
pub const DEFAULT_SAMPLING_FREQUENCY: HertzU32 = HertzU32::from_raw(25_000);
pub const DEFAULT_BAND_COUNT: usize = 16;

// --- Normalisation ---
pub const NOISE_CUTOFF: f32 = 10.0;
pub const LOG_SCALE: f32 = 2.0;
pub const GAIN_DAMPEN: f32 = 2.0;
pub const GAIN_FLOOR: f32 = 67_108_864.0; // 2^26
pub const GAIN_HEADROOM: f32 = 1.1;

/// Full-scale value of the smoothed VU level.
pub const VU_FULL_SCALE: f32 = 12_000.0;

/// Per-band multiplier applied to the raw band peaks before scaling.
#[derive(Debug, Clone, PartialEq)]
pub enum BandCorrection {
    /// The hand-tuned table for the configured band count.
    Tuned,
    /// No correction.
    Flat,
    /// One multiplier per band.
    Custom(Vec<f32, MAX_BANDS>),
}

/// Tunables of the analysis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub sampling_frequency: HertzU32,
    pub band_count: usize,
    /// Overrides the built-in cutoff table for `band_count`.
    pub cutoffs: Option<&'static [u32]>,
    /// Magnitudes at or below `noise_cutoff ^ log_scale` are ignored.
    pub noise_cutoff: f32,
    /// Exponent applied to every band peak before normalisation.
    pub log_scale: f32,
    /// How many passes the auto-gain ceiling averages over on the way down.
    pub gain_damping: f32,
    /// The ceiling never drops below this.
    pub gain_floor: f32,
    pub gain_headroom: f32,
    pub correction: BandCorrection,
    /// Correction is only applied while the VU level is above this.
    pub correction_min_vu: f32,
    /// Give up waiting for a full window after this many polls.
    pub stall_poll_limit: Option<u32>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sampling_frequency: DEFAULT_SAMPLING_FREQUENCY,
            band_count: DEFAULT_BAND_COUNT,
            cutoffs: None,
            noise_cutoff: NOISE_CUTOFF,
            log_scale: LOG_SCALE,
            gain_damping: GAIN_DAMPEN,
            gain_floor: GAIN_FLOOR,
            gain_headroom: GAIN_HEADROOM,
            correction: BandCorrection::Tuned,
            correction_min_vu: VU_FULL_SCALE / 8.0,
            stall_poll_limit: None,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_sampling_frequency(mut self, sampling_frequency: HertzU32) -> Self {
        self.sampling_frequency = sampling_frequency;
        self
    }

    pub fn with_band_count(mut self, band_count: usize) -> Self {
        self.band_count = band_count;
        self
    }

    /// Uses `cutoffs` as the band table; the band count follows its length.
    pub fn with_cutoffs(mut self, cutoffs: &'static [u32]) -> Self {
        self.band_count = cutoffs.len();
        self.cutoffs = Some(cutoffs);
        self
    }

    pub fn with_noise_cutoff(mut self, noise_cutoff: f32) -> Self {
        self.noise_cutoff = noise_cutoff;
        self
    }

    pub fn with_log_scale(mut self, log_scale: f32) -> Self {
        self.log_scale = log_scale;
        self
    }

    pub fn with_gain_damping(mut self, gain_damping: f32) -> Self {
        self.gain_damping = gain_damping;
        self
    }

    pub fn with_gain_floor(mut self, gain_floor: f32) -> Self {
        self.gain_floor = gain_floor;
        self
    }

    pub fn with_gain_headroom(mut self, gain_headroom: f32) -> Self {
        self.gain_headroom = gain_headroom;
        self
    }

    pub fn with_correction(mut self, correction: BandCorrection) -> Self {
        self.correction = correction;
        self
    }

    pub fn with_correction_min_vu(mut self, correction_min_vu: f32) -> Self {
        self.correction_min_vu = correction_min_vu;
        self
    }

    pub fn with_stall_poll_limit(mut self, polls: u32) -> Self {
        self.stall_poll_limit = Some(polls);
        self
    }

    /// Checks everything that does not depend on the window size and
    /// resolves the band layout.
    pub fn band_layout(&self) -> Result<BandLayout, ConfigError> {
        if self.sampling_frequency.raw() == 0 {
            return Err(ConfigError::InvalidSamplingFrequency);
        }
        if !(self.gain_damping >= 1.0) {
            return Err(ConfigError::InvalidGainDamping(self.gain_damping));
        }
        if !(self.gain_floor > 0.0) {
            return Err(ConfigError::InvalidGainFloor(self.gain_floor));
        }
        if !(self.log_scale > 0.0) {
            return Err(ConfigError::InvalidLogScale(self.log_scale));
        }
        if !(self.gain_headroom > 0.0 && self.gain_headroom.is_finite()) {
            return Err(ConfigError::InvalidGainHeadroom(self.gain_headroom));
        }
        match self.cutoffs {
            Some(cutoffs) => BandLayout::from_cutoffs(cutoffs, &self.correction),
            None => BandLayout::new(self.band_count, &self.correction),
        }
    }
}

/// Checks that a window of `size` samples can be analysed.
pub fn validate_window_size(size: usize) -> Result<(), ConfigError> {
    if !size.is_power_of_two() {
        return Err(ConfigError::WindowSizeNotPowerOfTwo(size));
    }
    if !crate::transform::is_supported_size(size) {
        return Err(ConfigError::UnsupportedWindowSize(size));
    }
    Ok(())
}
