use embedded_graphics::geometry::Size;
use micro_spectrum::config::{DEFAULT_BAND_COUNT, MAX_BANDS, VU_FULL_SCALE};
use thiserror::Error;

use crate::Duration;

// --- Decay rates, full scale per second ---
pub const HIGHLIGHT_DECAY_PER_SEC: f32 = 1.0;
pub const BAR_DECAY_PER_SEC: f32 = 2.2;

// --- Timing ---
pub const HIGHLIGHT_FADE: Duration = Duration::millis(1000);
pub const VU_HOLD: Duration = Duration::millis(1000);
pub const VU_FADE: Duration = Duration::millis(1000);

/// Rejected renderer setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RendererConfigError {
    #[error("at least one band is required")]
    NoBands,
    #[error("{count} bands requested, at most {max} supported")]
    TooManyBands { count: usize, max: usize },
    #[error("display is {width} pixels wide, too narrow for {bands} bands and a VU meter")]
    DisplayTooNarrow { width: u32, bands: usize },
    #[error("display has no rows")]
    DisplayTooShort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    pub band_count: usize,
    /// Fall rate of the highlight line. Negative hides the line.
    pub highlight_decay_per_sec: f32,
    /// Fall rate of the bars.
    pub bar_decay_per_sec: f32,
    /// Time for a highlight to fade from white to black after it rose.
    pub highlight_fade: Duration,
    pub vu_hold: Duration,
    pub vu_fade: Duration,
    /// VU level drawn at full width.
    pub vu_full_scale: f32,
    /// Added to the palette offset every frame.
    pub hue_step: u8,
    pub vu_row: i32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            band_count: DEFAULT_BAND_COUNT,
            highlight_decay_per_sec: HIGHLIGHT_DECAY_PER_SEC,
            bar_decay_per_sec: BAR_DECAY_PER_SEC,
            highlight_fade: HIGHLIGHT_FADE,
            vu_hold: VU_HOLD,
            vu_fade: VU_FADE,
            vu_full_scale: VU_FULL_SCALE,
            hue_step: 1,
            vu_row: 0,
        }
    }
}

impl RendererConfig {
    pub fn with_band_count(mut self, band_count: usize) -> Self {
        self.band_count = band_count;
        self
    }

    pub fn with_highlight_decay(mut self, per_sec: f32) -> Self {
        self.highlight_decay_per_sec = per_sec;
        self
    }

    pub fn with_bar_decay(mut self, per_sec: f32) -> Self {
        self.bar_decay_per_sec = per_sec;
        self
    }

    pub fn with_highlight_fade(mut self, fade: Duration) -> Self {
        self.highlight_fade = fade;
        self
    }

    pub fn with_vu_hold(mut self, hold: Duration) -> Self {
        self.vu_hold = hold;
        self
    }

    pub fn with_vu_fade(mut self, fade: Duration) -> Self {
        self.vu_fade = fade;
        self
    }

    pub fn with_vu_full_scale(mut self, full_scale: f32) -> Self {
        self.vu_full_scale = full_scale;
        self
    }

    pub fn with_hue_step(mut self, hue_step: u8) -> Self {
        self.hue_step = hue_step;
        self
    }

    pub fn with_vu_row(mut self, row: i32) -> Self {
        self.vu_row = row;
        self
    }

    /// Checks the configuration against a display of `size` pixels.
    pub fn validate(&self, size: Size) -> Result<(), RendererConfigError> {
        if self.band_count == 0 {
            return Err(RendererConfigError::NoBands);
        }
        if self.band_count > MAX_BANDS {
            return Err(RendererConfigError::TooManyBands {
                count: self.band_count,
                max: MAX_BANDS,
            });
        }
        // The VU meter needs at least one pixel either side of the center.
        if (size.width as usize) < self.band_count || size.width < 4 {
            return Err(RendererConfigError::DisplayTooNarrow {
                width: size.width,
                bands: self.band_count,
            });
        }
        if size.height == 0 {
            return Err(RendererConfigError::DisplayTooShort);
        }
        Ok(())
    }
}
