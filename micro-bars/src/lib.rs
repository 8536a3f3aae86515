#![no_std]
//! Spectrum bar display for LED matrices, drawn through `embedded-graphics`.

extern crate alloc;

#[macro_use]
mod fmt;

pub mod config;
pub mod palette;
pub mod peak_tracks;
pub mod renderer;
pub mod vu_meter;

pub use config::{RendererConfig, RendererConfigError};
pub use palette::{ColorScheme, GradientPalette, IndexedPalette, Palette};
pub use peak_tracks::{BandPeak, PeakTracks};
pub use renderer::{Renderer, SpectrumRenderer};
pub use vu_meter::VuMeter;

#[cfg(feature = "logging")]
use defmt_rtt as _;

/// Millisecond timestamp from whatever clock drives the frames.
pub type Instant = fugit::TimerInstantU32<1000>;
pub type Duration = fugit::MillisDurationU32;

/// Milliseconds from `since` to `now`, zero if `now` is earlier.
pub fn millis_since(now: Instant, since: Instant) -> u32 {
    now.checked_duration_since(since)
        .map_or(0, |elapsed| elapsed.to_millis())
}
