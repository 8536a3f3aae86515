#![no_std]
//! Double-buffered audio acquisition and band analysis for spectrum
//! displays.
//!
//! A timer interrupt drives [`Sampler::on_tick`], which appends one reading
//! to the active window of a [`WindowPair`]. The main loop calls
//! [`SpectrumAnalyzer::run_pass`] (or awaits [`SpectrumAnalyzer::next_pass`]),
//! which swaps the windows once one is full, transforms the settled one and
//! returns a normalised [`PeakSnapshot`].

// This must go first so the macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod analyzer;
pub mod bands;
pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gain;
pub mod sampler;
pub mod transform;
pub mod window;

pub use analyzer::{PeakSnapshot, SpectrumAnalyzer, WindowPair};
pub use bands::BandLayout;
pub use classifier::{BandClassifier, VuLevel};
pub use config::{AnalyzerConfig, BandCorrection, MAX_BANDS};
pub use diagnostics::{Diagnostics, DiagnosticsSnapshot};
pub use error::{ConfigError, PassError};
pub use gain::{GainNormalizer, GainState};
pub use sampler::{AnalogSource, Sampler};
pub use transform::{Transform, WindowShape, WindowedFft};
pub use window::{SampleWindow, WindowBuffers, WindowGuard};

#[cfg(feature = "logging")]
use defmt_rtt as _;
