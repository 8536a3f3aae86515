use thiserror::Error;

/// Rejected analyzer configuration. Only ever returned at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("unsupported band count {0}")]
    UnsupportedBandCount(usize),
    #[error("band cutoffs must be strictly increasing")]
    CutoffsNotIncreasing,
    #[error("window size {0} is not a power of two")]
    WindowSizeNotPowerOfTwo(usize),
    #[error("window size {0} is not supported by the transform")]
    UnsupportedWindowSize(usize),
    #[error("sampling frequency must be non-zero")]
    InvalidSamplingFrequency,
    #[error("gain damping must be at least 1, got {0}")]
    InvalidGainDamping(f32),
    #[error("gain floor must be positive, got {0}")]
    InvalidGainFloor(f32),
    #[error("log scale exponent must be positive, got {0}")]
    InvalidLogScale(f32),
    #[error("gain headroom must be positive and finite, got {0}")]
    InvalidGainHeadroom(f32),
    #[error("correction table has {actual} entries but {expected} bands are configured")]
    CorrectionLength { expected: usize, actual: usize },
}

/// Failure of a single analyzer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassError {
    /// No window filled up within the configured poll limit; the sample
    /// source has most likely stopped.
    #[error("no sample window filled after {polls} polls")]
    Stalled { polls: u32 },
}
