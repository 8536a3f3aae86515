#[allow(unused_imports)]
use micromath::F32Ext;

/// Persistent auto-gain state.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GainState {
    /// Damped loudest-band peak before the floor is applied.
    pub tracked: f32,
    /// Denominator used by the last normalisation, never below the floor.
    pub ceiling: f32,
}

/// Scales band peaks into `[0, 1]` against an adaptive ceiling that follows
/// rising loudness immediately and decays over `damping` passes.
#[derive(Debug, Clone)]
pub struct GainNormalizer {
    damping: f32,
    floor: f32,
    headroom: f32,
    state: GainState,
}

impl GainNormalizer {
    pub fn new(damping: f32, floor: f32, headroom: f32) -> Self {
        Self {
            damping: damping.max(1.0),
            floor,
            headroom,
            state: GainState {
                tracked: 0.0,
                ceiling: floor,
            },
        }
    }

    pub fn state(&self) -> GainState {
        self.state
    }

    pub fn ceiling(&self) -> f32 {
        self.state.ceiling
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Folds this pass's loudest band into the ceiling and returns it.
    pub fn update_ceiling(&mut self, all_bands_peak: f32) -> f32 {
        let peak = all_bands_peak.max(1.0);
        let blend = (self.state.tracked * (self.damping - 1.0) + peak) / self.damping;
        self.state.tracked = peak.max(blend);
        self.state.ceiling = self.state.tracked.max(self.floor);
        self.state.ceiling
    }

    /// `raw / (ceiling * headroom)`.
    pub fn scale(&self, raw: f32, ceiling: f32) -> f32 {
        raw / (ceiling * self.headroom)
    }

    /// Updates the ceiling from `peaks` and divides every band by it.
    /// Values may exceed 1 on a transient; clamping is the renderer's job.
    pub fn normalize(&mut self, peaks: &mut [f32]) -> f32 {
        let all_bands_peak = peaks.iter().copied().fold(0.0f32, f32::max);
        let ceiling = self.update_ceiling(all_bands_peak);
        for peak in peaks.iter_mut() {
            *peak = self.scale(*peak, ceiling);
        }
        ceiling
    }
}

/// Raises every band peak to `exponent`.
pub fn apply_log_scale(peaks: &mut [f32], exponent: f32) {
    for peak in peaks.iter_mut() {
        *peak = peak.powf(exponent);
    }
}
