use core::sync::atomic::{AtomicUsize, Ordering};

use critical_section::CriticalSection;
use embassy_futures::yield_now;
use fugit::HertzU32;
use heapless::Vec;

use crate::classifier::{BandClassifier, VuLevel};
use crate::config::{validate_window_size, AnalyzerConfig, MAX_BANDS};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, PassError};
use crate::gain::{apply_log_scale, GainNormalizer, GainState};
use crate::transform::Transform;
use crate::window::{SampleWindow, WindowBuffers};

/// The two sample windows and the index of the one the sampler fills.
///
/// Meant to live in a `static` shared by the timer interrupt and the main
/// loop.
pub struct WindowPair<const N: usize> {
    windows: [SampleWindow<N>; 2],
    active: AtomicUsize,
    diagnostics: Diagnostics,
}

impl<const N: usize> WindowPair<N> {
    pub const fn new() -> Self {
        Self {
            windows: [SampleWindow::new(), SampleWindow::new()],
            active: AtomicUsize::new(0),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The window the sampler currently appends to.
    pub fn active(&self) -> &SampleWindow<N> {
        &self.windows[self.active_index()]
    }

    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire) & 1
    }

    pub fn window(&self, index: usize) -> &SampleWindow<N> {
        &self.windows[index & 1]
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Index of a window that is ready for a pass, the active one first.
    fn full_window(&self) -> Option<usize> {
        let active = self.active_index();
        [active, active ^ 1]
            .into_iter()
            .find(|&index| self.windows[index].is_full())
    }
}

impl<const N: usize> Default for WindowPair<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-band result of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSnapshot {
    /// Normalised peaks, one per configured band. Nominally in `[0, 1]` but
    /// may overshoot on a transient.
    pub bands: Vec<f32, MAX_BANDS>,
    /// Smoothed VU level after this pass.
    pub vu_level: f32,
    /// Auto-gain ceiling the bands were divided by.
    pub ceiling: f32,
}

impl PeakSnapshot {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Index and value of the loudest band.
    pub fn loudest(&self) -> Option<(usize, f32)> {
        self.bands
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Main-context consumer: swaps the windows, transforms the settled one
/// and turns it into a [`PeakSnapshot`].
pub struct SpectrumAnalyzer<'a, T, const N: usize> {
    windows: &'a WindowPair<N>,
    transform: T,
    sample_rate: HertzU32,
    classifier: BandClassifier,
    gain: GainNormalizer,
    vu: VuLevel,
    log_scale: f32,
    correction_min_vu: f32,
    stall_poll_limit: Option<u32>,
}

impl<'a, T: Transform, const N: usize> SpectrumAnalyzer<'a, T, N> {
    pub fn new(
        windows: &'a WindowPair<N>,
        transform: T,
        config: AnalyzerConfig,
    ) -> Result<Self, ConfigError> {
        validate_window_size(N)?;
        if !transform.supports(N) {
            return Err(ConfigError::UnsupportedWindowSize(N));
        }
        let layout = config.band_layout()?;
        let band_count = layout.len();

        let classifier = BandClassifier::new(
            layout,
            config.sampling_frequency,
            N,
            config.noise_cutoff,
            config.log_scale,
        );
        info!(
            "spectrum analyzer: {} samples at {} Hz, {} bands",
            N,
            config.sampling_frequency.raw(),
            band_count
        );

        Ok(Self {
            windows,
            transform,
            sample_rate: config.sampling_frequency,
            classifier,
            gain: GainNormalizer::new(config.gain_damping, config.gain_floor, config.gain_headroom),
            vu: VuLevel::new(),
            log_scale: config.log_scale,
            correction_min_vu: config.correction_min_vu,
            stall_poll_limit: config.stall_poll_limit,
        })
    }

    pub fn band_count(&self) -> usize {
        self.classifier.band_count()
    }

    pub fn classifier(&self) -> &BandClassifier {
        &self.classifier
    }

    pub fn gain_state(&self) -> GainState {
        self.gain.state()
    }

    pub fn vu_level(&self) -> f32 {
        self.vu.level()
    }

    pub fn windows(&self) -> &'a WindowPair<N> {
        self.windows
    }

    pub fn transform_mut(&mut self) -> &mut T {
        &mut self.transform
    }

    /// Waits for a full window, spinning, and processes it.
    pub fn run_pass(&mut self) -> Result<PeakSnapshot, PassError> {
        self.run_pass_with(|_| {})
    }

    /// Like [`Self::run_pass`], and calls `on_hand_off` inside the critical
    /// section that swaps the windows. Keep it short: interrupts are off.
    pub fn run_pass_with<F>(&mut self, on_hand_off: F) -> Result<PeakSnapshot, PassError>
    where
        F: FnOnce(CriticalSection<'_>),
    {
        let mut polls = 0u32;
        let full = loop {
            if let Some(index) = self.windows.full_window() {
                break index;
            }
            polls = polls.saturating_add(1);
            self.check_stall(polls)?;
            core::hint::spin_loop();
        };
        Ok(self.process(full, polls, on_hand_off))
    }

    /// Waits for a full window, yielding to the executor between polls.
    pub async fn next_pass(&mut self) -> Result<PeakSnapshot, PassError> {
        let mut polls = 0u32;
        let full = loop {
            if let Some(index) = self.windows.full_window() {
                break index;
            }
            polls = polls.saturating_add(1);
            self.check_stall(polls)?;
            yield_now().await;
        };
        Ok(self.process(full, polls, |_| {}))
    }

    fn check_stall(&self, polls: u32) -> Result<(), PassError> {
        match self.stall_poll_limit {
            Some(limit) if polls > limit => {
                self.windows.diagnostics().record_stall(polls);
                warn!("no sample window filled after {} polls", polls);
                Err(PassError::Stalled { polls })
            }
            _ => Ok(()),
        }
    }

    fn process<F>(&mut self, full: usize, polls: u32, on_hand_off: F) -> PeakSnapshot
    where
        F: FnOnce(CriticalSection<'_>),
    {
        let windows = self.windows;
        let diagnostics = windows.diagnostics();
        let next = full ^ 1;

        let conflict = critical_section::with(|cs| {
            on_hand_off(cs);
            let conflict = match windows.windows[next].try_acquire() {
                Some(mut other) => {
                    other.reset();
                    false
                }
                None => true,
            };
            windows.active.store(next, Ordering::Release);
            conflict
        });
        if conflict {
            diagnostics.record_hand_off_conflict();
            warn!("window {} was locked during hand-off and kept its samples", next);
        }

        let mut guard = windows.windows[full].acquire_blocking();
        let snapshot = self.analyse(&mut guard);
        guard.reset();
        guard.release();

        diagnostics.record_pass(polls);
        trace!(
            "pass on window {}: vu {}, ceiling {}",
            full,
            snapshot.vu_level,
            snapshot.ceiling
        );
        snapshot
    }

    fn analyse(&mut self, buffers: &mut WindowBuffers<N>) -> PeakSnapshot {
        let WindowBuffers { real, imag, peaks } = buffers;
        let band_count = self.classifier.band_count();
        let bands = &mut peaks[..band_count];

        self.transform.apply(real, imag, self.sample_rate);
        let vu_level = self.vu.update(real);

        bands.fill(0.0);
        self.classifier.classify(real, bands);
        if vu_level > self.correction_min_vu {
            self.classifier.layout().apply_correction(bands);
        }
        apply_log_scale(bands, self.log_scale);
        let ceiling = self.gain.normalize(bands);

        let mut snapshot = Vec::new();
        // Cannot overflow: band_count <= MAX_BANDS.
        let _ = snapshot.extend_from_slice(bands);
        PeakSnapshot {
            bands: snapshot,
            vu_level,
            ceiling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GAIN_FLOOR;
    use crate::sampler::Sampler;

    /// Puts a fixed magnitude at one index and nothing elsewhere.
    struct Spike {
        index: usize,
        magnitude: f32,
    }

    impl Transform for Spike {
        fn apply(&mut self, real: &mut [f32], imag: &mut [f32], _sample_rate: HertzU32) {
            real.fill(0.0);
            imag.fill(0.0);
            real[self.index] = self.magnitude;
        }

        fn supports(&self, _len: usize) -> bool {
            true
        }
    }

    fn fill_active<const N: usize>(windows: &WindowPair<N>) {
        let mut sampler = Sampler::new(windows, || 2048u16);
        while !windows.active().is_full() {
            sampler.on_tick();
        }
    }

    #[test]
    fn test_rejects_bad_window_size() {
        static WINDOWS: WindowPair<4> = WindowPair::new();
        let result = SpectrumAnalyzer::new(
            &WINDOWS,
            Spike { index: 2, magnitude: 1.0 },
            AnalyzerConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::UnsupportedWindowSize(4))));
    }

    #[test]
    fn test_pass_swaps_windows_and_resets_both() {
        let windows = WindowPair::<64>::new();
        let mut analyzer = SpectrumAnalyzer::new(
            &windows,
            Spike { index: 2, magnitude: 1.0e4 },
            AnalyzerConfig::default().with_band_count(8),
        )
        .unwrap();

        assert_eq!(windows.active_index(), 0);
        fill_active(&windows);
        let snapshot = analyzer.run_pass().unwrap();

        assert_eq!(windows.active_index(), 1);
        assert!(windows.window(0).is_empty());
        assert!(!windows.window(0).is_locked());
        assert!(windows.window(1).is_empty());
        assert_eq!(snapshot.band_count(), 8);
        assert_eq!(snapshot.loudest().map(|(band, _)| band), Some(0));

        fill_active(&windows);
        analyzer.run_pass().unwrap();
        assert_eq!(windows.active_index(), 0);
        assert_eq!(windows.diagnostics().snapshot().passes, 2);
    }

    #[test]
    fn test_hand_off_hook_runs_once() {
        let windows = WindowPair::<16>::new();
        let mut analyzer = SpectrumAnalyzer::new(
            &windows,
            Spike { index: 3, magnitude: 500.0 },
            AnalyzerConfig::default(),
        )
        .unwrap();
        fill_active(&windows);

        let mut calls = 0;
        analyzer.run_pass_with(|_cs| calls += 1).unwrap();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stall_limit() {
        let windows = WindowPair::<16>::new();
        let mut analyzer = SpectrumAnalyzer::new(
            &windows,
            Spike { index: 2, magnitude: 1.0 },
            AnalyzerConfig::default().with_stall_poll_limit(10),
        )
        .unwrap();

        assert_eq!(analyzer.run_pass(), Err(PassError::Stalled { polls: 11 }));
        let stats = windows.diagnostics().snapshot();
        assert_eq!(stats.stalls, 1);
        assert_eq!(stats.passes, 0);
        assert_eq!(windows.active_index(), 0);
    }

    #[test]
    fn test_silence_keeps_ceiling_at_floor() {
        let windows = WindowPair::<32>::new();
        let mut analyzer = SpectrumAnalyzer::new(
            &windows,
            Spike { index: 5, magnitude: 0.0 },
            AnalyzerConfig::default(),
        )
        .unwrap();
        fill_active(&windows);
        let snapshot = analyzer.run_pass().unwrap();
        assert_eq!(snapshot.ceiling, GAIN_FLOOR);
        assert!(snapshot.bands.iter().all(|&b| b == 0.0));
        assert_eq!(analyzer.gain_state().ceiling, GAIN_FLOOR);
    }
}
