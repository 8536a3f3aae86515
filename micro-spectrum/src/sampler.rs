use crate::analyzer::WindowPair;

/// The analog input the sampler reads one value from per tick.
pub trait AnalogSource {
    fn read(&mut self) -> u16;
}

impl<F: FnMut() -> u16> AnalogSource for F {
    fn read(&mut self) -> u16 {
        self()
    }
}

/// Body of the sampling timer interrupt.
///
/// Each tick either appends one sample to the active window or gives up
/// immediately; it never waits for the lock.
pub struct Sampler<'a, S, const N: usize> {
    windows: &'a WindowPair<N>,
    source: S,
}

impl<'a, S: AnalogSource, const N: usize> Sampler<'a, S, N> {
    pub fn new(windows: &'a WindowPair<N>, source: S) -> Self {
        Self { windows, source }
    }

    /// Call once per timer period.
    pub fn on_tick(&mut self) {
        let diagnostics = self.windows.diagnostics();
        diagnostics.record_tick();

        let Some(mut window) = self.windows.active().try_acquire() else {
            diagnostics.record_miss();
            return;
        };

        if window.is_full() {
            diagnostics.record_overrun();
            return;
        }
        let sample = self.source.read();
        if window.append_sample(sample as f32) {
            diagnostics.record_sample();
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
