#![allow(dead_code)]

use fugit::HertzU32;
use micro_spectrum::{Sampler, Transform, WindowPair};
use rand::Rng;
use wavegen::{dc_bias, sine, Waveform};

/// Mid-scale reading of a 12-bit converter.
pub const ADC_MIDPOINT: f32 = 2048.0;

/// Puts the summed sample value at the lowest spectral index and zeroes the
/// rest, so the whole window lands in band 0.
pub struct LowestBinTransform;

impl Transform for LowestBinTransform {
    fn apply(&mut self, real: &mut [f32], imag: &mut [f32], _sample_rate: HertzU32) {
        let total: f32 = real.iter().sum();
        real.fill(0.0);
        imag.fill(0.0);
        real[2] = total;
    }

    fn supports(&self, len: usize) -> bool {
        len >= 4
    }
}

/// Emits one prepared magnitude per pass at a fixed index.
pub struct ScriptedTransform {
    pub index: usize,
    pub script: Vec<f32>,
    pub pass: usize,
}

impl ScriptedTransform {
    pub fn new(index: usize, script: &[f32]) -> Self {
        Self {
            index,
            script: script.to_vec(),
            pass: 0,
        }
    }
}

impl Transform for ScriptedTransform {
    fn apply(&mut self, real: &mut [f32], imag: &mut [f32], _sample_rate: HertzU32) {
        real.fill(0.0);
        imag.fill(0.0);
        real[self.index] = self.script.get(self.pass).copied().unwrap_or(0.0);
        self.pass += 1;
    }

    fn supports(&self, _len: usize) -> bool {
        true
    }
}

/// Ticks a sampler reading `source` until the active window is full.
pub fn fill_active<const N: usize>(windows: &WindowPair<N>, source: impl FnMut() -> u16) {
    let mut sampler = Sampler::new(windows, source);
    while !windows.active().is_full() {
        sampler.on_tick();
    }
}

pub fn constant(value: u16) -> impl FnMut() -> u16 {
    move || value
}

/// Sine of `frequency` Hz sampled at `rate` Hz, biased to the ADC midpoint.
pub fn tone(frequency: f32, amplitude: f32, rate: f32) -> impl FnMut() -> u16 {
    let waveform = Waveform::<f32>::with_components(
        rate,
        vec![sine!(frequency, amplitude), dc_bias!(ADC_MIDPOINT)],
    );
    // One second of signal, repeated.
    let period: Vec<u16> = waveform
        .iter()
        .take(rate as usize)
        .map(|sample| sample.clamp(0.0, 4095.0) as u16)
        .collect();
    let mut samples = period.into_iter().cycle();
    move || samples.next().unwrap_or(ADC_MIDPOINT as u16)
}

/// Uniform noise of `spread` counts either side of the ADC midpoint.
pub fn noise(spread: i32) -> impl FnMut() -> u16 {
    let mut rng = rand::rng();
    move || (ADC_MIDPOINT as i32 + rng.random_range(-spread..=spread)) as u16
}
