use micro_spectrum::AnalogSource;
use rand::{rngs::StdRng, Rng, SeedableRng};
use wavegen::{dc_bias, sine, Waveform};

/// Mid-scale reading of a 12-bit converter.
pub const ADC_MIDPOINT: f32 = 2048.0;
const ADC_MAX: f32 = 4095.0;

/// Stand-in for the microphone ADC: a set of tones pulsed on a beat, plus
/// uniform noise, biased around mid-scale.
pub struct SyntheticAdc {
    /// One second of the steady tones, without bias.
    tones: Vec<f32>,
    rate: u32,
    beat_samples: u32,
    noise: i32,
    rng: StdRng,
    index: u64,
}

impl SyntheticAdc {
    pub fn new(
        rate: u32,
        frequencies: &[f32],
        amplitude: f32,
        noise: i32,
        beat_ms: u32,
        seed: u64,
    ) -> Self {
        let components: Vec<_> = frequencies
            .iter()
            .map(|&frequency| sine!(frequency, amplitude))
            .chain(core::iter::once(dc_bias!(0.0)))
            .collect();
        let waveform = Waveform::<f32>::with_components(rate as f32, components);
        let tones = waveform.iter().take(rate.max(1) as usize).collect();

        Self {
            tones,
            rate,
            beat_samples: (rate as u64 * beat_ms as u64 / 1000) as u32,
            noise: noise.max(0),
            rng: StdRng::seed_from_u64(seed),
            index: 0,
        }
    }

    /// Loudness envelope, 1 on the beat decaying towards 0.25.
    fn envelope(&self) -> f32 {
        if self.beat_samples == 0 {
            return 1.0;
        }
        let since_beat = (self.index % self.beat_samples as u64) as f32 / self.rate as f32;
        0.25 + 0.75 * (-since_beat / 0.12).exp()
    }
}

impl AnalogSource for SyntheticAdc {
    fn read(&mut self) -> u16 {
        let tone = self.tones[(self.index % self.tones.len() as u64) as usize];
        let noise = self.rng.random_range(-self.noise..=self.noise) as f32;
        let value = ADC_MIDPOINT + tone * self.envelope() + noise;
        self.index += 1;
        value.clamp(0.0, ADC_MAX) as u16
    }
}
