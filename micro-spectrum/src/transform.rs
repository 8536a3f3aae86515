use core::f32::consts::PI;

use fugit::HertzU32;
use microdsp::common::{apply_window_function, WindowFunctionType::Hann};
use microfft::{real, Complex32};
#[allow(unused_imports)]
use micromath::F32Ext;

/// Frequency transform applied in place to a settled window.
///
/// After `apply`, `real[i]` holds the magnitude of bin `i`. Index `i >= 2`
/// is read as frequency `(i - 2) * (sample_rate / 2) / (N / 2)`; indices 0
/// and 1 carry overall level and are never classified.
pub trait Transform {
    fn apply(&mut self, real: &mut [f32], imag: &mut [f32], sample_rate: HertzU32);

    /// Whether windows of `len` samples can be transformed.
    fn supports(&self, len: usize) -> bool;
}

/// Taper applied to a window before the FFT.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowShape {
    #[default]
    Hamming,
    Hann,
}

/// Window function, real FFT, then bin magnitudes.
///
/// By default the raw samples are tapered with a Hamming window, converter
/// bias included. [`WindowedFft::with_dc_removal`] subtracts the window mean
/// first, which keeps the bias out of the lowest bins.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowedFft {
    shape: WindowShape,
    remove_dc: bool,
}

impl WindowedFft {
    pub const fn new() -> Self {
        Self {
            shape: WindowShape::Hamming,
            remove_dc: false,
        }
    }

    pub fn with_shape(mut self, shape: WindowShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_dc_removal(mut self) -> Self {
        self.remove_dc = true;
        self
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn removes_dc(&self) -> bool {
        self.remove_dc
    }
}

impl Transform for WindowedFft {
    fn apply(&mut self, real: &mut [f32], imag: &mut [f32], _sample_rate: HertzU32) {
        let len = real.len();
        if self.remove_dc {
            remove_dc_offset(real);
        }
        match self.shape {
            WindowShape::Hamming => apply_hamming_window(real),
            WindowShape::Hann => apply_hann_window(real),
        }

        let Some(spectrum) = compute_fft(real) else {
            return;
        };
        // The real FFT packs the Nyquist bin into the imaginary part of DC.
        let dc = spectrum[0].re.abs();
        let nyquist = spectrum[0].im.abs();
        compute_magnitude(&spectrum[1..], &mut imag[1..len / 2]);

        real[0] = dc;
        real[len / 2] = nyquist;
        for k in 1..len / 2 {
            real[k] = imag[k];
            real[len - k] = imag[k];
        }
        imag.fill(0.0);
    }

    fn supports(&self, len: usize) -> bool {
        is_supported_size(len)
    }
}

pub fn is_supported_size(len: usize) -> bool {
    len.is_power_of_two() && (8..=4096).contains(&len)
}

/// Subtracts the mean so the converter's bias does not leak into the low
/// bins through the window.
pub fn remove_dc_offset(samples: &mut [f32]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    for sample in samples.iter_mut() {
        *sample -= mean;
    }
}

/// Symmetric Hamming window, `0.54 - 0.46 cos(2 pi i / (N - 1))`.
pub fn apply_hamming_window(samples: &mut [f32]) {
    if samples.len() < 2 {
        return;
    }
    let span = (samples.len() - 1) as f32;
    for (i, sample) in samples.iter_mut().enumerate() {
        *sample *= 0.54 - 0.46 * (2.0 * PI * i as f32 / span).cos();
    }
}

/// Apply a Hann window to a slice of f32 samples.
pub fn apply_hann_window(samples: &mut [f32]) {
    apply_window_function(Hann, samples);
}

macro_rules! dispatch_rfft {
    ($samples:expr, $($len:literal => $rfft:ident),* $(,)?) => {
        match $samples.len() {
            $(
                $len => {
                    let frame: &mut [f32; $len] = $samples.try_into().ok()?;
                    Some(&mut real::$rfft(frame)[..])
                }
            )*
            _ => None,
        }
    };
}

/// Compute the real FFT of `samples` in place. The returned bins alias the
/// sample memory. `None` for unsupported lengths.
pub fn compute_fft(samples: &mut [f32]) -> Option<&mut [Complex32]> {
    dispatch_rfft!(
        samples,
        8 => rfft_8,
        16 => rfft_16,
        32 => rfft_32,
        64 => rfft_64,
        128 => rfft_128,
        256 => rfft_256,
        512 => rfft_512,
        1024 => rfft_1024,
        2048 => rfft_2048,
        4096 => rfft_4096,
    )
}

/// Writes the magnitude of each bin into `magnitude`.
pub fn compute_magnitude(fft_output: &[Complex32], magnitude: &mut [f32]) {
    for (out, component) in magnitude.iter_mut().zip(fft_output) {
        *out = (component.re * component.re + component.im * component.im).sqrt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_compute_magnitude() {
        let mut fft_output = [Complex32 { re: 0.0, im: 0.0 }; 4];
        fft_output[0] = Complex32 { re: 1.0, im: 0.0 };
        fft_output[1] = Complex32 { re: 0.0, im: 1.0 };
        fft_output[3] = Complex32 { re: 3.0, im: -4.0 };

        let mut magnitude = [0.0; 4];
        compute_magnitude(&fft_output, &mut magnitude);

        assert_eq!(magnitude, [1.0, 1.0, 0.0, 5.0]);
    }

    #[test]
    fn test_remove_dc_offset() {
        let mut samples = [2047.0, 2049.0, 2046.0, 2050.0];
        remove_dc_offset(&mut samples);
        assert_eq!(samples, [-1.0, 1.0, -2.0, 2.0]);
    }

    #[test]
    fn test_compute_fft_rejects_unsupported_length() {
        let mut samples = [0.0f32; 12];
        assert!(compute_fft(&mut samples).is_none());
        let mut samples = [0.0f32; 64];
        assert_eq!(compute_fft(&mut samples).map(|bins| bins.len()), Some(32));
    }

    #[test]
    fn test_hamming_window_shape() {
        let mut samples = [1.0f32; 5];
        apply_hamming_window(&mut samples);
        assert_abs_diff_eq!(samples[0], 0.08, epsilon = 5e-3);
        assert_abs_diff_eq!(samples[2], 1.0, epsilon = 5e-3);
        assert_abs_diff_eq!(samples[4], 0.08, epsilon = 5e-3);
        assert_abs_diff_eq!(samples[1], samples[3], epsilon = 1e-3);
    }

    #[test]
    fn test_constant_input_keeps_dc_by_default() {
        let mut real = [3000.0f32; 8];
        let mut imag = [0.0f32; 8];
        WindowedFft::new().apply(&mut real, &mut imag, HertzU32::from_raw(8));
        // Hamming weights over eight samples sum to 3.36.
        assert_abs_diff_eq!(real[0], 3000.0 * 3.36, epsilon = 50.0);
        assert!(real[2] > 100.0, "bias leakage into bin 2 was {}", real[2]);

        let mut real = [3000.0f32; 8];
        WindowedFft::new()
            .with_dc_removal()
            .apply(&mut real, &mut imag, HertzU32::from_raw(8));
        assert!(real.iter().all(|&m| m < 1e-2));
    }

    #[test]
    fn test_windowed_fft_locates_pure_tone() {
        const N: usize = 64;
        let rate = 6400.0;
        // Bin width is 100 Hz, put the tone exactly on bin 8.
        let tone = |i: usize| {
            2048.0 + 1000.0 * (2.0 * core::f32::consts::PI * 800.0 * i as f32 / rate).sin()
        };

        for transform in [
            WindowedFft::new(),
            WindowedFft::new().with_shape(WindowShape::Hann),
            WindowedFft::new().with_dc_removal(),
        ] {
            let mut real: [f32; N] = core::array::from_fn(tone);
            let mut imag = [0.0f32; N];
            let mut transform = transform;
            transform.apply(&mut real, &mut imag, HertzU32::from_raw(6400));

            // Skip the main lobe of the bias.
            let loudest = (3..N / 2)
                .max_by(|&a, &b| real[a].partial_cmp(&real[b]).unwrap())
                .unwrap();
            assert_eq!(loudest, 8, "{:?}", transform);
            assert_abs_diff_eq!(real[N - 8], real[8], epsilon = 1e-3);
            assert!(imag.iter().all(|&v| v == 0.0));
        }
    }
}
