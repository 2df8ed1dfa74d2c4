//! Short-time Fourier transform magnitude spectrogram.
//!
//! Parameters are fixed constants (window, hop, window function,
//! amplitude floor) rather than configuration, because the contract
//! requires ingestion and query paths to use identical parameters —
//! nothing downstream can be allowed to drift them apart.

use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::Error;
use crate::pcm;

/// STFT window size in samples.
pub const WINDOW: usize = 4096;
/// Hop size between successive windows, in samples.
pub const HOP: usize = 512;
/// Amplitude floor in dB; cells at or below this are never peaks.
pub const AMP_MIN_DB: f32 = -50.0;

/// A dB-magnitude matrix with `freq_bins` rows and `time_bins` columns.
///
/// Frequency bin 0 is DC; time bin 0 is the first STFT frame.
pub struct Spectrogram {
    pub freq_bins: usize,
    pub time_bins: usize,
    data: Vec<f32>,
}

impl Spectrogram {
    fn new(freq_bins: usize, time_bins: usize) -> Self {
        Self {
            freq_bins,
            time_bins,
            data: vec![f32::NEG_INFINITY; freq_bins * time_bins],
        }
    }

    #[inline]
    pub fn get(&self, freq_bin: usize, time_bin: usize) -> f32 {
        self.data[time_bin * self.freq_bins + freq_bin]
    }

    #[inline]
    fn set(&mut self, freq_bin: usize, time_bin: usize, value: f32) {
        self.data[time_bin * self.freq_bins + freq_bin] = value;
    }
}

fn hann_window(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / (n as f32 - 1.0)).cos()))
        .collect()
}

/// Compute the dB-magnitude spectrogram of a mono PCM buffer.
///
/// `samples` must contain at least one window's worth of audio and
/// `sample_rate` must be non-zero; both are checked here so every
/// caller gets the same `InvalidInput` behaviour.
pub fn compute(samples: &[f32], sample_rate: u32) -> Result<Spectrogram, Error> {
    pcm::validate(samples, sample_rate, WINDOW)?;

    let freq_bins = WINDOW / 2 + 1;
    let len = samples.len();
    let time_bins = (len - WINDOW).div_ceil(HOP) + 1;

    let window = hann_window(WINDOW);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(WINDOW);

    let mut spec = Spectrogram::new(freq_bins, time_bins);
    let mut buf = vec![Complex::new(0.0f32, 0.0f32); WINDOW];

    for t in 0..time_bins {
        let start = t * HOP;
        for i in 0..WINDOW {
            let sample = samples.get(start + i).copied().unwrap_or(0.0);
            buf[i] = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buf);

        for f in 0..freq_bins {
            let magnitude = buf[f].norm();
            let db = 20.0 * (magnitude + 1e-10).log10();
            spec.set(f, t, db);
        }
    }

    Ok(spec)
}

#[cfg(test)]
impl Spectrogram {
    pub(crate) fn from_raw_for_test(freq_bins: usize, time_bins: usize, data: Vec<f32>) -> Self {
        Self {
            freq_bins,
            time_bins,
            data,
        }
    }

    pub(crate) fn poke_for_test(&mut self, freq_bin: usize, time_bin: usize, value: f32) {
        self.set(freq_bin, time_bin, value);
    }
}
