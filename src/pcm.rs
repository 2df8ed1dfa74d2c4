//! PCM normalisation rules shared by the decode collaborator and by
//! callers who already have floating-point samples in hand.
//!
//! The core never reads files itself; this module only turns whatever
//! shape of samples a caller has into the mono `f32` buffer the
//! spectrogram stage expects, per the scaling rules of the format
//! contract.

use crate::error::Error;

/// Downmix an interleaved multi-channel buffer to mono by averaging
/// channels. A single-channel buffer is returned unchanged.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Scale signed 16-bit PCM into `[-1, 1]`-ish floats.
pub fn from_i16(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Scale signed 32-bit PCM into `[-1, 1]`-ish floats.
pub fn from_i32(samples: &[i32]) -> Vec<f32> {
    samples
        .iter()
        .map(|&s| s as f32 / 2147483648.0)
        .collect()
}

/// Scale an arbitrary signed integer width into `[-1, 1]`-ish floats
/// using its full-scale magnitude, per §4.1's "other integer widths"
/// rule. `bits` is the sample's bit depth (e.g. 24).
pub fn from_signed_width(samples: &[i64], bits: u32) -> Result<Vec<f32>, Error> {
    if bits == 0 || bits > 63 {
        return Err(Error::UnsupportedFormat(format!(
            "unsupported integer PCM width: {bits} bits"
        )));
    }
    let full_scale = (1i64 << (bits - 1)) as f32;
    Ok(samples.iter().map(|&s| s as f32 / full_scale).collect())
}

/// Validate that a mono float buffer is usable as spectrogram input.
pub fn validate(samples: &[f32], sample_rate: u32, window: usize) -> Result<(), Error> {
    if sample_rate == 0 {
        return Err(Error::InvalidInput("sample rate must be > 0".into()));
    }
    if samples.is_empty() {
        return Err(Error::InvalidInput("PCM buffer is empty".into()));
    }
    if samples.len() < window {
        return Err(Error::InvalidInput(format!(
            "PCM buffer has {} samples, fewer than one STFT window ({window})",
            samples.len()
        )));
    }
    Ok(())
}
