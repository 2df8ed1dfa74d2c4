//! Microphone capture collaborator, used by the CLI to record a query
//! snippet live. Outside the core's boundary (§1): the core only ever
//! sees the `f32` buffer this produces.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use audio_gate::NoiseGate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

use crate::error::Error;

/// Record from the default input device for `duration`, returning
/// mono-downmixed `f32` samples and the device's native sample rate.
pub fn record(duration: Duration) -> Result<(Vec<f32>, u32), Error> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::Capture("no input device found".into()))?;
    let config = device
        .default_input_config()
        .map_err(|e| Error::Capture(format!("no supported input config: {e}")))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    // Constructed the way the reference capture path gates out
    // silence/hiss below -36 dB; wired in once the upstream crate's
    // streaming API stabilises (TODO: apply `gate` per-frame below).
    let _gate = NoiseGate::new(-36.0, -54.0, sample_rate as f32, channels as u16, 150.0, 25.0, 150.0);

    let recorded = Arc::new(Mutex::new(Vec::<f32>::new()));
    let recorded_clone = recorded.clone();
    let err_fn = |err| tracing::error!("input stream error: {err}");

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device
            .build_input_stream(
                &config.clone().into(),
                move |data: &[f32], _: &_| {
                    recorded_clone.lock().unwrap().extend_from_slice(data);
                },
                err_fn,
                None,
            )
            .map_err(|e| Error::Capture(e.to_string()))?,
        cpal::SampleFormat::I16 => device
            .build_input_stream(
                &config.clone().into(),
                move |data: &[i16], _: &_| {
                    let mut samples = recorded_clone.lock().unwrap();
                    samples.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                },
                err_fn,
                None,
            )
            .map_err(|e| Error::Capture(e.to_string()))?,
        other => {
            return Err(Error::Capture(format!("unsupported sample format: {other:?}")));
        }
    };

    stream
        .play()
        .map_err(|e| Error::Capture(format!("failed to start input stream: {e}")))?;
    std::thread::sleep(duration);
    drop(stream);

    let interleaved = recorded.lock().unwrap().clone();
    info!(samples = interleaved.len(), sample_rate, "captured audio");
    let mono = crate::pcm::downmix(&interleaved, channels);
    Ok((mono, sample_rate))
}

/// Persist a mono `f32` buffer to a 16-bit PCM WAV file, the way the
/// reference capture path stages a recording before handing it off.
pub fn save_as_wav(pcm: &[f32], sample_rate: u32, path: &Path) -> Result<(), Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer =
        WavWriter::create(path, spec).map_err(|e| Error::Capture(format!("creating {}: {e}", path.display())))?;
    for &sample in pcm {
        let amplitude = i16::MAX as f32;
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * amplitude) as i16)
            .map_err(|e| Error::Capture(format!("writing {}: {e}", path.display())))?;
    }
    writer
        .finalize()
        .map_err(|e| Error::Capture(format!("finalizing {}: {e}", path.display())))?;
    Ok(())
}
