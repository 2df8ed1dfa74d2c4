//! File decoding collaborator: turns a WAV/MP3/FLAC/etc. file on disk
//! into mono `f32` PCM plus its sample rate, the way the core expects.
//!
//! This module is outside the fingerprinting core proper (§1): it
//! owns file I/O, the core never does.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecRegistry, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::{Hint, Probe};
use symphonia::default;
use tracing::debug;

use crate::error::Error;

pub struct Decoder {
    codec_registry: &'static CodecRegistry,
    format_options: FormatOptions,
    metadata_options: MetadataOptions,
    probe: &'static Probe,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            codec_registry: default::get_codecs(),
            format_options: FormatOptions::default(),
            metadata_options: MetadataOptions::default(),
            probe: symphonia::default::get_probe(),
        }
    }

    /// Decode a file to mono `f32` PCM, downmixing any multi-channel
    /// stream by averaging channels (§4.1).
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(Vec<f32>, u32), Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::Decode(format!("failed to open '{}': {e}", path.display())))?;

        let source: Box<dyn MediaSource> = Box::new(file);
        let stream = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = self
            .probe
            .format(&hint, stream, &self.format_options, &self.metadata_options)
            .map_err(|e| Error::Decode(format!("probing '{}' failed: {e}", path.display())))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .first()
            .ok_or_else(|| Error::Decode("no audio tracks found".into()))?;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("stream has no sample rate".into()))?;

        let mut decoder = self
            .codec_registry
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("no decoder for stream: {e}")))?;

        let mut mono_samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(_)) => break,
                Err(e) => return Err(Error::Decode(e.to_string())),
            };

            let decoded = decoder
                .decode(&packet)
                .map_err(|e| Error::Decode(e.to_string()))?;
            let channels = decoded.spec().channels.count().max(1);

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            sample_buf.copy_interleaved_ref(decoded);

            for frame in sample_buf.samples().chunks_exact(channels) {
                mono_samples.push(frame.iter().sum::<f32>() / channels as f32);
            }
        }

        debug!(
            path = %path.display(),
            samples = mono_samples.len(),
            sample_rate,
            "decoded audio file"
        );

        Ok((mono_samples, sample_rate))
    }
}
