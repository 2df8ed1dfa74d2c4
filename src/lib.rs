//! Audio fingerprinting and recognition engine.
//!
//! Turns a mono PCM waveform into a sparse constellation of
//! spectrogram peaks, derives robust hash tokens from peak pairs,
//! indexes them, and recognises queries by histogramming time-offset
//! differences between query and indexed anchors. See [`Index`] for
//! the primary entry point.

pub mod capture;
pub mod decode;
pub mod error;
pub mod hasher;
pub mod index;
pub mod matcher;
pub mod pcm;
pub mod peaks;
pub mod persistence;
pub mod spectrogram;

pub use error::{Error, Result};
pub use index::{Index, SharedIndex, TrackMetadata};
pub use matcher::Match;
