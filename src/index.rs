//! The inverted token index: the sole piece of state the core owns
//! across calls. Everything else (spectrograms, peaks, token streams)
//! is produced and consumed within a single `add_track`/`recognise`
//! call.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::hasher::{self, Token};
use crate::matcher::{self, Match};
use crate::peaks;
use crate::spectrogram;

/// One occurrence of a token within a known track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub track_id: u32,
    pub anchor_time: u32,
}

/// Free-form track metadata. A `BTreeMap` rather than a `HashMap` so
/// persisted output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackMetadata(pub BTreeMap<String, String>);

impl TrackMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("title".to_string(), title.into());
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

/// The inverted fingerprint index: token → postings, plus per-track
/// metadata and the id counter. Structurally this is exactly the
/// state the persistence format round-trips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    postings: HashMap<u32, Vec<Posting>>,
    metadata: HashMap<u32, TrackMetadata>,
    next_track_id: u32,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_count(&self) -> usize {
        self.metadata.len()
    }

    /// Read-only accessor for a track's metadata by id.
    pub fn metadata(&self, track_id: u32) -> Option<&TrackMetadata> {
        self.metadata.get(&track_id)
    }

    fn fingerprint(pcm: &[f32], sample_rate: u32) -> Result<Vec<(Token, u32)>, Error> {
        let spectrogram = spectrogram::compute(pcm, sample_rate)?;
        let mut peaks = peaks::find_peaks(&spectrogram);
        hasher::sort_peaks(&mut peaks);
        Ok(hasher::tokenize(&peaks))
    }

    /// Ingest a track: fingerprint it and insert its tokens into the
    /// index under a freshly allocated id.
    pub fn add_track(
        &mut self,
        pcm: &[f32],
        sample_rate: u32,
        metadata: Option<TrackMetadata>,
    ) -> Result<u32, Error> {
        let tokens = Self::fingerprint(pcm, sample_rate)?;

        let track_id = self.next_track_id;
        self.next_track_id += 1;

        for (token, anchor_time) in tokens {
            self.postings.entry(token.0).or_default().push(Posting {
                track_id,
                anchor_time,
            });
        }

        let metadata = metadata.unwrap_or_else(|| TrackMetadata::with_title(format!("track-{track_id}")));
        self.metadata.insert(track_id, metadata);

        Ok(track_id)
    }

    /// Fingerprint a query sample and find the best-aligned track.
    pub fn recognise(&self, pcm: &[f32], sample_rate: u32) -> Result<Match, Error> {
        let tokens = Self::fingerprint(pcm, sample_rate)?;
        Ok(matcher::recognise(&tokens, |token| {
            self.postings.get(&token.0).map(Vec::as_slice)
        }))
    }
}

/// Thin `Arc<RwLock<Index>>` wrapper giving "one writer, many readers"
/// discipline without baking locking into `Index` itself. Cloning a
/// `SharedIndex` shares the same underlying index.
#[derive(Debug, Clone)]
pub struct SharedIndex(Arc<RwLock<Index>>);

impl SharedIndex {
    pub fn new(index: Index) -> Self {
        Self(Arc::new(RwLock::new(index)))
    }

    pub fn add_track(
        &self,
        pcm: &[f32],
        sample_rate: u32,
        metadata: Option<TrackMetadata>,
    ) -> Result<u32, Error> {
        self.0
            .write()
            .expect("index lock poisoned")
            .add_track(pcm, sample_rate, metadata)
    }

    pub fn recognise(&self, pcm: &[f32], sample_rate: u32) -> Result<Match, Error> {
        self.0.read().expect("index lock poisoned").recognise(pcm, sample_rate)
    }

    pub fn metadata(&self, track_id: u32) -> Option<TrackMetadata> {
        self.0.read().expect("index lock poisoned").metadata(track_id).cloned()
    }

    pub fn track_count(&self) -> usize {
        self.0.read().expect("index lock poisoned").track_count()
    }

    /// Clone out the current state for a consistent snapshot to persist.
    pub fn snapshot(&self) -> Index {
        self.0.read().expect("index lock poisoned").clone()
    }
}

impl Default for SharedIndex {
    fn default() -> Self {
        Self::new(Index::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn broadband_noise(seed: u64, sample_rate: u32, seconds: f32) -> Vec<f32> {
        use rand::{Rng, SeedableRng};
        use rand::rngs::StdRng;
        let mut rng = StdRng::seed_from_u64(seed);
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n).map(|_| rng.random_range(-1.0f32..1.0f32)).collect()
    }

    #[test]
    fn ids_are_assigned_contiguously_from_zero() {
        let mut index = Index::new();
        let sample_rate = 11025;
        let pcm = sine(1000.0, sample_rate, 2.0);
        let a = index.add_track(&pcm, sample_rate, None).unwrap();
        let b = index.add_track(&pcm, sample_rate, None).unwrap();
        let c = index.add_track(&pcm, sample_rate, None).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));
    }

    #[test]
    fn every_posting_track_id_has_metadata() {
        let mut index = Index::new();
        let sample_rate = 11025;
        let pcm = broadband_noise(1, sample_rate, 3.0);
        index.add_track(&pcm, sample_rate, None).unwrap();

        for postings in index.postings.values() {
            for posting in postings {
                assert!(index.metadata.contains_key(&posting.track_id));
            }
        }
    }

    #[test]
    fn empty_index_recognises_no_match() {
        let index = Index::new();
        let sample_rate = 11025;
        let pcm = sine(440.0, sample_rate, 1.0);
        let result = index.recognise(&pcm, sample_rate).unwrap();
        assert_eq!(result.track_id, None);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn self_recognition_beats_other_tracks() {
        let sample_rate = 11025;
        let mut index = Index::new();

        let track_a = broadband_noise(1, sample_rate, 10.0);
        let track_b = broadband_noise(2, sample_rate, 10.0);
        let id_a = index.add_track(&track_a, sample_rate, None).unwrap();
        let id_b = index.add_track(&track_b, sample_rate, None).unwrap();

        let result = index.recognise(&track_a, sample_rate).unwrap();
        assert_eq!(result.track_id, Some(id_a));
        assert!(result.score > 0);
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn default_metadata_falls_back_to_a_generated_title() {
        let mut index = Index::new();
        let sample_rate = 11025;
        let pcm = sine(1000.0, sample_rate, 1.0);
        let id = index.add_track(&pcm, sample_rate, None).unwrap();
        assert_eq!(index.metadata(id).unwrap().get("title"), Some("track-0"));
    }

    #[test]
    fn rejects_invalid_input() {
        let mut index = Index::new();
        assert!(index.add_track(&[], 44100, None).is_err());
        assert!(index.recognise(&[0.0; 100], 0).is_err());
    }

    #[test]
    fn shared_index_clones_see_each_others_writes() {
        let sample_rate = 11025;
        let pcm = sine(1000.0, sample_rate, 2.0);

        let shared = SharedIndex::new(Index::new());
        let handle = shared.clone();
        let id = handle.add_track(&pcm, sample_rate, None).unwrap();

        assert_eq!(shared.track_count(), 1);
        let result = shared.recognise(&pcm, sample_rate).unwrap();
        assert_eq!(result.track_id, Some(id));
    }
}
