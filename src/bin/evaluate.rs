//! Dataset evaluation harness.
//!
//! Builds an in-memory index from a directory of audio files, then
//! queries a random clip from every track and reports top-1 accuracy.
//! Mirrors the random-snippet test the reference and `sabi`'s own
//! `tester.rs` both run, but samples clips in-process instead of
//! shelling out to `ffmpeg`/`ffprobe`.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sonarmark::decode::Decoder;
use sonarmark::index::TrackMetadata;
use sonarmark::SharedIndex;

const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "mp3", "ogg", "m4a", "aac"];

/// Recursively list audio files under `dir`, sorted for deterministic
/// sampling order (mirrors the reference's `os.walk` + sort).
fn list_audio_files(dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)
            .with_context(|| format!("reading directory {}", current.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
            {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Parser)]
#[command(about = "Evaluate recognition accuracy against a directory of tracks")]
struct Cli {
    /// Directory containing audio files (scanned recursively).
    #[arg(long)]
    music_dir: PathBuf,
    /// Query clip length in seconds.
    #[arg(long, default_value_t = 5.0)]
    clip_seconds: f32,
    /// Maximum number of tracks to evaluate.
    #[arg(long, default_value_t = 100)]
    max_tracks: usize,
    /// Random seed for deterministic clip sampling.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Minimum score considered a valid match.
    #[arg(long, default_value_t = 5)]
    min_score: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if !cli.music_dir.is_dir() {
        bail!("music directory not found: {}", cli.music_dir.display());
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let mut files = list_audio_files(&cli.music_dir)?;
    if files.len() > cli.max_tracks {
        // Simple reservoir-free sample: shuffle then truncate.
        for i in (1..files.len()).rev() {
            let j = rng.random_range(0..=i);
            files.swap(i, j);
        }
        files.truncate(cli.max_tracks);
        files.sort();
    }
    if files.is_empty() {
        bail!("no audio files found under {}", cli.music_dir.display());
    }

    println!("Building database with {} tracks...", files.len());
    let decoder = Decoder::new();
    let index = SharedIndex::default();
    let mut tracks: Vec<(u32, Vec<f32>, u32)> = Vec::new();

    for path in &files {
        let (pcm, sample_rate) = decoder
            .load(path)
            .with_context(|| format!("decoding {}", path.display()))?;
        let rel = path
            .strip_prefix(&cli.music_dir)
            .unwrap_or(path)
            .display()
            .to_string();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| rel.clone());

        let mut metadata = TrackMetadata::with_title(title);
        metadata.insert("filename", rel);

        let id = index.add_track(&pcm, sample_rate, Some(metadata))?;
        tracks.push((id, pcm, sample_rate));
    }

    println!("Running recognition queries...");
    let mut attempts = 0u32;
    let mut correct = 0u32;
    let mut rejected = 0u32;

    for (track_id, pcm, sample_rate) in &tracks {
        let clip_len = ((*sample_rate as f32 * cli.clip_seconds) as usize).max(1).min(pcm.len());
        let start = if pcm.len() > clip_len {
            rng.random_range(0..=(pcm.len() - clip_len))
        } else {
            0
        };
        let clip = &pcm[start..start + clip_len];

        attempts += 1;
        let result = match index.recognise(clip, *sample_rate) {
            Ok(r) => r,
            Err(_) => {
                rejected += 1;
                continue;
            }
        };

        match result.track_id {
            Some(predicted) if result.score >= cli.min_score => {
                if predicted == *track_id {
                    correct += 1;
                }
            }
            _ => rejected += 1,
        }
    }

    let accuracy = if attempts > 0 { correct as f32 / attempts as f32 * 100.0 } else { 0.0 };
    let rejection_rate = if attempts > 0 { rejected as f32 / attempts as f32 * 100.0 } else { 0.0 };

    println!("Tracks evaluated: {attempts}");
    println!("Top-1 accuracy: {accuracy:.2}%");
    println!("Rejected (score < {}): {:.2}%", cli.min_score, rejection_rate);

    Ok(())
}
