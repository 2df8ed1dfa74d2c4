//! `fpr` — command-line front end for the fingerprinting engine.
//!
//! Wires the decode/capture collaborators and JSON persistence around
//! `sonarmark::SharedIndex`. No network surface, no daemon: every
//! invocation loads an index, does one thing, and (for mutating
//! commands) saves it back.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use sonarmark::decode::Decoder;
use sonarmark::index::TrackMetadata;
use sonarmark::{SharedIndex, persistence};

#[derive(Parser)]
#[command(name = "fpr", about = "Fingerprint and recognise audio recordings")]
struct Cli {
    /// Path to the JSON index file.
    #[arg(long, short, default_value = "fingerprints.json")]
    index: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest an audio file into the index.
    Add {
        /// Path to the audio file to ingest.
        path: PathBuf,
        /// Optional track title; defaults to the file name.
        #[arg(long)]
        title: Option<String>,
        /// Optional artist metadata.
        #[arg(long)]
        artist: Option<String>,
    },
    /// Identify an audio file against the index.
    Identify {
        /// Path to the audio file to identify.
        path: PathBuf,
        /// Minimum score to count as a match.
        #[arg(long, default_value_t = 5)]
        threshold: u64,
    },
    /// Record from the microphone and identify it against the index.
    Listen {
        /// Seconds to record.
        #[arg(long, default_value_t = 8)]
        seconds: u64,
        #[arg(long, default_value_t = 5)]
        threshold: u64,
        /// Optional path to save the captured clip as a WAV file.
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn load_index(path: &PathBuf) -> Result<SharedIndex> {
    if path.exists() {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let index = persistence::load(file).with_context(|| format!("loading index from {}", path.display()))?;
        Ok(SharedIndex::new(index))
    } else {
        Ok(SharedIndex::default())
    }
}

fn save_index(index: &SharedIndex, path: &PathBuf) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    persistence::save(&index.snapshot(), file).with_context(|| format!("saving index to {}", path.display()))
}

fn report(track_id: Option<u32>, score: u64, threshold: u64, index: &SharedIndex) {
    match track_id.filter(|_| score >= threshold) {
        Some(id) => {
            let title = index
                .metadata(id)
                .and_then(|m| m.get("title").map(str::to_string))
                .unwrap_or_else(|| "<untitled>".to_string());
            println!("match: track {id} ({title}), score {score}");
        }
        None => println!("no match (best score {score}, threshold {threshold})"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let decoder = Decoder::new();

    match cli.command {
        Command::Add { path, title, artist } => {
            let index = load_index(&cli.index)?;
            let (pcm, sample_rate) = decoder.load(&path)?;

            let mut metadata = TrackMetadata::with_title(
                title.unwrap_or_else(|| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string())
                }),
            );
            if let Some(artist) = artist {
                metadata.insert("artist", artist);
            }
            metadata.insert("filename", path.display().to_string());

            let id = index.add_track(&pcm, sample_rate, Some(metadata))?;
            save_index(&index, &cli.index)?;
            info!(track_id = id, "added track");
            println!("added track {id}");
        }
        Command::Identify { path, threshold } => {
            let index = load_index(&cli.index)?;
            let (pcm, sample_rate) = decoder.load(&path)?;
            let result = index.recognise(&pcm, sample_rate)?;
            report(result.track_id, result.score, threshold, &index);
        }
        Command::Listen { seconds, threshold, save } => {
            let index = load_index(&cli.index)?;
            let (pcm, sample_rate) = sonarmark::capture::record(Duration::from_secs(seconds))?;
            if let Some(save_path) = &save {
                sonarmark::capture::save_as_wav(&pcm, sample_rate, save_path)?;
                info!(path = %save_path.display(), "saved captured clip");
            }
            let result = index.recognise(&pcm, sample_rate)?;
            report(result.track_id, result.score, threshold, &index);
        }
    }

    Ok(())
}
