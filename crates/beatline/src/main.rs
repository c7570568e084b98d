//! Beatline - Music-Driven Level Generation
//!
//! Command-line front end for the Beatline pipeline: decode a WAV clip,
//! transform it into magnitude-spectrum frames, detect per-band onsets and
//! place level features, then persist the generated level.

#![warn(missing_docs)]

mod config;
mod fft;
mod wav;

use anyhow::{Context, Result};
use beatline_core::{generate_level, AnalyzerConfig, NullBackend, SpectrumAnalyzer};
use beatline_io::{load_level, save_level};
use clap::{Parser, Subcommand};
use config::GenerationConfig;
use fft::FftProcessor;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate side-scroller levels synchronized to music.
#[derive(Parser)]
#[command(name = "beatline", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a song and generate a level file
    Generate {
        /// Path to the WAV clip to analyze
        song: PathBuf,
        /// Generation configuration (RON)
        #[arg(short, long)]
        config: PathBuf,
        /// Output level file (.ron, .level or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print a summary of a saved level file
    Inspect {
        /// Level file to summarize
        level: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for CLI output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            song,
            config,
            output,
        } => generate(&song, &config, &output),
        Command::Inspect { level } => inspect(&level),
    }
}

fn generate(song: &Path, config_path: &Path, output: &Path) -> Result<()> {
    let mut config = GenerationConfig::load(config_path)?;
    if config.level.song_name.is_empty() {
        config.level.song_name = song
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unknown")
            .to_string();
    }

    let clip = wav::load_clip(song)?;
    info!(
        song = %config.level.song_name,
        duration = clip.duration(),
        sample_rate = clip.sample_rate,
        "clip decoded"
    );

    let analysis = &config.analysis;
    let mut processor = FftProcessor::new(analysis.fft_size, analysis.hop_size);
    let frames = processor.magnitude_frames(&clip.samples, clip.sample_rate);
    anyhow::ensure!(
        !frames.is_empty(),
        "clip is shorter than one FFT window ({} samples)",
        analysis.fft_size
    );

    let analyzer_config = AnalyzerConfig {
        sample_rate: clip.sample_rate,
        fft_size: analysis.fft_size,
        window_size: analysis.window_size,
        bars: analysis.bars,
    };
    let mut analyzer = SpectrumAnalyzer::new(analyzer_config, config.bands.clone())
        .context("invalid analyzer configuration")?;
    for frame in &frames {
        analyzer.analyze(&frame.magnitudes, frame.time);
    }
    info!(frames = frames.len(), "spectrum analysis complete");

    let level = generate_level(
        &analyzer,
        &config.features,
        &config.level,
        clip.duration(),
        &mut NullBackend::default(),
    )
    .context("level generation failed")?;

    save_level(&level, output)
        .with_context(|| format!("failed to save level to {}", output.display()))?;

    println!(
        "Generated {}: {} entities, {} lighting cues over {} indices",
        output.display(),
        level.level_object_data.len(),
        level.lighting_event_data.len(),
        level.song_index_length
    );
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let level =
        load_level(path).with_context(|| format!("failed to load {}", path.display()))?;

    println!("Song:            {}", level.song_name);
    println!("Song time:       {:.2}s", level.song_time);
    println!(
        "Timeline:        {} indices at {} units each ({:.2} units total)",
        level.song_index_length, level.spacing_between_samples, level.level_length
    );
    println!(
        "Jump physics:    height {:.2}, distance {:.2} (gravity {}, launch {}, scroll {:.2})",
        level.physics_model.jump_height,
        level.physics_model.jump_distance,
        level.physics_model.gravity,
        level.physics_model.jump_acceleration,
        level.physics_model.scroll_velocity
    );

    let mut per_kind: BTreeMap<String, usize> = BTreeMap::new();
    for entity in &level.level_object_data {
        *per_kind
            .entry(format!("{:?}", entity.feature.kind))
            .or_default() += 1;
    }
    println!("Entities:        {}", level.level_object_data.len());
    for (kind, count) in &per_kind {
        println!("  {kind}: {count}");
    }
    println!("Lighting cues:   {}", level.lighting_event_data.len());
    Ok(())
}
