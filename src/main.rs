//! cinereel: plays the sixty-second reel and follows it with a caption
//! timeline.
//!
//! Usage:
//!   cinereel
//!   cinereel --wav reel.wav

mod narrator;

use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cr_director::{run_frames, ClockState, Director, DirectorConfig, OutputConfig, PlaybackClock};
use cr_ir::DURATION;

use crate::narrator::ConsoleNarrator;

#[derive(Parser, Debug)]
#[command(name = "cinereel", version, about = "Sixty-second procedural audio reel")]
struct Args {
    /// Render the composition to a WAV file instead of playing it
    #[arg(long, value_name = "PATH")]
    wav: Option<PathBuf>,

    /// Sample rate for WAV export
    #[arg(
        long,
        value_name = "HZ",
        default_value_t = 44_100,
        value_parser = clap::value_parser!(u32).range(8_000..=192_000)
    )]
    sample_rate: u32,

    /// Timeline refresh rate
    #[arg(long, value_name = "N", default_value_t = 60)]
    fps: u32,

    /// Do not print narration cues
    #[arg(long)]
    quiet_narration: bool,

    /// Output buffer length
    #[arg(long, value_name = "MS", default_value_t = 100)]
    buffer_ms: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match &args.wav {
        Some(path) => export_wav(path, args.sample_rate),
        None => play_live(&args),
    }
}

fn play_live(args: &Args) -> Result<()> {
    let config = DirectorConfig {
        output: OutputConfig { buffer_ms: args.buffer_ms },
        narration: !args.quiet_narration,
    };
    let mut director = Director::default()
        .with_config(config)
        .with_narrator(Arc::new(ConsoleNarrator));

    let mut clock = PlaybackClock::system();
    match director.start() {
        Ok(session) => {
            tracing::info!(sample_rate = session.sample_rate, "playing");
            clock.start_at(session.started_at);
        }
        Err(e) if e.is_unavailable() => {
            tracing::warn!(error = %e, "no audio output, running the timeline silently");
            clock.start();
        }
        Err(e) => return Err(e).context("failed to start playback"),
    }

    let mut stdout = std::io::stdout();
    let mut current = "";
    let state = run_frames(&mut clock, args.fps, |tick| {
        if tick.segment.id != current {
            current = tick.segment.id;
            println!("\n\n{}\n  {}", tick.segment.label, tick.segment.caption);
        }
        print!("\r{:5.1}s / {:.0}s  [{:<20}]", tick.elapsed, DURATION, bar(tick.progress, 20));
        let _ = stdout.flush();
        ControlFlow::Continue(())
    });

    director.stop();
    if state == ClockState::Completed {
        println!("\n\nDone.");
    }
    Ok(())
}

fn bar(progress: f64, width: usize) -> String {
    let filled = ((progress.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    "#".repeat(filled)
}

fn export_wav(path: &Path, sample_rate: u32) -> Result<()> {
    println!("Rendering to {} at {} Hz...", path.display(), sample_rate);
    let wav = cr_director::render_to_wav(sample_rate).context("offline render failed")?;
    std::fs::write(path, &wav).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Rendered {} bytes", wav.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["cinereel"]).unwrap();
        assert_eq!(args.sample_rate, 44_100);
        assert_eq!(args.fps, 60);
        assert_eq!(args.buffer_ms, 100);
        assert!(args.wav.is_none());
        assert!(!args.quiet_narration);
    }

    #[test]
    fn sample_rate_is_bounded() {
        assert!(Args::try_parse_from(["cinereel", "--sample-rate", "48000"]).is_ok());
        assert!(Args::try_parse_from(["cinereel", "--sample-rate", "192000"]).is_ok());
        assert!(Args::try_parse_from(["cinereel", "--sample-rate", "7999"]).is_err());
        assert!(Args::try_parse_from(["cinereel", "--sample-rate", "4294967295"]).is_err());
    }

    #[test]
    fn bar_fills_with_progress() {
        assert_eq!(bar(0.0, 20), "");
        assert_eq!(bar(0.5, 20).len(), 10);
        assert_eq!(bar(2.0, 20).len(), 20);
    }
}
