// SPDX-FileCopyrightText: 2025 Contributors to the BML project.
// SPDX-License-Identifier: Apache-2.0

//! Feeds a synthetic multichannel stream through the bridge.
//!
//! Starts the ingest loop against an in-process tone generator, renders audio
//! blocks on a simulated audio clock and periodically drains the raw buffers
//! the way a bang-driven consumer would.
//!
//! ```bash
//! cargo run --example synthetic_stream -- --channels 4 --seconds 3
//! RUST_LOG=bml=trace cargo run --example synthetic_stream
//! ```

use std::{
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use bml::{
    BlockRenderer, Ingest,
    config::SessionConfig,
    stream::synthetic::{SyntheticResolver, SyntheticStream},
};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON session configuration; command line values override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Channels produced by the synthetic stream
    #[arg(short, long, default_value_t = 8)]
    channels: usize,

    /// Nominal rate of the synthetic stream in Hz
    #[arg(long, default_value_t = 512.0)]
    stream_rate: f64,

    /// Simulated audio rate in Hz
    #[arg(long, default_value_t = 44_100.0)]
    audio_rate: f64,

    /// Frames per audio block
    #[arg(short, long, default_value_t = 64)]
    block: usize,

    /// How long to run
    #[arg(short, long, default_value_t = 2.0)]
    seconds: f64,
}

/// Logs to stdout at INFO unless `RUST_LOG` says otherwise.
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() {
    setup_logging();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> bml::Result<()> {
    if cli.block == 0 {
        return Err(bml::Error::Other("--block must be at least 1".to_string()));
    }
    if !(cli.seconds.is_finite() && cli.seconds >= 0.0) {
        return Err(bml::Error::Other(format!(
            "--seconds must be a non-negative number, got {}",
            cli.seconds
        )));
    }
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|err| {
                bml::Error::Other(format!("Reading {}: {err}", path.display()))
            })?;
            SessionConfig::from_json(&json)?
        }
        None => SessionConfig::default(),
    };
    config.channel_count = cli.channels;
    config.source_rate = cli.stream_rate;

    let mut renderer = BlockRenderer::new(config.source_rate, cli.audio_rate, 1)?;

    let resolver = SyntheticResolver::new().with_stream(SyntheticStream::new(
        "synthetic",
        config.filter.value.clone(),
        cli.channels,
        cli.stream_rate,
    ));
    let ingest = Ingest::new(Arc::new(resolver), config.clone())?;
    ingest.start()?;

    let mut block = vec![0.0f32; cli.block];
    let block_period = Duration::from_secs_f64(cli.block as f64 / cli.audio_rate);
    let bang_period = Duration::from_millis(250);

    let started = Instant::now();
    let run_for = Duration::from_secs_f64(cli.seconds);
    let mut next_block = started;
    let mut next_bang = started + bang_period;
    let mut rendered_blocks = 0u64;
    let mut peak = 0.0f32;

    while started.elapsed() < run_for {
        let now = Instant::now();
        if now >= next_block {
            renderer.render(ingest.bank(), &mut [&mut block[..]]);
            peak = block.iter().fold(peak, |acc, v| acc.max(v.abs()));
            rendered_blocks += 1;
            next_block += block_period;
        }
        if now >= next_bang {
            // The raw cursor is independent of the renderer's.
            let fresh: Vec<usize> = ingest.bank().iter().map(|c| c.read_new().len()).collect();
            info!("Bang: new samples per channel {fresh:?}");
            next_bang += bang_period;
        }
        thread::sleep(next_block.min(next_bang).saturating_duration_since(Instant::now()));
    }

    ingest.stop();
    info!(
        "Rendered {rendered_blocks} block(s), peak {peak:.3}, {} underrun sample(s), {} stream sample(s) ingested",
        renderer.underrun_samples(0),
        ingest.samples_ingested()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("synthetic_stream").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn zero_block_is_rejected() {
        assert!(matches!(run(&cli(&["--block", "0"])), Err(bml::Error::Other(_))));
    }

    #[test]
    fn unusable_durations_are_rejected() {
        for seconds in ["-1", "NaN", "inf"] {
            let arg = format!("--seconds={seconds}");
            assert!(
                matches!(run(&cli(&[arg.as_str()])), Err(bml::Error::Other(_))),
                "--seconds {seconds}"
            );
        }
    }

    #[test]
    fn zero_audio_rate_is_rejected() {
        assert!(matches!(
            run(&cli(&["--audio-rate", "0", "--seconds", "0"])),
            Err(bml::Error::InvalidRate { which: "target", .. })
        ));
    }
}
