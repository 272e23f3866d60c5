//! # Onslaught
//!
//! Headless host for the Onslaught combat core.
//!
//! Runs scripted arena sessions with a bot player: every effect, sound and
//! HUD change goes to the log, and collisions come from a simple circle
//! broad-phase.
//!
//! Usage: `onslaught [config.toml] [runs] [max-seconds-per-run]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod harness;
mod timing;

use anyhow::{Context, Result};
use onslaught_combat::config::{CombatConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::harness::Headless;

/// Simulated display refresh rate.
const FRAME_DT: f32 = 1.0 / 60.0;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("onslaught=info".parse()?))
        .init();

    info!("Onslaught starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| CONFIG_FILE.to_owned());
    let runs: u32 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid run count: {raw}"))?,
        None => 3,
    };
    let max_secs: f32 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid run length: {raw}"))?,
        None => 120.0,
    };

    let config = CombatConfig::load_from(&config_path);
    let mut headless = Headless::new(config, FRAME_DT).context("failed to build combat session")?;

    let mut deaths = 0;
    let mut best_run = None;
    for run in 1..=runs {
        let summary = headless.play_run(run, max_secs);
        if summary.died {
            deaths += 1;
        }
        if best_run.map_or(true, |(_, score)| summary.score > score) {
            best_run = Some((summary.run, summary.score));
        }
    }

    if let Some((run, score)) = best_run {
        info!("Best run: #{run} with {score} points");
    }
    info!(
        "Onslaught shutdown complete ({deaths}/{runs} runs lost, high score {})",
        headless.session().scoreboard().high_score()
    );
    Ok(())
}
