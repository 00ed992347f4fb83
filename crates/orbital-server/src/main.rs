//! Orbital - headless game host
//!
//! Usage: `orbital-server [CONFIG_JSON] [RUN_SECONDS]`
//!
//! Loads the config (defaults when omitted), runs the game loop and logs a
//! JSON snapshot every few seconds. Without `RUN_SECONDS` it runs until killed.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use orbital_core::game_loop::{GameHandle, GameLoop};
use orbital_core::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(10);

/// Time to sleep before the next snapshot, or `None` once `run_for` is used up.
fn next_wait(run_for: Option<Duration>, elapsed: Duration) -> Option<Duration> {
    match run_for {
        Some(limit) => {
            let remaining = limit.saturating_sub(elapsed);
            (!remaining.is_zero()).then(|| remaining.min(SNAPSHOT_INTERVAL))
        }
        None => Some(SNAPSHOT_INTERVAL),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::from_path(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let config = load_config(args.next().map(PathBuf::from))?;
    let run_for = args
        .next()
        .map(|s| s.parse::<u64>().context("RUN_SECONDS must be a whole number"))
        .transpose()?
        .map(Duration::from_secs);

    tracing::info!(
        seed = config.seed,
        universe_speed = config.universe_speed,
        period_ms = config.tick_period_ms,
        "starting Orbital server"
    );

    let period = config.tick_period();
    let game = GameHandle::new(Simulation::new(config).context("invalid config")?);
    let running = GameLoop::spawn(game.clone(), period).context("spawning game loop")?;

    let started = Instant::now();
    while let Some(wait) = next_wait(run_for, started.elapsed()) {
        thread::sleep(wait);
        let snapshot = game.snapshot().context("reading game state")?;
        let events = game.take_events().context("draining events")?;
        tracing::info!(
            tick = snapshot.tick,
            players = snapshot.player_count(),
            events = events.len(),
            snapshot = %serde_json::to_string(&snapshot)?,
            "snapshot"
        );
        if !running.is_running() {
            anyhow::bail!("game loop stopped unexpectedly");
        }
    }

    running.shutdown();
    tracing::info!("server stopped");
    Ok(())
}
