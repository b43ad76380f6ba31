//! Hexisle headless simulator: seeded bot-vs-bot matches.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod report;
mod runner;

use config::SimConfig;
use report::{SimReport, Standings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SimConfig::from_env()?;
    info!(
        games = config.games,
        players = config.players,
        seed = config.seed,
        "Starting Hexisle simulation..."
    );

    let standings = Arc::new(Standings::new());
    let results = runner::run_matches(&config, Arc::clone(&standings)).await;

    let report = SimReport::build(&standings, results);
    report.write(config.report.as_deref()).await?;

    if let Some(path) = &config.report {
        info!("Report written to {}", path.display());
    }
    Ok(())
}
