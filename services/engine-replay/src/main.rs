//! Replays recorded scroll samples and scripted toggles through the engine
//! and prints one JSON object per decision on stdout.
//!
//! Usage: `engine-replay <scenario.json>`. Logs go to stderr and follow
//! `RUST_LOG`; a scenario without a `config` block reads `SF_*` variables.

mod replay;

use anyhow::Context;
use std::io::Write;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: engine-replay <scenario.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading scenario {path}"))?;
    let scenario: replay::Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {path}"))?;

    let events = replay::run(&scenario).await?;
    info!("scenario {} produced {} events", path, events.len());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for event in &events {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }

    Ok(())
}
