//! Snapstore client binary.
//!
//! Opens a store session over the configured snapshot directory, runs one
//! command against it, and saves every loaded type on the way out, including
//! when interrupted with Ctrl-C.
//!
//! # Examples
//!
//! ```bash
//! snapstore status
//! snapstore add Campout location=Lake start_time=2026-06-01
//! snapstore children Campout activitys location=Lake
//! SNAPSTORE_DATA_DIR=./data RUST_LOG=debug snapstore list Activity
//! ```

mod commands;
mod interrupt;

use anyhow::Result;
use clap::Parser;
use client_bootstrap::{EngineBuilder, StoreConfig};

use crate::commands::Cli;
use crate::interrupt::Interrupt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut interrupt = Interrupt::arm().await;

    let config = StoreConfig::from_env();
    let mut session = EngineBuilder::new(config).build()?;

    let outcome = if interrupt.received().await {
        tracing::warn!("Interrupted before running the command");
        Ok(())
    } else {
        cli.command.run(&mut session)
    };
    if interrupt.received().await {
        tracing::warn!("Interrupted, saving before exit");
    }

    if let Some(report) = session.close()
        && !report.is_complete()
    {
        anyhow::bail!("{} type(s) could not be saved", report.failed.len());
    }

    outcome
}
