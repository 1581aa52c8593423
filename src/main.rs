//! Scene Studio CLI
//!
//! Command-line interface for layered scene generation.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use scene_studio::cli::{commands, Cli};
use scene_studio::StudioConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    debug!("Scene Studio v{}", env!("CARGO_PKG_VERSION"));

    let config = StudioConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Err(e) = commands::run(cli, config) {
        if let Some(hint) = e.recovery_suggestion() {
            eprintln!("hint: {}", hint);
        }
        return Err(e.into());
    }
    Ok(())
}
