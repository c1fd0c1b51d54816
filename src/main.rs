//! X50Q Keyboard Driver CLI
//!
//! A command-line interface for the X50Q RGB keyboard.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

mod config;
use config::AppConfig;

const DEFAULT_LOG_LEVEL: &str = "warn";

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = AppConfig::load(&config_path)?;

    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level);

    match cli.command {
        // Default: show status
        None | Some(Commands::Status) => commands::query::status(&config, cli.json)?,

        // === Query Commands ===
        Some(Commands::Watch { interval }) => commands::query::watch(&config, interval, cli.json)?,
        Some(Commands::Config { write }) => {
            commands::query::show_config(&config, &config_path, write, cli.json)?
        }

        // === Set Commands ===
        Some(Commands::SetProfile { profile }) => commands::set::set_profile(&config, profile)?,
        Some(Commands::Reset) => commands::set::reset(&config)?,
        Some(Commands::Color { color, target }) => commands::set::color(&config, color, target)?,
        Some(Commands::Effect { effect, target }) => {
            commands::set::effect(&config, effect, target)?
        }
        Some(Commands::Duration { seconds }) => commands::set::duration(&config, seconds)?,
    }

    Ok(())
}
