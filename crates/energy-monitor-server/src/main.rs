// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Energy Monitor.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use energy_monitor_server::{MonitorConfig, app};

const DEFAULT_CONFIG_PATH: &str = "energy_monitor.toml";

#[derive(Parser)]
#[command(name = "energy-monitor")]
#[command(
    about = "Energy sensor listing, state and history API backed by Home Assistant",
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(value_name = "CONFIG")]
    path: Option<PathBuf>,

    /// Same as the positional argument
    #[arg(short, long, conflicts_with = "path")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("energy_monitor=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .path
        .or(cli.config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = MonitorConfig::load(&config_path)?;
    app::run(config).await
}
