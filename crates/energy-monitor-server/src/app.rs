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

use anyhow::{Context, Result};
use chrono_tz::Tz;
use energy_monitor_core::constants::NAME;
use energy_monitor_ha::{HaHistoryRecorder, HaStateRegistry, HomeAssistantClient};
use energy_monitor_web::{AppState, start_web_server};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{MonitorConfig, parse_timezone};

const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Connect to Home Assistant and assemble the handler state
pub async fn build_state(config: &MonitorConfig) -> Result<AppState> {
    let ha = &config.home_assistant;
    let client =
        HomeAssistantClient::from_config(ha.base_url.clone(), ha.token.clone(), ha.timeout())
            .context("Failed to create Home Assistant client")?
            .with_retry_config(ha.max_retries, RETRY_DELAY);
    let client = Arc::new(client);

    if !client.ping().await.unwrap_or(false) {
        warn!(
            "Home Assistant at {} is not answering yet, requests will fail until it does",
            client.base_url()
        );
    }

    let fallback_timezone = if config.api.timezone.is_some() {
        Tz::UTC
    } else {
        home_assistant_timezone(&client).await
    };
    let settings = config.api_settings(fallback_timezone)?;
    info!(
        timezone = %settings.timezone,
        filter_policy = %settings.filter_policy,
        require_sensor_namespace = settings.require_sensor_namespace,
        "API settings resolved"
    );

    Ok(AppState {
        registry: Arc::new(HaStateRegistry::new(Arc::clone(&client))),
        recorder: Some(Arc::new(HaHistoryRecorder::new(client))),
        settings: Arc::new(settings),
    })
}

async fn home_assistant_timezone(client: &HomeAssistantClient) -> Tz {
    match client.get_timezone().await {
        Ok(name) => parse_timezone(&name).unwrap_or_else(|e| {
            warn!("{e}, using UTC");
            Tz::UTC
        }),
        Err(e) => {
            warn!("Could not read Home Assistant timezone ({e}), using UTC");
            Tz::UTC
        }
    }
}

/// Build the state and serve until the listener fails
pub async fn run(config: MonitorConfig) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = build_state(&config).await?;

    info!("⚡ {} v{} starting", NAME, env!("CARGO_PKG_VERSION"));
    start_web_server(state, addr)
        .await
        .with_context(|| format!("Web server on {addr} failed"))
}
