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

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use energy_monitor_core::constants::{DEFAULT_DAYS_HISTORY, MAX_DAYS_HISTORY};
use energy_monitor_core::{ApiSettings, FilterPolicy};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub home_assistant: HomeAssistantSettings,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Connection to Home Assistant. Unset values fall back to the Supervisor
/// or `HA_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeAssistantSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_require_sensor_namespace")]
    pub require_sensor_namespace: bool,
    #[serde(default = "default_days")]
    pub default_days: u32,
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    /// IANA zone name; Home Assistant's zone is used when unset
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub policy: FilterPolicy,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8099
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_require_sensor_namespace() -> bool {
    true
}

fn default_days() -> u32 {
    DEFAULT_DAYS_HISTORY
}

fn default_max_days() -> u32 {
    MAX_DAYS_HISTORY
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for HomeAssistantSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            require_sensor_namespace: default_require_sensor_namespace(),
            default_days: default_days(),
            max_days: default_max_days(),
            timezone: None,
        }
    }
}

impl HomeAssistantSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MonitorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Self::from_file`], but a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!(path = %path.display(), "Loading configuration");
            Self::from_file(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.server.bind_address.trim().is_empty() {
            bail!("server.bind_address must be set");
        }
        if self.home_assistant.timeout_secs == 0 {
            bail!("home_assistant.timeout_secs must be at least 1");
        }
        if self.api.max_days == 0 {
            bail!("api.max_days must be at least 1");
        }
        if !(1..=self.api.max_days).contains(&self.api.default_days) {
            bail!(
                "api.default_days must be between 1 and {} (got {})",
                self.api.max_days,
                self.api.default_days
            );
        }
        if let Some(timezone) = &self.api.timezone {
            parse_timezone(timezone)?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.bind_address, self.server.port);
        addr.parse()
            .with_context(|| format!("Invalid listen address: {addr}"))
    }

    /// Request settings, using `fallback_timezone` when none is configured
    pub fn api_settings(&self, fallback_timezone: Tz) -> Result<ApiSettings> {
        let timezone = match &self.api.timezone {
            Some(name) => parse_timezone(name)?,
            None => fallback_timezone,
        };

        Ok(ApiSettings {
            require_sensor_namespace: self.api.require_sensor_namespace,
            default_days: self.api.default_days,
            max_days: self.api.max_days,
            timezone,
            filter_policy: self.filter.policy,
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unknown timezone '{name}': {e}"))
}
