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

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_DAYS_HISTORY, EXTENDED_UNITS, LEGACY_UNITS, MAX_DAYS_HISTORY};

/// Which unit list decides whether an entity counts as an energy sensor.
///
/// Both lists match units exactly (case-sensitive). The device class and
/// entity id rules are identical in both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPolicy {
    /// kWh, Wh, MWh, GWh, W, kW, MW, GW
    #[default]
    Extended,
    /// kWh, W, Wh, MWh
    Legacy,
}

impl FilterPolicy {
    pub fn units(self) -> &'static [&'static str] {
        match self {
            Self::Extended => &EXTENDED_UNITS,
            Self::Legacy => &LEGACY_UNITS,
        }
    }

    pub fn accepts_unit(self, unit: &str) -> bool {
        self.units().contains(&unit)
    }

    pub fn to_config_value(self) -> &'static str {
        match self {
            Self::Extended => "extended",
            Self::Legacy => "legacy",
        }
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_config_value())
    }
}

impl FromStr for FilterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extended" => Ok(Self::Extended),
            "legacy" => Ok(Self::Legacy),
            _ => Err(format!(
                "Unknown filter policy: '{s}'. Supported policies: extended, legacy"
            )),
        }
    }
}

/// Request handling knobs shared by every endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Reject state/history lookups for ids outside the sensor domain
    pub require_sensor_namespace: bool,
    /// Window length used when no explicit start is given
    pub default_days: u32,
    pub max_days: u32,
    /// Zone used for timestamps given without an offset
    pub timezone: Tz,
    pub filter_policy: FilterPolicy,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            require_sensor_namespace: true,
            default_days: DEFAULT_DAYS_HISTORY,
            max_days: MAX_DAYS_HISTORY,
            timezone: Tz::UTC,
            filter_policy: FilterPolicy::default(),
        }
    }
}
