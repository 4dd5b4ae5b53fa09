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

use chrono::{DateTime, Utc};
use energy_monitor_core::{EntityState, RecordedState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity state as returned by `/api/states`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<HaEntityState> for EntityState {
    fn from(state: HaEntityState) -> Self {
        Self {
            entity_id: state.entity_id,
            state: state.state,
            attributes: state.attributes,
            last_changed: state.last_changed,
            last_updated: state.last_updated,
        }
    }
}

/// Historical state point from HA history API.
///
/// With `minimal_response` HA only sends `entity_id` and `last_updated`
/// on the first entry of each list, so both are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaHistoryState {
    #[serde(default)]
    pub entity_id: Option<String>,
    pub state: String,
    pub last_changed: DateTime<Utc>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<HaHistoryState> for RecordedState {
    fn from(state: HaHistoryState) -> Self {
        Self {
            state: state.state,
            last_changed: state.last_changed,
            last_updated: state.last_updated.unwrap_or(state.last_changed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn entity_state_parses_ha_timestamps() {
        let state: HaEntityState = serde_json::from_value(json!({
            "entity_id": "sensor.grid_energy",
            "state": "12.5",
            "attributes": {"unit_of_measurement": "kWh"},
            "last_changed": "2025-10-02T10:00:00.123456+00:00",
            "last_updated": "2025-10-02T12:00:00+02:00"
        }))
        .unwrap();

        let state = EntityState::from(state);
        assert_eq!(state.unit_of_measurement(), Some("kWh"));
        assert_eq!(
            state.last_updated,
            Utc.with_ymd_and_hms(2025, 10, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let state: HaEntityState = serde_json::from_value(json!({
            "entity_id": "sensor.x",
            "state": "1",
            "last_changed": "2025-10-02T10:00:00Z",
            "last_updated": "2025-10-02T10:00:00Z"
        }))
        .unwrap();
        assert!(state.attributes.is_empty());
    }

    #[test]
    fn history_state_falls_back_to_last_changed() {
        let state: HaHistoryState = serde_json::from_value(json!({
            "state": "7",
            "last_changed": "2025-10-02T10:00:00Z"
        }))
        .unwrap();

        let recorded = RecordedState::from(state);
        assert_eq!(recorded.last_updated, recorded.last_changed);
    }
}
