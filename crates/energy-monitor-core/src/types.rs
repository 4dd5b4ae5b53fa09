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
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{ATTR_DEVICE_CLASS, ATTR_FRIENDLY_NAME, ATTR_UNIT_OF_MEASUREMENT};

/// Current state of one entity as held by the state registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl EntityState {
    /// Create a state with both timestamps set to `at` and no attributes
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
            last_changed: at,
            last_updated: at,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// String attribute lookup; non-string values are treated as absent
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attribute_str(ATTR_UNIT_OF_MEASUREMENT)
    }

    pub fn device_class(&self) -> Option<&str> {
        self.attribute_str(ATTR_DEVICE_CLASS)
    }

    /// Display name, falling back to the entity id
    pub fn friendly_name(&self) -> &str {
        self.attribute_str(ATTR_FRIENDLY_NAME)
            .unwrap_or(&self.entity_id)
    }

    /// Attributes minus the ones surfaced as dedicated fields
    pub fn extra_attributes(&self) -> Map<String, Value> {
        self.attributes
            .iter()
            .filter(|(key, _)| {
                !matches!(
                    key.as_str(),
                    ATTR_FRIENDLY_NAME | ATTR_UNIT_OF_MEASUREMENT | ATTR_DEVICE_CLASS
                )
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Request-scoped view of a sensor entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRecord {
    pub entity_id: String,
    pub friendly_name: String,
    pub state: Option<String>,
    pub unit_of_measurement: Option<String>,
    pub device_class: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
}

impl From<&EntityState> for SensorRecord {
    fn from(state: &EntityState) -> Self {
        Self {
            entity_id: state.entity_id.clone(),
            friendly_name: state.friendly_name().to_owned(),
            state: Some(state.state.clone()),
            unit_of_measurement: state.unit_of_measurement().map(ToOwned::to_owned),
            device_class: state.device_class().map(ToOwned::to_owned),
            last_updated: state.last_updated,
            last_changed: state.last_changed,
        }
    }
}

/// Raw state point returned by the recorder, before any filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedState {
    pub state: String,
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl RecordedState {
    pub fn new(state: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            state: state.into(),
            last_changed: at,
            last_updated: at,
        }
    }
}

/// Numeric history point that passed validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySample {
    pub value: f64,
    pub state: String,
    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn friendly_name_falls_back_to_entity_id() {
        let state = EntityState::new("sensor.grid_energy", "12.5", at());
        assert_eq!(state.friendly_name(), "sensor.grid_energy");

        let named = state.with_attribute("friendly_name", "Grid energy");
        assert_eq!(named.friendly_name(), "Grid energy");
    }

    #[test]
    fn non_string_attributes_are_absent() {
        let state =
            EntityState::new("sensor.x", "1", at()).with_attribute("unit_of_measurement", 5);
        assert_eq!(state.unit_of_measurement(), None);
    }

    #[test]
    fn extra_attributes_skip_surfaced_fields() {
        let state = EntityState::new("sensor.x", "1", at())
            .with_attribute("friendly_name", "X")
            .with_attribute("unit_of_measurement", "kWh")
            .with_attribute("device_class", "energy")
            .with_attribute("state_class", "total_increasing")
            .with_attribute("icon", "mdi:flash");

        let extra = state.extra_attributes();
        assert_eq!(extra.len(), 2);
        assert_eq!(extra["state_class"], json!("total_increasing"));
        assert_eq!(extra["icon"], json!("mdi:flash"));
    }

    #[test]
    fn sensor_record_copies_metadata() {
        let state = EntityState::new("sensor.x", "1", at())
            .with_attribute("unit_of_measurement", "kWh")
            .with_attribute("device_class", "energy");
        let record = SensorRecord::from(&state);

        assert_eq!(record.entity_id, "sensor.x");
        assert_eq!(record.friendly_name, "sensor.x");
        assert_eq!(record.state.as_deref(), Some("1"));
        assert_eq!(record.unit_of_measurement.as_deref(), Some("kWh"));
        assert_eq!(record.device_class.as_deref(), Some("energy"));
        assert_eq!(record.last_updated, at());
    }
}
