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

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::constants::{EXCLUDED_ID_FRAGMENTS, INVALID_STATES, VALID_DEVICE_CLASSES};
use crate::error::{MonitorError, MonitorResult};
use crate::settings::FilterPolicy;
use crate::traits::StateRegistry;
use crate::types::EntityState;

/// Verdict of the energy sensor check together with the rule that decided it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_energy_sensor: bool,
    pub reason: String,
}

impl Classification {
    fn accept(reason: impl Into<String>) -> Self {
        Self {
            is_energy_sensor: true,
            reason: reason.into(),
        }
    }

    fn reject(reason: impl Into<String>) -> Self {
        Self {
            is_energy_sensor: false,
            reason: reason.into(),
        }
    }
}

/// Decide whether an entity counts as an energy or power sensor.
///
/// Rules in order: tariff ids (`_cost`, `_price`) are rejected, then a known
/// device class, a unit from the policy's list, or an id mentioning "energy"
/// but not "power" accepts the entity.
pub fn classify_energy_sensor(
    entity_id: &str,
    state: Option<&EntityState>,
    policy: FilterPolicy,
) -> Classification {
    let Some(state) = state else {
        return Classification::reject("Entity not found");
    };

    if EXCLUDED_ID_FRAGMENTS
        .iter()
        .any(|fragment| entity_id.contains(fragment))
    {
        return Classification::reject("Cost/price sensor (excluded)");
    }

    let device_class = state.device_class();
    let unit = state.unit_of_measurement();

    if let Some(class) = device_class.filter(|class| VALID_DEVICE_CLASSES.contains(class)) {
        return Classification::accept(format!("Valid device_class: {class}"));
    }

    if let Some(unit) = unit.filter(|unit| policy.accepts_unit(unit)) {
        return Classification::accept(format!("Valid unit: {unit}"));
    }

    if entity_id.contains("energy") && !entity_id.contains("power") {
        return Classification::accept("Entity ID contains 'energy'");
    }

    Classification::reject(format!(
        "Not an energy sensor (device_class={}, unit={})",
        device_class.unwrap_or("None"),
        unit.unwrap_or("None")
    ))
}

/// False for empty states and the sentinel tokens, case-insensitively
pub fn is_valid_state(state: &str) -> bool {
    !INVALID_STATES.contains(&state.to_lowercase().as_str())
}

/// Stricter check used for history samples: valid and a finite number
pub fn is_numeric_state(state: &str) -> bool {
    parse_numeric_state(state).is_some()
}

pub(crate) fn parse_numeric_state(state: &str) -> Option<f64> {
    if !is_valid_state(state) {
        return None;
    }
    state
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Per-entity report of the validate endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorValidation {
    pub exists: bool,
    pub is_energy_sensor: bool,
    pub validation_reason: String,
    pub state: Option<String>,
    pub state_valid: bool,
    pub unit: Option<String>,
    pub device_class: Option<String>,
}

/// Classify each requested entity against the live registry
pub async fn validate_sensors(
    registry: &dyn StateRegistry,
    entity_ids: &[String],
    policy: FilterPolicy,
) -> MonitorResult<BTreeMap<String, SensorValidation>> {
    if entity_ids.is_empty() {
        return Err(MonitorError::MissingParameter("entity_id"));
    }

    let mut results = BTreeMap::new();
    for entity_id in entity_ids {
        let state = registry.get_state(entity_id).await?;
        let classification = classify_energy_sensor(entity_id, state.as_ref(), policy);

        let validation = SensorValidation {
            exists: state.is_some(),
            is_energy_sensor: classification.is_energy_sensor,
            validation_reason: classification.reason,
            state: state.as_ref().map(|s| s.state.clone()),
            state_valid: state.as_ref().is_some_and(|s| is_numeric_state(&s.state)),
            unit: state
                .as_ref()
                .and_then(EntityState::unit_of_measurement)
                .map(ToOwned::to_owned),
            device_class: state
                .as_ref()
                .and_then(EntityState::device_class)
                .map(ToOwned::to_owned),
        };
        debug!(
            entity_id = %entity_id,
            exists = validation.exists,
            is_energy_sensor = validation.is_energy_sensor,
            "Validated sensor"
        );
        results.insert(entity_id.clone(), validation);
    }

    Ok(results)
}
