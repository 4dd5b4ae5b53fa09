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
use tracing::debug;

use crate::constants::SENSOR_DOMAIN_PREFIX;
use crate::error::MonitorResult;
use crate::settings::FilterPolicy;
use crate::traits::StateRegistry;
use crate::types::SensorRecord;
use crate::validation::{classify_energy_sensor, is_numeric_state};

/// Entry of the entities listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySensor {
    #[serde(flatten)]
    pub record: SensorRecord,
    pub validation_reason: String,
    pub state_valid: bool,
}

/// All sensor-domain entities that pass the energy sensor check, ordered by id
pub async fn list_energy_sensors(
    registry: &dyn StateRegistry,
    policy: FilterPolicy,
) -> MonitorResult<Vec<EnergySensor>> {
    let states = registry.all_states().await?;
    let scanned = states.len();

    let mut sensors: Vec<EnergySensor> = states
        .iter()
        .filter(|state| state.entity_id.starts_with(SENSOR_DOMAIN_PREFIX))
        .filter_map(|state| {
            let classification = classify_energy_sensor(&state.entity_id, Some(state), policy);
            classification.is_energy_sensor.then(|| EnergySensor {
                record: SensorRecord::from(state),
                validation_reason: classification.reason,
                state_valid: is_numeric_state(&state.state),
            })
        })
        .collect();
    sensors.sort_by(|a, b| a.record.entity_id.cmp(&b.record.entity_id));

    debug!(
        "Found {} energy/power sensors among {} entities (policy: {})",
        sensors.len(),
        scanned,
        policy
    );
    Ok(sensors)
}
