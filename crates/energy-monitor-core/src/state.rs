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
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::SENSOR_DOMAIN_PREFIX;
use crate::error::{MonitorError, MonitorResult};
use crate::settings::ApiSettings;
use crate::traits::StateRegistry;
use crate::types::SensorRecord;
use crate::validation::is_valid_state;

/// Current value and metadata of one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateLookup {
    #[serde(flatten)]
    pub record: SensorRecord,
    pub is_valid: bool,
    /// Remaining attributes, without the ones surfaced in `record`
    pub attributes: Map<String, Value>,
}

/// Reject missing ids and, when configured, ids outside the sensor domain
pub(crate) fn check_entity_id<'a>(
    entity_id: Option<&'a str>,
    settings: &ApiSettings,
) -> MonitorResult<&'a str> {
    let entity_id = entity_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(MonitorError::MissingParameter("entity_id"))?;

    if settings.require_sensor_namespace && !entity_id.starts_with(SENSOR_DOMAIN_PREFIX) {
        return Err(MonitorError::InvalidParameter(format!(
            "Entity {entity_id} is not a sensor (expected '{SENSOR_DOMAIN_PREFIX}' prefix)"
        )));
    }

    Ok(entity_id)
}

pub async fn lookup_state(
    registry: &dyn StateRegistry,
    entity_id: Option<&str>,
    settings: &ApiSettings,
) -> MonitorResult<StateLookup> {
    let entity_id = check_entity_id(entity_id, settings)?;

    let state = registry
        .get_state(entity_id)
        .await?
        .ok_or_else(|| MonitorError::EntityNotFound(entity_id.to_owned()))?;

    let is_valid = is_valid_state(&state.state);
    debug!(entity_id = %entity_id, state = %state.state, is_valid, "State lookup");

    Ok(StateLookup {
        record: SensorRecord::from(&state),
        is_valid,
        attributes: state.extra_attributes(),
    })
}
