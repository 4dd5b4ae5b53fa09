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

//! JSON handlers of the `/api/energy_monitor` routes.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Utc;
use energy_monitor_core::{
    EnergySensor, HistoryReport, HistoryRequest, HistorySample, SensorValidation, StateLookup,
    Statistics, fetch_history, list_energy_sensors, lookup_state, validate_sensors,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::AppState;
use crate::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityQuery {
    pub entity_id: Option<String>,
}

/// History query; `start_time`/`end_time` are accepted as aliases
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub entity_id: Option<String>,
    pub start: Option<String>,
    pub start_time: Option<String>,
    pub end: Option<String>,
    pub end_time: Option<String>,
    pub days: Option<String>,
}

impl From<HistoryQuery> for HistoryRequest {
    fn from(query: HistoryQuery) -> Self {
        Self {
            entity_ids: HistoryRequest::parse_entity_ids(query.entity_id.as_deref()),
            start: query.start.or(query.start_time),
            end: query.end.or(query.end_time),
            days: query.days,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub success: bool,
    pub count: usize,
    pub entities: Vec<EnergySensor>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub lookup: StateLookup,
}

/// History of all requested entities. Single-entity requests also get that
/// entity's `entity_id`, `history` and `statistics` at the top level.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistorySample>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(flatten)]
    pub report: HistoryReport,
}

impl From<HistoryReport> for HistoryResponse {
    fn from(report: HistoryReport) -> Self {
        let single = report.single();
        Self {
            success: true,
            entity_id: single.map(|entity| entity.entity_id.clone()),
            history: single.map(|entity| entity.history.clone()),
            statistics: single.map(|entity| entity.statistics),
            report,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub results: BTreeMap<String, SensorValidation>,
}

/// GET /api/energy_monitor/entities
pub async fn entities_handler(State(state): State<AppState>) -> ApiResult<EntitiesResponse> {
    let entities =
        list_energy_sensors(state.registry.as_ref(), state.settings.filter_policy).await?;
    info!("Returning {} energy sensors", entities.len());

    Ok(Json(EntitiesResponse {
        success: true,
        count: entities.len(),
        entities,
    }))
}

/// GET /api/energy_monitor/state?entity_id=...
pub async fn state_handler(
    State(state): State<AppState>,
    params: Result<Query<EntityQuery>, QueryRejection>,
) -> ApiResult<StateResponse> {
    let params = query(params)?;
    let lookup = lookup_state(
        state.registry.as_ref(),
        params.entity_id.as_deref(),
        &state.settings,
    )
    .await?;

    Ok(Json(StateResponse {
        success: true,
        lookup,
    }))
}

/// GET /api/energy_monitor/history?entity_id=...&days=...
pub async fn history_handler(
    State(state): State<AppState>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<HistoryResponse> {
    let request = HistoryRequest::from(query(params)?);
    let report = fetch_history(
        state.registry.as_ref(),
        state.recorder.as_deref(),
        &request,
        &state.settings,
        Utc::now(),
    )
    .await?;

    Ok(Json(report.into()))
}

/// GET /api/energy_monitor/validate?entity_id=a,b
pub async fn validate_handler(
    State(state): State<AppState>,
    params: Result<Query<EntityQuery>, QueryRejection>,
) -> ApiResult<ValidateResponse> {
    let params = query(params)?;
    let entity_ids = HistoryRequest::parse_entity_ids(params.entity_id.as_deref());
    let results = validate_sensors(
        state.registry.as_ref(),
        &entity_ids,
        state.settings.filter_policy,
    )
    .await?;

    Ok(Json(ValidateResponse {
        success: true,
        results,
    }))
}
