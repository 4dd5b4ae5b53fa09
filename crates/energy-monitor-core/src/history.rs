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
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MonitorError, MonitorResult};
use crate::settings::ApiSettings;
use crate::state::check_entity_id;
use crate::statistics::Statistics;
use crate::traits::{HistoryRecorder, SourceError, StateRegistry};
use crate::types::{HistorySample, RecordedState};
use crate::validation::{is_valid_state, parse_numeric_state};
use crate::window::TimeWindow;

/// Raw history query, before any validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryRequest {
    pub entity_ids: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: Option<String>,
}

impl HistoryRequest {
    /// Split a comma separated id list, trimming, dropping blanks and
    /// collapsing duplicates while keeping first-seen order
    pub fn parse_entity_ids(raw: Option<&str>) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in raw.unwrap_or_default().split(',').map(str::trim) {
            if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_owned());
            }
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityHistory {
    pub entity_id: String,
    pub data_points: usize,
    pub history: Vec<HistorySample>,
    pub statistics: Statistics,
}

impl EntityHistory {
    fn from_recorded(entity_id: String, recorded: &[RecordedState]) -> Self {
        let history: Vec<HistorySample> = recorded
            .iter()
            .filter(|state| is_valid_state(&state.state))
            .filter_map(|state| {
                Some(HistorySample {
                    value: parse_numeric_state(&state.state)?,
                    state: state.state.clone(),
                    last_changed: state.last_changed,
                    last_updated: state.last_updated,
                })
            })
            .collect();

        let dropped = recorded.len() - history.len();
        if dropped > 0 {
            debug!(entity_id = %entity_id, dropped, "Skipped non-numeric history states");
        }

        Self {
            statistics: Statistics::from_samples(&history),
            data_points: history.len(),
            entity_id,
            history,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Sum over all entities
    pub data_points: usize,
    pub entities: Vec<EntityHistory>,
}

impl HistoryReport {
    /// The only entity of a single-id query
    pub fn single(&self) -> Option<&EntityHistory> {
        match self.entities.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Validate the request, query the recorder and summarise each entity.
///
/// Checks run in a fixed order and the first failure is returned:
/// ids present, sensor namespace, ids known to the registry, window,
/// recorder availability.
pub async fn fetch_history(
    registry: &dyn StateRegistry,
    recorder: Option<&dyn HistoryRecorder>,
    request: &HistoryRequest,
    settings: &ApiSettings,
    now: DateTime<Utc>,
) -> MonitorResult<HistoryReport> {
    if request.entity_ids.is_empty() {
        return Err(MonitorError::MissingParameter("entity_id"));
    }

    for entity_id in &request.entity_ids {
        check_entity_id(Some(entity_id.as_str()), settings)?;
    }

    for entity_id in &request.entity_ids {
        if registry.get_state(entity_id).await?.is_none() {
            return Err(MonitorError::EntityNotFound(entity_id.clone()));
        }
    }

    let window = TimeWindow::resolve(
        request.start.as_deref(),
        request.end.as_deref(),
        request.days.as_deref(),
        settings,
        now,
    )?;

    let recorder = match recorder {
        Some(recorder) if recorder.is_available().await => recorder,
        _ => {
            warn!("History requested but the recorder is not available");
            return Err(SourceError::Unavailable("Recorder".to_owned()).into());
        }
    };

    info!(
        "Fetching history for {} entities from {} to {} ({})",
        request.entity_ids.len(),
        window.start.to_rfc3339(),
        window.end.to_rfc3339(),
        recorder.name()
    );

    let mut recorded = recorder
        .significant_states(&request.entity_ids, &window)
        .await?;

    let entities: Vec<EntityHistory> = request
        .entity_ids
        .iter()
        .map(|entity_id| {
            let states = recorded.remove(entity_id).unwrap_or_default();
            EntityHistory::from_recorded(entity_id.clone(), &states)
        })
        .collect();

    Ok(HistoryReport {
        start_time: window.start,
        end_time: window.end,
        data_points: entities.iter().map(|entity| entity.data_points).sum(),
        entities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryRecorder, InMemoryRegistry};
    use crate::types::EntityState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 16, 12, 0, 0).unwrap()
    }

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::with_states([
            EntityState::new("sensor.house_energy", "130", now()),
            EntityState::new("sensor.grid_power", "1500", now()),
            EntityState::new("switch.boiler", "on", now()),
        ])
    }

    fn recorder() -> InMemoryRecorder {
        let recorder = InMemoryRecorder::new();
        let states = [
            (30, "100"),
            (20, "unavailable"),
            (10, "abc"),
            (5, "112.5"),
            (1, "130"),
        ];
        for (hours_ago, state) in states {
            recorder.record(
                "sensor.house_energy",
                RecordedState::new(state, now() - Duration::hours(hours_ago)),
            );
        }
        recorder
    }

    fn request(ids: &str) -> HistoryRequest {
        HistoryRequest {
            entity_ids: HistoryRequest::parse_entity_ids(Some(ids)),
            ..HistoryRequest::default()
        }
    }

    #[test]
    fn entity_ids_are_trimmed_and_deduplicated() {
        let ids = HistoryRequest::parse_entity_ids(Some(" sensor.a, ,sensor.b,sensor.a ,"));
        assert_eq!(ids, ["sensor.a", "sensor.b"]);
        assert!(HistoryRequest::parse_entity_ids(None).is_empty());
        assert!(HistoryRequest::parse_entity_ids(Some(" , ")).is_empty());
    }

    #[tokio::test]
    async fn filters_non_numeric_and_computes_statistics() {
        let recorder = recorder();
        let report = fetch_history(
            &registry(),
            Some(&recorder),
            &request("sensor.house_energy"),
            &ApiSettings::default(),
            now(),
        )
        .await
        .unwrap();

        assert_eq!(report.start_time, now() - Duration::days(7));
        assert_eq!(report.end_time, now());
        assert_eq!(report.data_points, 3);

        let entity = report.single().unwrap();
        let values: Vec<f64> = entity.history.iter().map(|s| s.value).collect();
        assert_eq!(values, [100.0, 112.5, 130.0]);
        assert_eq!(entity.statistics.min, Some(100.0));
        assert_eq!(entity.statistics.max, Some(130.0));
        assert_eq!(entity.statistics.total_consumption, Some(30.0));
        assert_eq!(entity.statistics.valid_points, 3);
    }

    #[tokio::test]
    async fn entities_keep_request_order_and_empty_history() {
        let recorder = recorder();
        let report = fetch_history(
            &registry(),
            Some(&recorder),
            &request("sensor.grid_power,sensor.house_energy"),
            &ApiSettings::default(),
            now(),
        )
        .await
        .unwrap();

        assert!(report.single().is_none());
        assert_eq!(report.entities[0].entity_id, "sensor.grid_power");
        assert_eq!(report.entities[0].data_points, 0);
        assert_eq!(report.entities[0].statistics, Statistics::empty());
        assert_eq!(report.entities[1].data_points, 3);
        assert_eq!(report.data_points, 3);
    }

    #[tokio::test]
    async fn window_excludes_older_samples() {
        let recorder = recorder();
        let report = fetch_history(
            &registry(),
            Some(&recorder),
            &HistoryRequest {
                days: Some("1".to_owned()),
                ..request("sensor.house_energy")
            },
            &ApiSettings::default(),
            now(),
        )
        .await
        .unwrap();

        let entity = report.single().unwrap();
        assert_eq!(entity.data_points, 2);
        assert_eq!(entity.statistics.total_consumption, Some(17.5));
    }

    #[tokio::test]
    async fn validation_runs_in_order() {
        let settings = ApiSettings::default();
        let registry = registry();
        let recorder = recorder();

        // Missing ids beat everything else
        let err = fetch_history(&registry, None, &request(""), &settings, now())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::MissingParameter(_)));

        // Namespace before existence
        let err = fetch_history(
            &registry,
            Some(&recorder),
            &request("sensor.missing,switch.boiler"),
            &settings,
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MonitorError::InvalidParameter(_)));

        // Existence before days
        let err = fetch_history(
            &registry,
            Some(&recorder),
            &HistoryRequest {
                days: Some("0".to_owned()),
                ..request("sensor.missing")
            },
            &settings,
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MonitorError::EntityNotFound(ref id) if id == "sensor.missing"));

        // Days before recorder availability
        let err = fetch_history(
            &registry,
            None,
            &HistoryRequest {
                days: Some("91".to_owned()),
                ..request("sensor.house_energy")
            },
            &settings,
            now(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "days must be between 1 and 90");
    }

    #[tokio::test]
    async fn missing_or_stopped_recorder_is_unavailable() {
        let settings = ApiSettings::default();
        let query = request("sensor.house_energy");
        let err = fetch_history(&registry(), None, &query, &settings, now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Recorder is not available");

        let recorder = recorder();
        recorder.set_available(false);
        let err = fetch_history(&registry(), Some(&recorder), &query, &settings, now())
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Source(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn explicit_range_is_used() {
        let recorder = recorder();
        let report = fetch_history(
            &registry(),
            Some(&recorder),
            &HistoryRequest {
                start: Some("2025-10-15T00:00:00Z".to_owned()),
                end: Some("2025-10-16T08:00:00Z".to_owned()),
                ..request("sensor.house_energy")
            },
            &ApiSettings::default(),
            now(),
        )
        .await
        .unwrap();

        // 2025-10-15T06:00 and 2025-10-16T07:00
        let entity = report.single().unwrap();
        let values: Vec<f64> = entity.history.iter().map(|s| s.value).collect();
        assert_eq!(values, [100.0, 112.5]);
    }
}
