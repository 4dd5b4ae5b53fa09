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

//! Home Assistant backed implementations of the registry and recorder traits.

use async_trait::async_trait;
use energy_monitor_core::{
    EntityState, HistoryRecorder, RecordedState, SourceResult, StateRegistry, TimeWindow,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::HomeAssistantClient;
use crate::errors::HaError;

/// Entity registry read through `/api/states`
#[derive(Debug, Clone)]
pub struct HaStateRegistry {
    client: Arc<HomeAssistantClient>,
}

impl HaStateRegistry {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StateRegistry for HaStateRegistry {
    async fn all_states(&self) -> SourceResult<Vec<EntityState>> {
        let states = self.client.get_all_states().await?;
        Ok(states.into_iter().map(EntityState::from).collect())
    }

    async fn get_state(&self, entity_id: &str) -> SourceResult<Option<EntityState>> {
        match self.client.get_state(entity_id).await {
            Ok(state) => Ok(Some(state.into())),
            Err(HaError::EntityNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "Home Assistant"
    }

    async fn is_healthy(&self) -> bool {
        self.client.ping().await.unwrap_or(false)
    }
}

/// Recorder history read through `/api/history/period`
#[derive(Debug, Clone)]
pub struct HaHistoryRecorder {
    client: Arc<HomeAssistantClient>,
}

impl HaHistoryRecorder {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HistoryRecorder for HaHistoryRecorder {
    async fn is_available(&self) -> bool {
        match self.client.has_component("recorder").await {
            Ok(loaded) => {
                if !loaded {
                    warn!("Home Assistant reports no recorder component");
                }
                loaded
            }
            Err(e) => {
                warn!("Could not check recorder availability: {}", e);
                false
            }
        }
    }

    async fn significant_states(
        &self,
        entity_ids: &[String],
        window: &TimeWindow,
    ) -> SourceResult<HashMap<String, Vec<RecordedState>>> {
        let lists = self
            .client
            .get_history(entity_ids, window.start, window.end)
            .await?;

        let mut grouped: HashMap<String, Vec<RecordedState>> = HashMap::new();
        for list in lists {
            // Only the first entry is guaranteed to carry the id
            let Some(entity_id) = list.first().and_then(|first| first.entity_id.clone()) else {
                debug!("Skipping history list without entity id");
                continue;
            };
            grouped
                .entry(entity_id)
                .or_default()
                .extend(list.into_iter().map(RecordedState::from));
        }

        Ok(grouped)
    }

    fn name(&self) -> &str {
        "Home Assistant recorder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use energy_monitor_core::SourceError;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(url: String) -> Arc<HomeAssistantClient> {
        Arc::new(
            HomeAssistantClient::new(url, "test_token")
                .unwrap()
                .with_retry_config(1, Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn unknown_entity_is_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.missing")
            .with_status(404)
            .create_async()
            .await;

        let registry = HaStateRegistry::new(client(server.url()));
        assert!(registry.get_state("sensor.missing").await.unwrap().is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn registry_errors_become_source_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let registry = HaStateRegistry::new(client(server.url()));
        let err = registry.all_states().await.unwrap_err();
        assert!(matches!(err, SourceError::Failed(ref msg) if msg.contains("502")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn recorder_availability_follows_components() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/config")
            .with_status(200)
            .with_body(json!({"components": ["sensor", "history"]}).to_string())
            .create_async()
            .await;

        let recorder = HaHistoryRecorder::new(client(server.url()));
        assert!(!recorder.is_available().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn history_is_grouped_by_entity() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/history/period/2025-10-01T00:00:00Z")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!([
                    [
                        {
                            "entity_id": "sensor.a",
                            "state": "1",
                            "last_changed": "2025-10-01T01:00:00Z"
                        },
                        {"state": "2", "last_changed": "2025-10-01T02:00:00Z"}
                    ],
                    [
                        {
                            "entity_id": "sensor.b",
                            "state": "5",
                            "last_changed": "2025-10-01T03:00:00Z",
                            "last_updated": "2025-10-01T03:30:00Z"
                        }
                    ],
                    []
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let recorder = HaHistoryRecorder::new(client(server.url()));
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
        );
        let history = recorder
            .significant_states(&["sensor.a".to_owned(), "sensor.b".to_owned()], &window)
            .await
            .unwrap();

        assert_eq!(history["sensor.a"].len(), 2);
        assert_eq!(history["sensor.a"][1].state, "2");
        assert_eq!(
            history["sensor.b"][0].last_updated,
            Utc.with_ymd_and_hms(2025, 10, 1, 3, 30, 0).unwrap()
        );
        mock.assert_async().await;
    }
}
