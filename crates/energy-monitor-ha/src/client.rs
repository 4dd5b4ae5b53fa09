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

use crate::errors::{HaError, HaResult};
use crate::types::{HaEntityState, HaHistoryState};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const SUPERVISOR_BASE_URL: &str = "http://supervisor/core";
const DEFAULT_BASE_URL: &str = "http://localhost:8123";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Home Assistant REST API client
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Create a new HA client with the default request timeout
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        Self::new_with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn new_with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Create HA client from configuration values.
    ///
    /// A configured token wins. Without one, the Supervisor token is tried
    /// first (talking to `http://supervisor/core`), then `HA_TOKEN` with
    /// `HA_BASE_URL`.
    pub fn from_config(
        ha_base_url: Option<String>,
        ha_token: Option<String>,
        timeout: Duration,
    ) -> HaResult<Self> {
        let (base_url, token) =
            resolve_connection(ha_base_url, ha_token, |key| std::env::var(key).ok())?;

        info!("Initializing HA client from configuration: {}", base_url);
        Self::new_with_timeout(base_url, token, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the state of a specific entity
    pub async fn get_state(&self, entity_id: &str) -> HaResult<HaEntityState> {
        let url = format!(
            "{}/api/states/{}",
            self.base_url,
            urlencoding::encode(entity_id)
        );
        debug!("🔍 [HA QUERY] Getting state for entity: {}", entity_id);
        trace!("   URL: {}", url);

        let response = self.get(&url).await?;

        match response.status() {
            StatusCode::OK => {
                let state = response.json::<HaEntityState>().await?;
                debug!("✅ [HA RESULT] Entity: {} = '{}'", entity_id, state.state);
                trace!("   Attributes: {:?}", state.attributes);
                Ok(state)
            }
            StatusCode::NOT_FOUND => {
                debug!("[HA RESULT] Entity not found: {}", entity_id);
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            status => Err(Self::status_error(status, response).await),
        }
    }

    /// Get all states known to Home Assistant
    pub async fn get_all_states(&self) -> HaResult<Vec<HaEntityState>> {
        let url = format!("{}/api/states", self.base_url);
        debug!("Fetching all entity states");

        let response = self.get(&url).await?;

        match response.status() {
            StatusCode::OK => {
                let states = response.json::<Vec<HaEntityState>>().await?;
                debug!("✅ [HA RESULT] Retrieved {} entity states", states.len());
                Ok(states)
            }
            status => Err(Self::status_error(status, response).await),
        }
    }

    /// Health check - ping HA API
    pub async fn ping(&self) -> HaResult<bool> {
        let url = format!("{}/api/", self.base_url);
        debug!("Performing health check");

        match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) => {
                let is_ok = response.status().is_success();
                if is_ok {
                    debug!("Health check passed");
                } else {
                    warn!("Health check failed: status {}", response.status());
                }
                Ok(is_ok)
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false) // Don't error on health check failure
            }
        }
    }

    /// Get Home Assistant configuration (timezone, loaded components, ...)
    pub async fn get_config(&self) -> HaResult<Value> {
        let url = format!("{}/api/config", self.base_url);
        debug!("Fetching Home Assistant configuration");

        let response = self.get(&url).await?;

        match response.status() {
            StatusCode::OK => {
                let config = response.json::<Value>().await?;
                debug!("✅ Retrieved HA configuration");
                Ok(config)
            }
            status => Err(Self::status_error(status, response).await),
        }
    }

    /// Get Home Assistant timezone
    pub async fn get_timezone(&self) -> HaResult<String> {
        let config = self.get_config().await?;

        config
            .get("time_zone")
            .and_then(Value::as_str)
            .map(|tz| {
                info!("🌍 Home Assistant timezone: {}", tz);
                tz.to_owned()
            })
            .ok_or_else(|| HaError::ConfigError("Timezone not found in HA config".to_owned()))
    }

    /// Whether the given integration is loaded, according to `/api/config`
    pub async fn has_component(&self, component: &str) -> HaResult<bool> {
        let config = self.get_config().await?;
        let components = config
            .get("components")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HaError::InvalidResponse("components missing from HA config".to_owned())
            })?;

        Ok(components
            .iter()
            .any(|loaded| loaded.as_str() == Some(component)))
    }

    /// Get recorded state changes for several entities.
    ///
    /// HA answers with one list per entity that has history in the range;
    /// entities without any recorded change are left out.
    pub async fn get_history(
        &self,
        entity_ids: &[String],
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> HaResult<Vec<Vec<HaHistoryState>>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }

        let start_str = start_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_str = end_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let filter = entity_ids.join(",");

        let url = format!(
            "{}/api/history/period/{}?filter_entity_id={}&end_time={}&no_attributes",
            self.base_url,
            start_str,
            urlencoding::encode(&filter),
            urlencoding::encode(&end_str)
        );

        debug!("📊 [HA HISTORY] Fetching history for: {}", filter);
        debug!("   Time range: {} to {}", start_str, end_str);
        trace!("   URL: {}", url);

        let response = self.get(&url).await?;

        match response.status() {
            StatusCode::OK => {
                let history: Vec<Vec<HaHistoryState>> = response.json().await?;
                info!(
                    "✅ [HA HISTORY] Retrieved {} states for {} of {} entities",
                    history.iter().map(Vec::len).sum::<usize>(),
                    history.len(),
                    entity_ids.len()
                );
                Ok(history)
            }
            StatusCode::NOT_FOUND => {
                error!("❌ [HA HISTORY] History API not found, is the recorder loaded?");
                Err(HaError::ApiError {
                    status: StatusCode::NOT_FOUND.as_u16(),
                    message: "history endpoint not available".to_owned(),
                })
            }
            status => Err(Self::status_error(status, response).await),
        }
    }

    /// Set custom retry configuration
    #[must_use]
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    async fn get(&self, url: &str) -> HaResult<Response> {
        self.retry_request(|| async { self.client.get(url).bearer_auth(&self.token).send().await })
            .await
    }

    async fn status_error(status: StatusCode, response: Response) -> HaError {
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            error!("❌ [HA ERROR] Authentication failed (status {})", status);
            return HaError::AuthenticationFailed;
        }

        let message = response.text().await.unwrap_or_default();
        error!("❌ [HA ERROR] Status {}: {}", status, message);
        HaError::ApiError {
            status: status.as_u16(),
            message,
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> HaResult<Response>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Request failed after {} attempts: {}", attempts, e);
                    return Err(if e.is_timeout() {
                        HaError::Timeout
                    } else {
                        HaError::HttpError(e)
                    });
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2; // Exponential backoff
                }
            }
        }
    }
}

/// Pick base URL and token from configuration, falling back to the
/// environment lookup `env`
fn resolve_connection(
    ha_base_url: Option<String>,
    ha_token: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> HaResult<(String, String)> {
    if ha_token.is_none()
        && let Some(token) = env("SUPERVISOR_TOKEN")
    {
        info!("No HA token configured, using Supervisor API");
        let base_url = ha_base_url.unwrap_or_else(|| SUPERVISOR_BASE_URL.to_owned());
        return Ok((base_url, token));
    }

    let token = ha_token.or_else(|| env("HA_TOKEN")).ok_or_else(|| {
        HaError::ConfigError(
            "HA token not found in config, SUPERVISOR_TOKEN or HA_TOKEN".to_owned(),
        )
    })?;
    let base_url = ha_base_url
        .or_else(|| env("HA_BASE_URL"))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
    Ok((base_url, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn state_body(entity_id: &str, state: &str) -> String {
        json!({
            "entity_id": entity_id,
            "state": state,
            "attributes": {"unit_of_measurement": "kWh"},
            "last_changed": "2025-10-02T10:00:00Z",
            "last_updated": "2025-10-02T10:00:00Z"
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_get_state_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.test_entity")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(state_body("sensor.test_entity", "42.5"))
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let state = client.get_state("sensor.test_entity").await.unwrap();

        assert_eq!(state.entity_id, "sensor.test_entity");
        assert_eq!(state.state, "42.5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.nonexistent")
            .match_header("authorization", "Bearer test_token")
            .with_status(404)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_state("sensor.nonexistent").await;

        assert!(matches!(result, Err(HaError::EntityNotFound(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states")
            .with_status(401)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "bad_token").unwrap();
        let result = client.get_all_states().await;

        assert!(matches!(result, Err(HaError::AuthenticationFailed)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_states() {
        let mut server = Server::new_async().await;
        let body = format!(
            "[{},{}]",
            state_body("sensor.a_energy", "1"),
            state_body("sensor.b_energy", "2")
        );
        let mock = server
            .mock("GET", "/api/states")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let states = client.get_all_states().await.unwrap();

        assert_eq!(states.len(), 2);
        assert_eq!(states[1].entity_id, "sensor.b_energy");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/config")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_config().await;

        assert!(matches!(
            result,
            Err(HaError::ApiError { status: 500, ref message }) if message == "internal"
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_timezone_and_components() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/config")
            .with_status(200)
            .with_body(
                json!({
                    "time_zone": "Europe/Prague",
                    "components": ["history", "recorder", "sensor"]
                })
                .to_string(),
            )
            .expect(3)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        assert_eq!(client.get_timezone().await.unwrap(), "Europe/Prague");
        assert!(client.has_component("recorder").await.unwrap());
        assert!(!client.has_component("energy").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_history() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/history/period/2025-10-01T00:00:00Z")
            .match_header("authorization", "Bearer test_token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "filter_entity_id".into(),
                    "sensor.a_energy,sensor.b_energy".into(),
                ),
                Matcher::UrlEncoded("end_time".into(), "2025-10-02T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([[
                    {
                        "entity_id": "sensor.a_energy",
                        "state": "1.5",
                        "last_changed": "2025-10-01T01:00:00+00:00",
                        "last_updated": "2025-10-01T01:00:00+00:00"
                    },
                    {
                        "entity_id": "sensor.a_energy",
                        "state": "2.5",
                        "last_changed": "2025-10-01T02:00:00+00:00",
                        "last_updated": "2025-10-01T02:00:00+00:00"
                    }
                ]])
                .to_string(),
            )
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let history = client
            .get_history(
                &["sensor.a_energy".to_owned(), "sensor.b_energy".to_owned()],
                Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].len(), 2);
        assert_eq!(history[0][1].state, "2.5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_history_without_ids_skips_request() {
        let client = HomeAssistantClient::new("http://127.0.0.1:9", "token").unwrap();
        let now = Utc::now();
        assert!(client.get_history(&[], now, now).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ping_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.ping().await.unwrap();

        assert!(result);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        let client = HomeAssistantClient::new("http://127.0.0.1:9", "token")
            .unwrap()
            .with_retry_config(1, Duration::from_millis(1));
        assert!(!client.ping().await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_error_after_retries() {
        let client = HomeAssistantClient::new("http://127.0.0.1:9", "token")
            .unwrap()
            .with_retry_config(2, Duration::from_millis(1));
        let result = client.get_all_states().await;
        assert!(matches!(result, Err(HaError::HttpError(_) | HaError::Timeout)));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = HomeAssistantClient::new("http://ha.local/", "secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(client.base_url(), "http://ha.local");
    }

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_configured_token_wins() {
        let env = env_of(&[("SUPERVISOR_TOKEN", "sup"), ("HA_BASE_URL", "http://env:8123")]);
        let (url, token) = resolve_connection(None, Some("cfg".to_owned()), env).unwrap();
        assert_eq!(url, "http://env:8123");
        assert_eq!(token, "cfg");

        let (url, _) = resolve_connection(
            Some("http://ha.local".to_owned()),
            Some("cfg".to_owned()),
            env_of(&[]),
        )
        .unwrap();
        assert_eq!(url, "http://ha.local");
    }

    #[test]
    fn test_supervisor_token_uses_supervisor_url() {
        let env = env_of(&[("SUPERVISOR_TOKEN", "sup"), ("HA_TOKEN", "dev")]);
        let (url, token) = resolve_connection(None, None, env).unwrap();
        assert_eq!(url, SUPERVISOR_BASE_URL);
        assert_eq!(token, "sup");
    }

    #[test]
    fn test_dev_token_falls_back_to_default_url() {
        let (url, token) = resolve_connection(None, None, env_of(&[("HA_TOKEN", "dev")])).unwrap();
        assert_eq!(url, DEFAULT_BASE_URL);
        assert_eq!(token, "dev");
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let result = resolve_connection(None, None, env_of(&[("HA_BASE_URL", "http://env")]));
        assert!(matches!(result, Err(HaError::ConfigError(_))));
    }

    #[test]
    fn test_from_config_builds_client() {
        let client = HomeAssistantClient::from_config(
            Some("http://ha.local/".to_owned()),
            Some("cfg".to_owned()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://ha.local");
    }
}
