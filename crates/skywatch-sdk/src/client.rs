//! HTTP client for the Skywatch backend.

use chrono::Utc;
use reqwest::Url;
use skywatch_core::{Alert, HistoryResponse, ModeAction, ProcessCommand, ProcessingMode};

use crate::config::Config;
use crate::error::ClientError;

/// Client for the alert history and processing-mode endpoints.
#[derive(Debug, Clone)]
pub struct SkywatchClient {
    pub(crate) api_url: String,
    pub(crate) drone_id: String,
    pub(crate) client: reqwest::Client,
}

impl SkywatchClient {
    /// Create a client with reqwest defaults (no request timeout).
    pub fn new(api_url: impl Into<String>, drone_id: impl Into<String>) -> Self {
        Self::with_http_client(api_url, drone_id, reqwest::Client::new())
    }

    /// Create a client with the configured request timeout.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http_client(
            config.api_url.clone(),
            config.drone_id.clone(),
            client,
        ))
    }

    pub fn with_http_client(
        api_url: impl Into<String>,
        drone_id: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            api_url,
            drone_id: drone_id.into(),
            client,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn drone_id(&self) -> &str {
        &self.drone_id
    }

    /// Fetch and normalize the full alert history.
    pub async fn fetch_history(&self) -> Result<Vec<Alert>, ClientError> {
        let url = format!("{}/alert", self.api_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: url,
                status: response.status(),
            });
        }

        let body: HistoryResponse = response.json().await?;
        let alerts = body.into_alerts(Utc::now());
        tracing::debug!("Fetched {} alerts from history", alerts.len());
        Ok(alerts)
    }

    /// Turn one processing mode on or off for this client's drone.
    pub async fn send_process_command(
        &self,
        mode: ProcessingMode,
        action: ModeAction,
    ) -> Result<(), ClientError> {
        let url = format!("{}/process/{}", self.api_url, mode.endpoint());
        let command = ProcessCommand {
            action,
            drone_id: self.drone_id.clone(),
        };

        let response = self.client.post(&url).json(&command).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: url,
                status: response.status(),
            });
        }

        tracing::debug!("{} {:?} accepted for {}", mode, action, self.drone_id);
        Ok(())
    }
}

/// Validate a push channel URL, mapping `http(s)` to `ws(s)`.
pub fn build_ws_url(base: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: base.to_string(),
        reason,
    };

    let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" => return Ok(url),
        other => return Err(invalid(format!("unsupported scheme `{other}`"))),
    };

    url.set_scheme(scheme)
        .map_err(|_| invalid("cannot switch scheme".to_string()))?;
    Ok(url)
}
