use async_trait::async_trait;
use insights_core::config::ApiConfig;
use insights_core::error::{InsightsError, Result};
use insights_core::{SessionDataRequest, SessionDataResponse};
use std::time::Duration;
use url::Url;

use crate::SessionSource;

/// Session source backed by `POST {base_url}/session-data`.
pub struct HttpSessionSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSessionSource {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoint = session_data_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Resolve the session-data endpoint under a base URL. Only http/https are accepted.
pub fn session_data_url(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;

    match base.scheme() {
        "http" | "https" => {}
        other => {
            return Err(InsightsError::InvalidEndpoint(format!(
                "Scheme '{}' is not allowed (only http/https)",
                other
            )));
        }
    }

    // Without a trailing slash, `join` would replace the last path segment.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("session-data")?)
}

#[async_trait]
impl SessionSource for HttpSessionSource {
    async fn fetch_page(&self, request: &SessionDataRequest) -> Result<SessionDataResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
