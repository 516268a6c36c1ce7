//! HTTP client authority
//!
//! Looks client records up on a remote authority service. The service wraps
//! every payload in an [`ApiResponse`] envelope:
//!
//! ```json
//! { "code": 200, "msg": "ok", "data": { "clientId": "app1", ... } }
//! ```
//!
//! HTTP 404, an envelope code of 404, or `data: null` all mean the client does
//! not exist.

use std::time::Duration;

use async_trait::async_trait;
use oc_config::AuthorityConfig;
use reqwest::{header::ACCEPT, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ClientAuthority;
use crate::error::AuthorityError;
use crate::model::RawClientRecord;

const CLIENT_ID_PLACEHOLDER: &str = "{client_id}";

/// Response envelope used by the authority service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub const SUCCESS: i64 = 200;
    pub const NOT_FOUND: i64 = 404;

    pub fn success(data: T) -> Self {
        Self {
            code: Self::SUCCESS,
            msg: Some("ok".to_string()),
            data: Some(data),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: Self::NOT_FOUND,
            msg: Some(msg.into()),
            data: None,
        }
    }

    /// Both `0` and `200` are used by authority deployments for success.
    pub fn is_success(&self) -> bool {
        self.code == 0 || self.code == Self::SUCCESS
    }
}

/// Authority reached over HTTP
pub struct HttpClientAuthority {
    http_client: reqwest::Client,
    base_url: String,
    client_path: String,
    bearer_token: Option<String>,
    max_retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpClientAuthority {
    pub fn new(config: &AuthorityConfig) -> Result<Self, AuthorityError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| {
            AuthorityError::Configuration(format!("invalid base_url '{}': {}", config.base_url, e))
        })?;
        if !config.client_path.contains(CLIENT_ID_PLACEHOLDER) {
            return Err(AuthorityError::Configuration(format!(
                "client_path '{}' has no {} placeholder",
                config.client_path, CLIENT_ID_PLACEHOLDER
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_path: config.client_path.clone(),
            bearer_token: config.bearer_token.clone(),
            max_retry_attempts: config.max_retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Lookup URL for a client id (url-encoded into the path)
    pub fn lookup_url(&self, client_id: &str) -> String {
        let path = self
            .client_path
            .replace(CLIENT_ID_PLACEHOLDER, &urlencoding::encode(client_id));
        format!("{}{}", self.base_url, path)
    }

    /// Single lookup attempt
    async fn fetch_once(&self, url: &str) -> Result<Option<RawClientRecord>, AuthorityError> {
        let mut request = self.http_client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthorityError::Status { status: status.as_u16() });
        }

        let body = response.bytes().await?;
        let envelope: ApiResponse<RawClientRecord> = serde_json::from_slice(&body)
            .map_err(|e| AuthorityError::Decode(e.to_string()))?;

        if envelope.code == ApiResponse::<RawClientRecord>::NOT_FOUND {
            return Ok(None);
        }
        if !envelope.is_success() {
            return Err(AuthorityError::Rejected {
                code: envelope.code,
                message: envelope.msg.unwrap_or_default(),
            });
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl ClientAuthority for HttpClientAuthority {
    async fn fetch_client_record(
        &self,
        client_id: &str,
    ) -> Result<Option<RawClientRecord>, AuthorityError> {
        let url = self.lookup_url(client_id);
        let max_attempts = self.max_retry_attempts + 1;
        let mut attempt = 1;

        loop {
            debug!(attempt, max_attempts, url = %url, "Fetching client record");

            match self.fetch_once(&url).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        retry_delay_ms = self.retry_delay.as_millis() as u64,
                        "Client authority lookup failed, retrying..."
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(attempt, client_id, error = %e, "Client authority lookup failed");
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
