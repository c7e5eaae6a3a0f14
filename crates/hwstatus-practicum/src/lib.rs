// # Practicum Status Client
//
// This crate provides the homework status API client for hwstatus.
//
// ## Behavior
//
// - One GET per call, no retry, no sleeping (pacing is owned by PollLoop)
// - HTTP timeout configured from `PollConfig::http_timeout_secs`
// - Outcomes classified in a fixed order: transport, status code, JSON, server error
//
// ## Security Requirements
//
// - API token NEVER appears in logs or error text
// - API token MUST be provided via environment variables only
//
// ## API Reference
//
// ```http
// GET /api/user_api/homework_statuses/?from_date=1581604970
// Authorization: OAuth <token>
// ```

use async_trait::async_trait;
use hwstatus_core::config::BotConfig;
use hwstatus_core::traits::StatusSource;
use hwstatus_core::{Error, RequestInfo, Result};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use std::time::Duration;

/// Name of the cursor query parameter
pub const FROM_DATE_PARAM: &str = "from_date";

/// Top-level keys that signal a server-side failure despite HTTP 200
const SERVER_ERROR_KEYS: [&str; 2] = ["error", "code"];

/// Homework status API client
pub struct PracticumClient {
    /// API token
    /// ⚠️ NEVER log this value
    token: String,

    /// Status endpoint URL
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PracticumClient")
            .field("token", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl PracticumClient {
    /// Create a new client
    ///
    /// # Parameters
    ///
    /// - `token`: Practicum OAuth token
    /// - `endpoint`: Status endpoint URL
    /// - `timeout`: Per-request timeout; exceeding it is a transport failure
    pub fn new(
        token: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let token = token.into();
        let endpoint = endpoint.into();

        if token.is_empty() {
            return Err(Error::config("Practicum API token cannot be empty"));
        }
        reqwest::Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("Invalid status endpoint {}: {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            endpoint,
            client,
        })
    }

    /// Create a client from the notifier configuration
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(
            config.practicum_token.clone(),
            config.poll.endpoint.clone(),
            Duration::from_secs(config.poll.http_timeout_secs),
        )
    }

    /// Status endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_header(&self) -> String {
        format!("OAuth {}", self.token)
    }

    /// Diagnostic view of the request for a cursor
    pub fn request_info(&self, from_date: i64) -> RequestInfo {
        RequestInfo::new(self.endpoint.clone())
            .with_header(AUTHORIZATION.as_str(), self.auth_header())
            .with_param(FROM_DATE_PARAM, from_date.to_string())
    }

    /// Build the status request for a cursor
    pub fn build_request(&self, from_date: i64) -> Result<reqwest::Request> {
        self.client
            .get(&self.endpoint)
            .header(AUTHORIZATION, self.auth_header())
            .query(&[(FROM_DATE_PARAM, from_date)])
            .build()
            .map_err(|e| Error::transport(e.to_string(), self.request_info(from_date)))
    }
}

/// Decode a 200 response body
///
/// # Errors
///
/// - [`Error::MalformedPayload`] if the body is not JSON
/// - [`Error::ServerReported`] if the payload has a top-level `error` or
///   `code` key (`error` wins when both are present)
pub fn decode_payload(body: &str, request: &RequestInfo) -> Result<Value> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|_| Error::malformed_payload(body, request.clone()))?;

    for indicator in SERVER_ERROR_KEYS {
        if let Some(value) = payload.get(indicator) {
            return Err(Error::server_reported(indicator, value.to_string()));
        }
    }

    Ok(payload)
}

#[async_trait]
impl StatusSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        let request_info = self.request_info(from_date);
        let request = self.build_request(from_date)?;

        tracing::debug!("Requesting homework statuses from_date={}", from_date);

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| Error::transport(e.to_string(), request_info.clone()))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("Status API returned {}", status);
            return Err(Error::unexpected_status(status.as_u16(), request_info));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(e.to_string(), request_info.clone()))?;

        decode_payload(&body, &request_info)
    }

    fn source_name(&self) -> &'static str {
        "practicum"
    }
}
