use super::types::{normalize_list, normalize_single, Endpoint, WebhookRequest};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),
}

pub type Result<T> = std::result::Result<T, WebhookError>;

/// URLs of the backend endpoint groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoints {
    pub auth: String,
    pub leads: String,
    pub tasks: String,
    pub reports: String,
}

impl WebhookEndpoints {
    pub fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Auth => &self.auth,
            Endpoint::Leads => &self.leads,
            Endpoint::Tasks => &self.tasks,
            Endpoint::Reports => &self.reports,
        }
    }
}

/// Transport for webhook calls
///
/// Services depend on this trait rather than on `WebhookClient` so they can
/// run against an in-process fake.
#[async_trait]
pub trait Webhook: Send + Sync {
    /// Send one request and return the raw JSON response
    async fn call(&self, request: &WebhookRequest) -> Result<Value>;

    /// Bearer token attached to subsequent calls
    fn set_token(&self, _token: Option<String>) {}
}

/// HTTP client for the webhook backend
pub struct WebhookClient {
    endpoints: WebhookEndpoints,
    client: Client,
    token: RwLock<Option<String>>,
}

impl WebhookClient {
    /// Create new webhook client
    pub fn new(endpoints: WebhookEndpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoints,
            client,
            token: RwLock::new(None),
        })
    }

    pub fn endpoints(&self) -> &WebhookEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl Webhook for WebhookClient {
    async fn call(&self, request: &WebhookRequest) -> Result<Value> {
        let url = self.endpoints.url(request.endpoint());

        debug!(source = request.source(), "POST {}", url);

        let mut req = self.client.post(url).json(request);
        if let Some(token) = self.token.read().as_deref() {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(source = request.source(), status = status.as_u16(), "Webhook call failed");
            return Err(WebhookError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| WebhookError::DeserializeFailed(e.to_string()))
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

/// Decode a list response into records
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    serde_json::from_value(normalize_list(value))
        .map_err(|e| WebhookError::DeserializeFailed(e.to_string()))
}

/// Decode a single-record response
pub fn decode_single<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(normalize_single(value))
        .map_err(|e| WebhookError::DeserializeFailed(e.to_string()))
}
