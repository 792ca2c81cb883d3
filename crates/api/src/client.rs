use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;

use crate::{ApiConfig, ApiError, ApiRequest, ConfigError, RemoteApi};

/// Header carrying the static API credential.
pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";

/// Thin wrapper around a configured `reqwest::Client` for n8n API access.
///
/// The client pre-configures the credential, `Accept` header, User-Agent and
/// request timeout once at construction. It is cheap to clone and meant to be
/// shared read-only across all tool invocations.
#[derive(Debug, Clone)]
pub struct N8nClient {
    base_url: String,
    http: Client,
}

impl N8nClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let mut api_key = header::HeaderValue::from_str(config.api_key()).map_err(|error| ConfigError::InvalidApiKey {
            reason: error.to_string(),
        })?;
        api_key.set_sensitive(true);

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(API_KEY_HEADER, api_key);
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .user_agent(format!("n8n-mcp/{}; {}", env!("CARGO_PKG_VERSION"), std::env::consts::OS))
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| ConfigError::HttpClient {
                reason: error.to_string(),
            })?;

        Ok(Self {
            base_url: config.base_url().as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl RemoteApi for N8nClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(&request.path);
        let started = Instant::now();

        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body.as_ref() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| ApiError::from_reqwest(&error))?;
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        let text = response.text().await.map_err(|error| ApiError::from_reqwest(&error))?;

        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "remote call completed"
        );

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), retry_after_secs, &text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|error| ApiError::transport(format!("invalid JSON response: {error}")))
    }
}
