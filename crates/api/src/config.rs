//! Client configuration and base URL validation.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Path prefix of the public REST API.
pub const API_PATH_PREFIX: &str = "/api/v1";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Hostnames treated as local development targets.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: String },

    #[error("failed to build HTTP client: {reason}")]
    HttpClient { reason: String },
}

impl ConfigError {
    fn invalid_base_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validated settings for [`crate::N8nClient`].
///
/// `Debug` never prints the API key.
#[derive(Clone)]
pub struct ApiConfig {
    base_url: Url,
    api_key: String,
    request_timeout: Duration,
}

impl ApiConfig {
    /// Validate and normalize connection settings.
    ///
    /// The base URL may point at the instance root (`https://n8n.example.com`)
    /// or already include `/api/v1`; both normalize to the latter.
    pub fn new(base_url: &str, api_key: impl Into<String>, request_timeout: Duration) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidApiKey {
                reason: "must not be empty".to_string(),
            });
        }
        if request_timeout.is_zero() {
            return Err(ConfigError::HttpClient {
                reason: "request timeout must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_key,
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Validate a base URL and make it end with [`API_PATH_PREFIX`].
///
/// Rules:
/// - scheme must be `http` or `https`
/// - a host is required
/// - query strings and fragments are rejected
/// - plain `http` to a non-local host is accepted but logged as a warning
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(raw.trim()).map_err(|error| ConfigError::invalid_base_url(raw, error.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_base_url(
            raw,
            format!("scheme must be http or https, got '{}'", parsed.scheme()),
        ));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| ConfigError::invalid_base_url(raw, "a host is required"))?;
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::invalid_base_url(raw, "query strings and fragments are not allowed"));
    }

    let is_local = LOCALHOST_DOMAINS.iter().any(|&local| host.eq_ignore_ascii_case(local));
    if parsed.scheme() == "http" && !is_local {
        warn!(host, "API base URL uses plain http; the API key will travel unencrypted");
    }

    let trimmed_path = parsed.path().trim_end_matches('/');
    let path = if trimmed_path.ends_with(API_PATH_PREFIX) {
        trimmed_path.to_string()
    } else {
        format!("{trimmed_path}{API_PATH_PREFIX}")
    };
    let mut normalized = parsed.clone();
    normalized.set_path(&path);
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_api_prefix_once() {
        let root = normalize_base_url("https://n8n.example.com").expect("root url");
        assert_eq!(root.as_str(), "https://n8n.example.com/api/v1");

        let already = normalize_base_url("https://n8n.example.com/api/v1/").expect("prefixed url");
        assert_eq!(already.as_str(), "https://n8n.example.com/api/v1");

        let nested = normalize_base_url("http://localhost:5678/tools/n8n").expect("nested url");
        assert_eq!(nested.as_str(), "http://localhost:5678/tools/n8n/api/v1");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(normalize_base_url("ftp://n8n.example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
        assert!(normalize_base_url("https://n8n.example.com/?x=1").is_err());
    }

    #[test]
    fn rejects_empty_api_key_and_hides_it_in_debug() {
        assert!(ApiConfig::new("https://n8n.example.com", "  ", DEFAULT_REQUEST_TIMEOUT).is_err());

        let config = ApiConfig::new("https://n8n.example.com", "super-secret", DEFAULT_REQUEST_TIMEOUT).expect("config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
