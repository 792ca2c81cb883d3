//! n8n public API client.
//!
//! This crate is the leaf of the tool stack. It focuses on:
//!
//! - Constructing one shared HTTP client with the API key, `Accept` header and
//!   timeout applied up front
//! - Validating and normalizing the API base URL
//! - Mapping every transport or HTTP outcome onto the closed [`ApiError`]
//!   taxonomy, never exposing `reqwest` errors to callers
//! - Negotiating between endpoint variants through ordered probes
//!
//! It deliberately never retries or polls; retry policy lives with the
//! execution orchestrator.
//!
//! # Example
//!
//! ```ignore
//! use n8n_mcp_api::{ApiConfig, ApiRequest, N8nClient, RemoteApi, DEFAULT_REQUEST_TIMEOUT};
//!
//! let config = ApiConfig::new("https://n8n.example.com", api_key, DEFAULT_REQUEST_TIMEOUT)?;
//! let client = N8nClient::new(&config)?;
//! let workflows = client.send(ApiRequest::get("/workflows").query("limit", 10)).await?;
//! ```

mod client;
mod config;
mod error;
mod remote;
mod request;

pub use client::{API_KEY_HEADER, N8nClient};
pub use config::{API_PATH_PREFIX, ApiConfig, ConfigError, DEFAULT_REQUEST_TIMEOUT, normalize_base_url};
pub use error::{ApiError, remote_message};
pub use remote::{RemoteApi, credential_list_probes, decode};
pub use request::{ApiRequest, encode_segment, resource_path};

pub use reqwest::Method;
