//! Command-line and environment configuration.
//!
//! Everything is validated here; the library crates only ever receive
//! already-checked [`ApiConfig`] and [`ExecutionSettings`] values.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use n8n_mcp::orchestrator::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_SECONDS, DEFAULT_TIMEOUT_SECONDS};
use n8n_mcp::{ExecutionSettings, SettingsError, resolve_bind_address};
use n8n_mcp_api::ApiConfig;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// MCP over stdin/stdout.
    Stdio,
    /// Streamable HTTP at /mcp on a loopback address.
    Http,
}

/// MCP server exposing an n8n instance's public API as tools.
#[derive(Debug, Parser)]
#[command(name = "n8n-mcp", version, about, long_about = None)]
pub struct Cli {
    /// Instance URL, with or without the /api/v1 suffix
    #[arg(long, env = "N8N_API_URL")]
    pub api_url: String,

    /// Public API key, sent as X-N8N-API-KEY
    #[arg(long, env = "N8N_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "N8N_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Default execute_workflow wait budget in seconds (1-300)
    #[arg(long, env = "N8N_EXECUTION_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub execution_timeout_secs: u64,

    /// Default execute_workflow retry limit (1-5)
    #[arg(long, env = "N8N_EXECUTION_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub execution_max_retries: u64,

    /// Default pause before a retry in seconds (1-60)
    #[arg(long, env = "N8N_EXECUTION_RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY_SECONDS)]
    pub execution_retry_delay_secs: u64,

    /// Pause between execution status checks in milliseconds
    #[arg(
        long,
        env = "N8N_POLL_INTERVAL_MS",
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(100..=10_000)
    )]
    pub poll_interval_ms: u64,

    #[arg(long, env = "N8N_MCP_TRANSPORT", value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Loopback address for the HTTP transport (default 127.0.0.1:0)
    #[arg(long, env = "N8N_MCP_BIND")]
    pub bind: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Api(#[from] n8n_mcp_api::ConfigError),

    #[error("invalid execution defaults: {0}")]
    Execution(#[from] SettingsError),

    #[error("{0}")]
    Bind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportConfig {
    Stdio,
    Http(SocketAddr),
}

/// Fully validated process configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api: ApiConfig,
    pub execution: ExecutionSettings,
    pub transport: TransportConfig,
}

impl Cli {
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let api = ApiConfig::new(&self.api_url, self.api_key, Duration::from_secs(self.request_timeout_secs))?;
        let execution = ExecutionSettings::new(
            Duration::from_millis(self.poll_interval_ms),
            self.execution_timeout_secs,
            self.execution_max_retries,
            self.execution_retry_delay_secs,
        )?;
        let transport = match self.transport {
            Transport::Stdio => TransportConfig::Stdio,
            Transport::Http => TransportConfig::Http(
                resolve_bind_address(self.bind.as_deref()).map_err(|error| ConfigError::Bind(error.to_string()))?,
            ),
        };
        Ok(ServerConfig {
            api,
            execution,
            transport,
        })
    }
}
