//! Engine settings loaded via OrthoConfig.
//!
//! Every value can come from a config file or a `QOVERFLOW_*` environment
//! variable; missing values fall back to the platform defaults.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::CallPolicyConfig;

const DEFAULT_API_BASE_URL: &str = "https://qoverflow.api.hscc.bdpa.org/v1";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MIN_REQUEST_INTERVAL_MS: u64 = 100;

/// Failure to load or interpret settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Sources could not be merged.
    #[error("failed to load settings: {message}")]
    Load {
        /// Loader message.
        message: String,
    },
    /// The API base URL does not parse.
    #[error("invalid api_base_url `{value}`: {source}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// No API key was configured for the HTTP adapter.
    #[error("QOVERFLOW_API_KEY is required unless demo_mode is enabled")]
    MissingApiKey,
}

/// Settings controlling the collaborator connection and retry policy.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "QOVERFLOW")]
pub struct EngineSettings {
    /// Base URL of the remote API.
    pub api_base_url: Option<String>,
    /// Bearer key sent with every request.
    pub api_key: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Minimum spacing between outbound requests in milliseconds.
    pub min_request_interval_ms: Option<u64>,
    /// Attempts for idempotent reads.
    pub read_max_attempts: Option<u32>,
    /// Attempts for writes, re-deriving state between them.
    pub write_max_attempts: Option<u32>,
    /// First retry backoff in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Retry backoff cap in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Use the in-memory demo adapter instead of the remote API.
    #[ortho_config(default = false)]
    pub demo_mode: bool,
}

impl EngineSettings {
    /// Load from the config file and environment, ignoring the process's
    /// own arguments.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from("qoverflow")]).map_err(|error| SettingsError::Load {
            message: error.to_string(),
        })
    }

    /// Parsed API base URL.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let value = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        Url::parse(value).map_err(|source| SettingsError::InvalidBaseUrl {
            value: value.to_owned(),
            source,
        })
    }

    /// Configured API key.
    pub fn api_key(&self) -> Result<&str, SettingsError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SettingsError::MissingApiKey)
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    /// Minimum interval between outbound requests.
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(
            self.min_request_interval_ms
                .unwrap_or(DEFAULT_MIN_REQUEST_INTERVAL_MS),
        )
    }

    /// Retry limits, defaulting each missing value.
    pub fn call_policy_config(&self) -> CallPolicyConfig {
        let defaults = CallPolicyConfig::default();
        CallPolicyConfig {
            read_max_attempts: self.read_max_attempts.unwrap_or(defaults.read_max_attempts),
            write_max_attempts: self.write_max_attempts.unwrap_or(defaults.write_max_attempts),
            initial_backoff: self
                .initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
        }
    }
}
