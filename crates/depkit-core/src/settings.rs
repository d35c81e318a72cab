//! Provisioning settings and validation.
//!
//! All fields are optional so partial configuration files and environment
//! overrides compose; `effective_*` accessors supply defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policy::RetryPolicy;

/// Default host the model-serving service listens on.
pub const DEFAULT_SERVICE_HOST: &str = "127.0.0.1";

/// Default port the model-serving service listens on.
pub const DEFAULT_SERVICE_PORT: u16 = 11434;

const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_START_ATTEMPTS: u32 = 15;
const DEFAULT_START_DELAY_MS: u64 = 1_000;
const DEFAULT_PROBE_RETRY_DELAY_MS: u64 = 3_000;
const DEFAULT_INTER_INSTALL_DELAY_MS: u64 = 2_000;

/// Upper bound for any configured delay.
const MAX_DELAY_MS: u64 = 120_000;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DEPKIT_";

/// Provisioning settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionSettings {
    /// Host of the model-serving service.
    pub service_host: Option<String>,

    /// Port of the model-serving service.
    pub service_port: Option<u16>,

    /// Timeout of a single liveness probe request.
    pub probe_timeout_ms: Option<u64>,

    /// Liveness polls after launching the service.
    pub start_attempts: Option<u32>,

    /// Delay between liveness polls after launching the service.
    pub start_delay_ms: Option<u64>,

    /// Delay before the single post-install probe retry.
    pub probe_retry_delay_ms: Option<u64>,

    /// Settling delay between sequential installs.
    pub inter_install_delay_ms: Option<u64>,

    /// Additional substrings classifying an install failure as lock contention.
    pub extra_lock_patterns: Vec<String>,
}

impl ProvisionSettings {
    /// Settings with every field set to its default.
    pub fn with_defaults() -> Self {
        Self {
            service_host: Some(DEFAULT_SERVICE_HOST.to_string()),
            service_port: Some(DEFAULT_SERVICE_PORT),
            probe_timeout_ms: Some(DEFAULT_PROBE_TIMEOUT_MS),
            start_attempts: Some(DEFAULT_START_ATTEMPTS),
            start_delay_ms: Some(DEFAULT_START_DELAY_MS),
            probe_retry_delay_ms: Some(DEFAULT_PROBE_RETRY_DELAY_MS),
            inter_install_delay_ms: Some(DEFAULT_INTER_INSTALL_DELAY_MS),
            extra_lock_patterns: Vec::new(),
        }
    }

    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply `DEPKIT_*` overrides read through `lookup`.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, host)) = get("SERVICE_HOST") {
            self.service_host = Some(host);
        }
        if let Some((key, value)) = get("SERVICE_PORT") {
            self.service_port = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = get("PROBE_TIMEOUT_MS") {
            self.probe_timeout_ms = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = get("START_ATTEMPTS") {
            self.start_attempts = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = get("START_DELAY_MS") {
            self.start_delay_ms = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = get("PROBE_RETRY_DELAY_MS") {
            self.probe_retry_delay_ms = Some(parse_env(&key, &value)?);
        }
        if let Some((key, value)) = get("INTER_INSTALL_DELAY_MS") {
            self.inter_install_delay_ms = Some(parse_env(&key, &value)?);
        }
        if let Some((_, patterns)) = get("EXTRA_LOCK_PATTERNS") {
            self.extra_lock_patterns.extend(
                patterns
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            );
        }
        Ok(())
    }

    /// Effective service host.
    pub fn effective_service_host(&self) -> &str {
        self.service_host.as_deref().unwrap_or(DEFAULT_SERVICE_HOST)
    }

    /// Effective service port.
    pub fn effective_service_port(&self) -> u16 {
        self.service_port.unwrap_or(DEFAULT_SERVICE_PORT)
    }

    /// Base URL of the model-serving service.
    pub fn service_base_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.effective_service_host(),
            self.effective_service_port()
        )
    }

    /// Timeout of a single liveness probe.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms.unwrap_or(DEFAULT_PROBE_TIMEOUT_MS))
    }

    /// Polling budget after launching the service.
    pub fn start_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.start_attempts.unwrap_or(DEFAULT_START_ATTEMPTS),
            Duration::from_millis(self.start_delay_ms.unwrap_or(DEFAULT_START_DELAY_MS)),
        )
    }

    /// Post-install verification: one probe plus one retry after a delay.
    pub fn probe_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            2,
            Duration::from_millis(
                self.probe_retry_delay_ms
                    .unwrap_or(DEFAULT_PROBE_RETRY_DELAY_MS),
            ),
        )
    }

    /// Settling delay between sequential installs.
    pub fn inter_install_delay(&self) -> Duration {
        Duration::from_millis(
            self.inter_install_delay_ms
                .unwrap_or(DEFAULT_INTER_INSTALL_DELAY_MS),
        )
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnvValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

/// Settings loading or validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Service port cannot be 0")]
    InvalidPort,

    #[error("Service host cannot be empty")]
    EmptyHost,

    #[error("Start attempts must be between 1 and 600, got {0}")]
    InvalidStartAttempts(u32),

    #[error("Probe timeout must be between 100 and 60000 ms, got {0}")]
    InvalidProbeTimeout(u64),

    #[error("{field} must be at most {MAX_DELAY_MS} ms, got {value}")]
    DelayTooLong { field: &'static str, value: u64 },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnvValue { key: String, value: String },

    #[error("Failed to read settings from {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse settings in {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &ProvisionSettings) -> Result<(), SettingsError> {
    if settings.service_port == Some(0) {
        return Err(SettingsError::InvalidPort);
    }

    if settings
        .service_host
        .as_ref()
        .is_some_and(|h| h.trim().is_empty())
    {
        return Err(SettingsError::EmptyHost);
    }

    if let Some(attempts) = settings.start_attempts {
        if !(1..=600).contains(&attempts) {
            return Err(SettingsError::InvalidStartAttempts(attempts));
        }
    }

    if let Some(timeout) = settings.probe_timeout_ms {
        if !(100..=60_000).contains(&timeout) {
            return Err(SettingsError::InvalidProbeTimeout(timeout));
        }
    }

    let delays = [
        ("start_delay_ms", settings.start_delay_ms),
        ("probe_retry_delay_ms", settings.probe_retry_delay_ms),
        ("inter_install_delay_ms", settings.inter_install_delay_ms),
    ];
    for (field, value) in delays {
        if let Some(value) = value.filter(|v| *v > MAX_DELAY_MS) {
            return Err(SettingsError::DelayTooLong { field, value });
        }
    }

    Ok(())
}
