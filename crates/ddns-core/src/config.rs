//! Configuration types for the DDNS client
//!
//! This module defines all configuration structures used throughout the crate.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::traits::IpVersion;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zone managed at the provider (e.g., "example.com")
    pub domain: String,

    /// Record names under the domain, all updated together
    pub records: Vec<String>,

    /// Address family to track; `None` defers to the provider's preference
    #[serde(default)]
    pub ip_version: Option<IpVersion>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default engine settings
    pub fn new(
        provider: ProviderConfig,
        domain: impl Into<String>,
        records: Vec<String>,
    ) -> Self {
        Self {
            provider,
            domain: domain.into(),
            records,
            ip_version: None,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        validate_domain_name(&self.domain)?;

        if self.records.is_empty() {
            return Err(Error::config("No records configured"));
        }

        for record in &self.records {
            validate_record_name(record)?;
        }

        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// ArvanCloud provider
    Arvan {
        /// ArvanCloud API key (sent as `Authorization: Apikey <key>`)
        api_key: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Arvan { .. } => f
                .debug_struct("Arvan")
                .field("api_key", &"<REDACTED>")
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Build a provider configuration from a provider name and API key
    ///
    /// Names are matched case-insensitively. Names without a built-in
    /// variant become [`ProviderConfig::Custom`]; the registry rejects
    /// them later if no factory is registered under that name.
    pub fn from_name(name: &str, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        match name.trim().to_lowercase().as_str() {
            "arvan" => ProviderConfig::Arvan { api_key },
            other => ProviderConfig::Custom {
                factory: other.to_string(),
                config: serde_json::json!({ "api_key": api_key }),
            },
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            ProviderConfig::Arvan { api_key } => {
                if api_key.trim().is_empty() {
                    return Err(Error::config("Arvan API key cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Arvan { .. } => "arvan",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between IP checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on the delay after a failed check (in seconds)
    #[serde(default = "default_error_backoff_cap_secs")]
    pub error_backoff_cap_secs: u64,

    /// Upper bound on the delay after a timeout or connection failure (in seconds)
    #[serde(default = "default_network_backoff_cap_secs")]
    pub network_backoff_cap_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.interval_secs == 0 {
            return Err(Error::config("Polling interval must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("Request timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Delay between successful checks
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-request HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Delay before retrying after `error`: `min(interval, cap)`
    pub fn retry_delay(&self, error: &Error) -> Duration {
        let cap = if error.is_network() {
            self.network_backoff_cap_secs
        } else {
            self.error_backoff_cap_secs
        };
        Duration::from_secs(self.interval_secs.min(cap))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            error_backoff_cap_secs: default_error_backoff_cap_secs(),
            network_backoff_cap_secs: default_network_backoff_cap_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_error_backoff_cap_secs() -> u64 {
    60
}

fn default_network_backoff_cap_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks: 253 chars total, 63 per label, alphanumerics
/// and hyphens, no leading or trailing hyphen.
pub fn validate_domain_name(domain: &str) -> Result<(), Error> {
    if domain.is_empty() {
        return Err(Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// Validate a record name relative to the domain
///
/// Accepts `@` (zone apex), wildcard `*` labels, underscores (service
/// labels) and dotted multi-label names such as `vpn.home`.
pub fn validate_record_name(record: &str) -> Result<(), Error> {
    if record == "@" {
        return Ok(());
    }

    if record.is_empty() {
        return Err(Error::config("Record name cannot be empty"));
    }

    if record.len() > 253 {
        return Err(Error::config(format!(
            "Record name too long: {} chars (max 253). Got: {}",
            record.len(),
            record
        )));
    }

    for label in record.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(Error::config(format!(
                "Record name has an empty or oversized label: '{}'",
                record
            )));
        }

        if label == "*" {
            continue;
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::config(format!(
                "Record label contains invalid characters. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
