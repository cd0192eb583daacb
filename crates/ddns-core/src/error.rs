//! Error types for the DDNS client
//!
//! A single error enum is shared by the core, the IP resolvers and the
//! provider adapters so the polling loop can classify failures without
//! knowing which component produced them.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS client
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or invalid input, unknown provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument passed to an operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The managed domain does not exist under the provider account
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Public IP discovery failed (bad status, unparsable body, wrong family)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// A request exceeded its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status returned by a provider API
    #[error("HTTP error {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Malformed response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a "domain not found" error
    pub fn domain_not_found(domain: impl Into<String>) -> Self {
        Self::DomainNotFound(domain.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this is a timeout or transport failure
    ///
    /// The polling loop uses a separate backoff cap for these.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    /// Whether this error can never be fixed by retrying
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidInput(_) | Self::DomainNotFound(_)
        )
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
