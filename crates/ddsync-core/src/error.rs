//! Error types for the ddsync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ddsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ddsync system
#[derive(Error, Debug)]
pub enum Error {
    /// IP detection failed inside a pass
    #[error("fail to get current IP: {source}")]
    CurrentIp {
        /// Underlying detector error
        #[source]
        source: Box<Error>,
    },

    /// A per-domain update failed inside a pass
    #[error("fail to update DNS: {source}")]
    UpdateDns {
        /// Underlying provider or webhook error
        #[source]
        source: Box<Error>,
    },

    /// IP detector-related errors
    #[error("IP detector error: {0}")]
    IpDetector(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Webhook execution errors
    #[error("Webhook error: {0}")]
    Webhook(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

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
    /// Wrap an IP detection failure with pass context
    pub fn current_ip(source: Error) -> Self {
        Self::CurrentIp {
            source: Box::new(source),
        }
    }

    /// Wrap a per-domain failure with pass context
    pub fn update_dns(source: Error) -> Self {
        Self::UpdateDns {
            source: Box::new(source),
        }
    }

    /// Create an IP detector error
    pub fn ip_detector(msg: impl Into<String>) -> Self {
        Self::IpDetector(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a webhook error
    pub fn webhook(msg: impl Into<String>) -> Self {
        Self::Webhook(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
