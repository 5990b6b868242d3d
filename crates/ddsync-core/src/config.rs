//! Configuration types for the ddsync system
//!
//! [`Settings`] is the subset of configuration the engine consumes. It is
//! injected once at construction and read-only afterwards.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::domain::Domain;

/// Default polling interval (seconds)
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default lifetime of the cached IP (seconds)
pub const DEFAULT_IP_CACHE_TIMEOUT_SECS: u64 = 900;

/// Default lifetime of the cached IP
pub const DEFAULT_IP_CACHE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_IP_CACHE_TIMEOUT_SECS);

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between two passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Perform a single pass and surface failures as errors
    #[serde(default)]
    pub run_once: bool,

    /// Resolver endpoint used to read published records (`host` or `host:port`).
    /// `None` uses the system configuration.
    #[serde(default)]
    pub resolver: Option<String>,

    /// Address family to detect, resolve and publish
    #[serde(default)]
    pub ip_type: IpType,

    /// Seconds after which the cached IP is discarded
    #[serde(default = "default_ip_cache_timeout_secs")]
    pub ip_cache_timeout_secs: u64,

    /// Webhook invoked after each successful record write
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Domains to keep in sync, in processing order
    pub domains: Vec<Domain>,
}

impl Settings {
    /// Create settings for the given domains with defaults everywhere else
    pub fn new(domains: Vec<Domain>) -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_once: false,
            resolver: None,
            ip_type: IpType::default(),
            ip_cache_timeout_secs: default_ip_cache_timeout_secs(),
            webhook: WebhookConfig::default(),
            domains,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Interval must be > 0"));
        }
        if self.ip_cache_timeout_secs == 0 {
            return Err(crate::Error::config("IP cache timeout must be > 0"));
        }
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }
        for domain in &self.domains {
            domain.validate()?;
        }
        if let Some(resolver) = &self.resolver
            && resolver.trim().is_empty()
        {
            return Err(crate::Error::config("Resolver endpoint cannot be empty"));
        }
        self.webhook.validate()?;

        Ok(())
    }

    /// Polling interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Cache expiry timeout
    pub fn ip_cache_timeout(&self) -> Duration {
        Duration::from_secs(self.ip_cache_timeout_secs)
    }

    /// Failure policy derived from the run-once flag
    pub fn run_mode(&self) -> RunMode {
        if self.run_once {
            RunMode::Once
        } else {
            RunMode::Daemon
        }
    }
}

/// IP address family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpType {
    /// IPv4 (A records)
    #[default]
    V4,
    /// IPv6 (AAAA records)
    V6,
}

impl IpType {
    /// Whether an address belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpType::V4 => ip.is_ipv4(),
            IpType::V6 => ip.is_ipv6(),
        }
    }

    /// DNS record type carrying this family
    pub fn record_type(&self) -> &'static str {
        match self {
            IpType::V4 => "A",
            IpType::V6 => "AAAA",
        }
    }

    /// Family of a concrete address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpType::V4,
            IpAddr::V6(_) => IpType::V6,
        }
    }
}

impl std::fmt::Display for IpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpType::V4 => write!(f, "IPv4"),
            IpType::V6 => write!(f, "IPv6"),
        }
    }
}

impl std::str::FromStr for IpType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v4" | "ipv4" | "4" => Ok(IpType::V4),
            "v6" | "ipv6" | "6" => Ok(IpType::V6),
            other => Err(crate::Error::config(format!(
                "Unknown IP type '{}', expected v4 or v6",
                other
            ))),
        }
    }
}

/// How failures inside a pass are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One pass; failures abort with a wrapped error
    Once,
    /// Periodic passes; failures are logged and retried next tick
    Daemon,
}

/// Webhook configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Whether the webhook runs after record writes
    #[serde(default)]
    pub enabled: bool,

    /// Target URL (may contain placeholders)
    #[serde(default)]
    pub url: String,

    /// Optional POST body template; GET is used when absent
    #[serde(default)]
    pub request_body: Option<String>,
}

impl WebhookConfig {
    /// Validate the webhook configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.enabled {
            return Ok(());
        }
        if self.url.is_empty() {
            return Err(crate::Error::config(
                "Webhook URL cannot be empty when webhook is enabled",
            ));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Webhook URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

/// DNS provider backend configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, looked up from the domain name otherwise)
        zone_id: Option<String>,
        /// Log intended writes instead of performing them
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Keeps API tokens out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                zone_id, dry_run, ..
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .field("zone_id", zone_id)
                .field("dry_run", dry_run)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_ip_cache_timeout_secs() -> u64 {
    DEFAULT_IP_CACHE_TIMEOUT_SECS
}
