// # HTTP IP Detector
//
// This crate discovers the current public IP by asking plain-text lookup
// services (ipify, icanhazip, ...) over HTTP.
//
// ## Behavior
//
// - Endpoints are tried in configuration order, one request each
// - The first endpoint answering with an address of the configured family wins
// - An address of the wrong family counts as a failure of that endpoint
// - When every endpoint fails, the last failure is returned
//
// The detector keeps no state between calls; caching is the engine's job.

use ddsync_core::ProviderRegistry;
use ddsync_core::traits::{IpDetector, IpDetectorFactory};
use ddsync_core::{Error, IpType, Result};

use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, warn};

/// Per-request timeout
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Lookup services used for IPv4 when none are configured
pub const DEFAULT_IPV4_SERVICES: &[&str] = &[
    "https://api.ipify.org",
    "https://ipv4.icanhazip.com",
    "https://ifconfig.me/ip",
];

/// Lookup services used for IPv6 when none are configured
pub const DEFAULT_IPV6_SERVICES: &[&str] = &[
    "https://api6.ipify.org",
    "https://ipv6.icanhazip.com",
];

/// Default endpoints for an address family
pub fn default_services(ip_type: IpType) -> Vec<String> {
    let services = match ip_type {
        IpType::V4 => DEFAULT_IPV4_SERVICES,
        IpType::V6 => DEFAULT_IPV6_SERVICES,
    };
    services.iter().map(|s| s.to_string()).collect()
}

/// HTTP-based IP detector
pub struct HttpIpDetector {
    /// Endpoints, tried in order
    urls: Vec<String>,

    /// Family the answer must belong to
    ip_type: IpType,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpDetector {
    /// Create a new detector
    ///
    /// # Parameters
    ///
    /// - `urls`: Lookup endpoints; empty means the defaults for `ip_type`
    /// - `ip_type`: Address family to detect
    pub fn new(urls: Vec<String>, ip_type: IpType) -> Result<Self> {
        let urls = if urls.is_empty() {
            default_services(ip_type)
        } else {
            urls
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            urls,
            ip_type,
            client,
        })
    }

    /// Endpoints this detector will query
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Fetch and validate the answer of a single endpoint
    async fn fetch_ip(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_detector(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_detector(format!(
                "{} answered HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_detector(format!("Failed to read {} response: {}", url, e)))?;

        parse_answer(&body, self.ip_type)
    }
}

#[async_trait::async_trait]
impl IpDetector for HttpIpDetector {
    async fn detect(&self) -> Result<IpAddr> {
        let mut last_error = None;

        for url in &self.urls {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    debug!("Detected {} address {} via {}", self.ip_type, ip, url);
                    return Ok(ip);
                }
                Err(e) => {
                    warn!("IP lookup via {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::ip_detector("No IP lookup endpoints configured")))
    }

    fn detector_name(&self) -> &'static str {
        "http"
    }
}

/// Parse a lookup service body into an address of the wanted family
///
/// Services answer with the bare address, possibly followed by a newline.
pub fn parse_answer(body: &str, ip_type: IpType) -> Result<IpAddr> {
    let text = body.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_detector(format!("Invalid IP address: {:?}", text)))?;

    if !ip_type.matches(&ip) {
        return Err(Error::ip_detector(format!(
            "Expected {}, got: {}",
            ip_type, ip
        )));
    }

    Ok(ip)
}

/// Factory for creating HTTP IP detectors
pub struct HttpFactory;

impl IpDetectorFactory for HttpFactory {
    fn create(&self, urls: &[String], ip_type: IpType) -> Result<Box<dyn IpDetector>> {
        Ok(Box::new(HttpIpDetector::new(urls.to_vec(), ip_type)?))
    }
}

/// Register the HTTP IP detector with a registry
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_ip_detector("http", Box::new(HttpFactory));
}
