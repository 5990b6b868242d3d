// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of the ddsync write path.
//
// ## What One Update Does
//
// 1. Resolve the zone ID (configured, or `GET /zones?name=<domain>`)
// 2. Find the record (`GET /zones/:zone_id/dns_records?name=<host>&type=A|AAAA`)
// 3. `PUT /zones/:zone_id/dns_records/:record_id` with the new content,
//    keeping the record's TTL and proxy flag
//
// A record whose content already equals the new IP is left alone. The record
// must exist; creating records is out of scope for a DDNS agent.
//
// ## Trust Level: Untrusted (DNS Provider)
//
// - Performs HTTP calls to the Cloudflare API only
// - No retries, no backoff, no background tasks (the next pass retries)
// - No caching across calls, zone IDs included
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/

use async_trait::async_trait;
use ddsync_core::config::ProviderConfig;
use ddsync_core::traits::{DnsProvider, DnsProviderFactory};
use ddsync_core::{Error, IpType, ProviderRegistry, Result, fqdn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Name used in provider errors
const PROVIDER: &str = "cloudflare";

/// Response envelope shared by every v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    content: String,
    #[serde(default = "default_ttl")]
    ttl: u32,
    #[serde(default)]
    proxied: bool,
}

/// Cloudflare's "automatic" TTL
fn default_ttl() -> u32 {
    1
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider performs the zone and record lookups,
/// logs the PUT it would send and reports success without sending it.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID (optional, looked up from the domain name otherwise)
    zone_id: Option<String>,

    /// API base URL
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID; looked up per domain when absent
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    pub fn new(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id: zone_id.filter(|z| !z.is_empty()),
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the provider at another API base (e.g., a local mock)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether updates are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Get the zone ID for a domain
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn get_zone_id(&self, domain_name: &str) -> Result<String> {
        if let Some(zone_id) = &self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for domain: {}", domain_name);

        let request = self
            .client
            .get(format!("{}/zones", self.api_base))
            .query(&[("name", domain_name)]);

        let zones: Vec<Zone> = self.send(request, "Zone lookup").await?;
        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// Find the record of `record_type` named `record_name`
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=www.example.com&type=A
    /// ```
    async fn get_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: &str,
    ) -> Result<DnsRecord> {
        tracing::debug!(
            "Looking up record: {} (type: {})",
            record_name,
            record_type
        );

        let request = self
            .client
            .get(format!("{}/zones/{}/dns_records", self.api_base, zone_id))
            .query(&[("name", record_name), ("type", record_type)]);

        let records: Vec<DnsRecord> = self.send(request, "Record lookup").await?;
        records.into_iter().next().ok_or_else(|| {
            Error::not_found(format!(
                "DNS record not found: {} (type: {})",
                record_name, record_type
            ))
        })
    }

    /// Send an authenticated request and unwrap the v4 envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), action, &body));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", action, describe(&envelope.errors)),
            ));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{} returned no result", action))
        })
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn update_record(&self, domain_name: &str, sub_domain: &str, new_ip: IpAddr) -> Result<()> {
        let record_name = fqdn(domain_name, sub_domain);
        let record_type = IpType::of(&new_ip).record_type();

        tracing::info!(
            "Updating Cloudflare DNS record: {} -> {} ({}) [mode: {}]",
            record_name,
            new_ip,
            record_type,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let zone_id = self.get_zone_id(domain_name).await?;
        let record = self.get_record(&zone_id, &record_name, record_type).await?;

        if record.content.parse::<IpAddr>().ok() == Some(new_ip) {
            tracing::info!(
                "DNS record already has correct IP: {} -> {}",
                record_name,
                new_ip
            );
            return Ok(());
        }

        let payload = serde_json::json!({
            "type": record_type,
            "name": record_name,
            "content": new_ip.to_string(),
            "ttl": record.ttl,
            "proxied": record.proxied,
        });
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.api_base, zone_id, record.id
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        let _: serde_json::Value = self
            .send(self.client.put(&url).json(&payload), "Record update")
            .await?;

        tracing::info!(
            "DNS record updated successfully: {} -> {} (was: {})",
            record_name,
            new_ip,
            record.content
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: u16, action: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{} failed: {}", action, status)),
        409 => Error::provider(
            PROVIDER,
            format!("Conflict: Record is being updated by another process. Status: {}", status),
        ),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", action, status, body)),
    }
}

fn describe(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} ({})", e.message, e.code))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(CloudflareProvider::new(
                    api_token.clone(),
                    zone_id.clone(),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use ddsync_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// ddsync_provider_cloudflare::register(&mut registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
