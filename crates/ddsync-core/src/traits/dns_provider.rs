// # DNS Provider Trait
//
// Defines the interface for updating DNS records via provider APIs.
//
// ## Implementations
//
// - Cloudflare: `ddsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddsync_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // Point www.example.com at a new address
//     provider.update_record(
//         "example.com",
//         "www",
//         std::net::IpAddr::from([192, 0, 2, 10]),
//     ).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for DNS provider implementations
///
/// This trait defines the write path. Implementations handle the specifics
/// of each provider's API; the engine decides when a write is needed.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine classifies it)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (the next pass retries)
/// - ❌ Decide whether an update is needed (owned by `SyncEngine`)
/// - ❌ Cache state beyond a single request
///
/// A provider that retries internally stalls the pass: every call on the
/// pass is sequential, so a sleeping provider delays every other domain.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Set the record for `sub_domain` under `domain_name` to `new_ip`
    ///
    /// # Parameters
    ///
    /// - `domain_name`: The zone name (e.g., "example.com")
    /// - `sub_domain`: The label, or [`crate::ROOT_DOMAIN`] for the apex
    /// - `new_ip`: The new IP address; its family selects A or AAAA
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The record now points at `new_ip`
    /// - `Err(Error)`: If the update failed
    async fn update_record(
        &self,
        domain_name: &str,
        sub_domain: &str,
        new_ip: IpAddr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
