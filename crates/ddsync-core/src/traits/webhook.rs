// # Webhook Executor Trait
//
// Invoked once per written record when webhooks are enabled. A failure
// aborts the pass the same way a provider failure does.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for webhook implementations
#[async_trait]
pub trait WebhookExecutor: Send + Sync {
    /// Report that `hostname` now points at `new_ip`
    ///
    /// `previous_ip` is `None` when the published address was unknown.
    async fn execute(
        &self,
        hostname: &str,
        new_ip: IpAddr,
        previous_ip: Option<IpAddr>,
    ) -> Result<(), crate::Error>;
}
