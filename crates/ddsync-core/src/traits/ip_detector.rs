// # IP Detector Trait
//
// Defines the interface for discovering the current public IP address.
//
// ## Implementations
//
// - HTTP lookup services: `ddsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddsync_core::IpDetector;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let detector = /* IpDetector implementation */;
//     let ip = detector.detect().await?;
//     println!("current IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP detector implementations
///
/// A detector answers one question per call: what is the public IP right
/// now. It is polled by the engine once per pass.
///
/// ## Allowed
/// - Network I/O to the lookup endpoints it was configured with
/// - Falling back across several endpoints within one call
///
/// ## Not Allowed
/// - Caching answers across calls (the engine owns the IP cache)
/// - Spawning background polling tasks (the engine owns the schedule)
/// - Deciding whether DNS needs updating
#[async_trait]
pub trait IpDetector: Send + Sync {
    /// Get the current IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address, of the configured family
    /// - `Err(Error)`: If unable to determine the current IP
    async fn detect(&self) -> Result<IpAddr, crate::Error>;

    /// Name used in logs
    fn detector_name(&self) -> &'static str;
}

/// Helper trait for constructing IP detectors from settings
pub trait IpDetectorFactory: Send + Sync {
    /// Create an IpDetector instance
    ///
    /// # Parameters
    ///
    /// - `urls`: Lookup endpoints, tried in order
    /// - `ip_type`: Address family the detector must return
    fn create(
        &self,
        urls: &[String],
        ip_type: crate::config::IpType,
    ) -> Result<Box<dyn IpDetector>, crate::Error>;
}
