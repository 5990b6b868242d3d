// # IP Cache
//
// Holds the last IP address that was propagated to every configured domain,
// and when that happened.
//
// ## Lifecycle
//
// - Created empty when the engine is built
// - Cleared when the entry is older than the timeout
// - Stored only after a pass succeeded for all domains
// - Never persisted (lost on restart)
//
// Time is read from `tokio::time::Instant` so paused-clock tests can
// advance it deterministically.

use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// In-memory cache of the last fully propagated IP
#[derive(Debug, Clone)]
pub struct IpCache {
    cached_ip: Option<IpAddr>,
    cached_at: Option<Instant>,
    timeout: Duration,
}

impl IpCache {
    /// Create an empty cache with the given expiry timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            cached_ip: None,
            cached_at: None,
            timeout,
        }
    }

    /// Drop the entry if it is older than the timeout.
    ///
    /// Returns `true` when a stale entry was discarded.
    pub fn expire_if_stale(&mut self, now: Instant) -> bool {
        match self.cached_at {
            Some(at) if now.saturating_duration_since(at) >= self.timeout => {
                debug!(
                    "Cached IP {:?} expired after {:?}",
                    self.cached_ip,
                    now.saturating_duration_since(at)
                );
                self.clear();
                true
            }
            Some(_) => false,
            None => {
                // An IP without a timestamp can't be trusted
                self.clear();
                false
            }
        }
    }

    /// Whether `ip` equals the cached value
    pub fn is_hit(&self, ip: IpAddr) -> bool {
        self.cached_ip == Some(ip)
    }

    /// Record a fully propagated IP
    pub fn store(&mut self, ip: IpAddr, now: Instant) {
        self.cached_ip = Some(ip);
        self.cached_at = Some(now);
        debug!("Cached IP address: {}", ip);
    }

    /// Reset to empty
    pub fn clear(&mut self) {
        self.cached_ip = None;
        self.cached_at = None;
    }

    /// Currently cached IP, if any
    pub fn cached_ip(&self) -> Option<IpAddr> {
        self.cached_ip
    }

    /// Expiry timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
