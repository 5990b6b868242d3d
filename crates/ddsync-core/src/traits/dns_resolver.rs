// # DNS Resolver Trait
//
// Defines the read path: which address is currently published for a
// hostname. The engine compares this against the detected IP to decide
// whether a write is needed.
//
// ## Implementations
//
// - Hickory-based resolver: `ddsync-resolver` crate

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

use crate::config::IpType;

/// Resolution failure classes the engine distinguishes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The name exists but has no record of the requested family
    #[error("empty result")]
    EmptyResult,

    /// The name does not exist
    #[error("NXDOMAIN")]
    NxDomain,

    /// Any other lookup failure (timeouts, refused, malformed replies)
    #[error("{0}")]
    Other(String),
}

impl ResolveError {
    /// Create an "other" error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The record is absent, as opposed to the lookup having failed
    pub fn is_missing_record(&self) -> bool {
        matches!(self, ResolveError::EmptyResult | ResolveError::NxDomain)
    }
}

/// Trait for DNS resolver implementations
///
/// The resolver endpoint is fixed at construction; each call selects the
/// address family to query.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolve the first published address of `ip_type` for `hostname`
    async fn resolve(&self, hostname: &str, ip_type: IpType) -> Result<IpAddr, ResolveError>;
}
