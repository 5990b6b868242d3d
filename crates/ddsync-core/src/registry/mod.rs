//! Plugin-based collaborator registry
//!
//! The registry lets DNS providers and IP detectors be registered by name,
//! so the daemon picks a backend from configuration instead of a hardcoded
//! if-else chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddsync_core::registry::ProviderRegistry;
//! use ddsync_core::config::ProviderConfig;
//!
//! let mut registry = ProviderRegistry::new();
//! ddsync_provider_cloudflare::register(&mut registry);
//!
//! let config = ProviderConfig::Cloudflare { ... };
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::{IpType, ProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, IpDetector, IpDetectorFactory};
use std::collections::HashMap;

/// Registry of collaborator factories
///
/// Registration happens once during startup, before the engine runs, so the
/// maps are plain owned collections.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: HashMap<String, Box<dyn DnsProviderFactory>>,

    /// Registered IP detector factories
    ip_detectors: HashMap<String, Box<dyn IpDetectorFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn DnsProviderFactory>,
    ) {
        self.providers.insert(name.into(), factory);
    }

    /// Register an IP detector factory
    ///
    /// # Parameters
    ///
    /// - `name`: Detector type name (e.g., "http")
    /// - `factory`: Factory object for creating detector instances
    pub fn register_ip_detector(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn IpDetectorFactory>,
    ) {
        self.ip_detectors.insert(name.into(), factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        config.validate()?;

        let provider_type = config.type_name();
        let factory = self
            .providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create an IP detector by type name
    pub fn create_ip_detector(
        &self,
        name: &str,
        urls: &[String],
        ip_type: IpType,
    ) -> Result<Box<dyn IpDetector>> {
        let factory = self
            .ip_detectors
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown IP detector type: {}", name)))?;

        factory.create(urls, ip_type)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all registered IP detector types
    pub fn list_ip_detectors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ip_detectors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Check if an IP detector type is registered
    pub fn has_ip_detector(&self, name: &str) -> bool {
        self.ip_detectors.contains_key(name)
    }
}
