// # ddsync-core
//
// Core library for the ddsync dynamic DNS agent.
//
// ## Architecture Overview
//
// This library owns every reconciliation decision; all I/O is delegated:
// - **IpDetector**: Trait for discovering the current public IP
// - **DnsResolver**: Trait for reading the currently published address
// - **DnsProvider**: Trait for writing DNS records via provider APIs
// - **WebhookExecutor** / **Notifier**: Traits for outbound change reports
// - **IpCache**: In-memory record of the last fully propagated IP
// - **SyncEngine**: Scheduler + reconciler driving the detect → compare → update flow
// - **ProviderRegistry**: Plugin-based registry for backends
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from backends
// 2. **Sequential Passes**: One pass at a time, every call awaited in order
// 3. **Plugin-Based**: Backends are registered by name, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **At-Least-Once**: A failed pass leaves the cache untouched and is retried whole

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod domain;
pub mod cache;
pub mod error;

// Re-export core types for convenience
pub use traits::{
    DnsProvider, DnsResolver, IpDetector, NotificationManager, Notifier, ResolveError,
    WebhookExecutor,
};
pub use engine::{Collaborators, EngineEvent, SyncEngine};
pub use registry::ProviderRegistry;
pub use config::{IpType, ProviderConfig, RunMode, Settings, WebhookConfig};
pub use domain::{Domain, ROOT_DOMAIN, fqdn};
pub use cache::IpCache;
pub use error::{Error, Result};
