//! Collaborator traits for the ddsync system
//!
//! The engine owns the reconciliation decisions; everything that talks to
//! the outside world sits behind one of these interfaces.
//!
//! - [`IpDetector`]: Discover the current public IP
//! - [`DnsResolver`]: Read the address currently published for a hostname
//! - [`DnsProvider`]: Write a DNS record via a provider API
//! - [`WebhookExecutor`]: Call out after a record was written
//! - [`Notifier`]: Deliver a change notification on one channel

pub mod ip_detector;
pub mod dns_resolver;
pub mod dns_provider;
pub mod webhook;
pub mod notifier;

pub use ip_detector::{IpDetector, IpDetectorFactory};
pub use dns_resolver::{DnsResolver, ResolveError};
pub use dns_provider::{DnsProvider, DnsProviderFactory};
pub use webhook::WebhookExecutor;
pub use notifier::{NotificationManager, Notifier};
