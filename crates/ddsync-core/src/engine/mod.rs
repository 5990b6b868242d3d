//! Core reconciliation engine
//!
//! The SyncEngine is responsible for:
//! - Detecting the current IP once per tick
//! - Skipping the pass when the IP matches the (unexpired) cache
//! - Comparing every hostname against its published address
//! - Writing records that differ, firing webhooks and notifications
//! - Caching the IP once every domain converged
//!
//! ## Architecture
//!
//! ```text
//!   ticker ──► update_ip ──► IpDetector
//!                  │
//!                  ├── IpCache (hit → done)
//!                  │
//!                  ▼  for each domain, for each subdomain
//!            update_domain ──► DnsResolver ──► compare
//!                  │                              │ differs
//!                  │                              ▼
//!                  │                   DnsProvider ──► WebhookExecutor
//!                  ▼
//!          NotificationManager (any record written)
//! ```
//!
//! ## Failure Policy
//!
//! Failures inside a pass are settled in one place according to
//! [`RunMode`]: `Once` returns them wrapped with context, `Daemon` logs them
//! and ends the pass early so the next tick retries every domain.

use crate::cache::IpCache;
use crate::config::{IpType, RunMode, Settings};
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsResolver, IpDetector, NotificationManager, WebhookExecutor};
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        domains_count: usize,
    },

    /// Detected IP matched the cache; nothing was touched
    PassSkipped {
        ip: IpAddr,
    },

    /// The published address differed and the record was written
    RecordUpdated {
        hostname: String,
        new_ip: IpAddr,
        previous_ip: Option<IpAddr>,
    },

    /// The published address already matched
    RecordUnchanged {
        hostname: String,
        ip: IpAddr,
    },

    /// The hostname has no published record; it was skipped
    RecordUnresolved {
        hostname: String,
        reason: String,
    },

    /// At least one record of the domain was written
    DomainUpdated {
        domain_name: String,
        sub_domains: Vec<String>,
        ip: IpAddr,
    },

    /// Every domain converged and the IP was cached
    PassCompleted {
        ip: IpAddr,
    },

    /// The pass ended early
    PassFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// External collaborators the engine drives
pub struct Collaborators {
    /// Current public IP discovery
    pub ip_detector: Box<dyn IpDetector>,

    /// Read path for published records
    pub resolver: Box<dyn DnsResolver>,

    /// Write path for records
    pub provider: Box<dyn DnsProvider>,

    /// Webhook, required when the webhook is enabled in settings
    pub webhook: Option<Box<dyn WebhookExecutor>>,

    /// Notification channels
    pub notifications: NotificationManager,
}

/// Core ddsync engine
///
/// One engine drives at most one pass at a time. Every network call on a
/// pass is awaited in sequence, and the IP cache is mutated only at the end
/// of a successful pass, so no locking is involved.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Start with [`SyncEngine::run()`] or [`SyncEngine::run_with_shutdown()`]
/// 3. The loop runs until cancelled (daemon mode) or after one pass (run-once)
pub struct SyncEngine {
    ip_detector: Box<dyn IpDetector>,
    resolver: Box<dyn DnsResolver>,
    provider: Box<dyn DnsProvider>,
    webhook: Option<Box<dyn WebhookExecutor>>,
    notifications: NotificationManager,

    /// Domains to manage, in processing order
    domains: Vec<Domain>,

    /// Period between passes
    interval: Duration,

    /// Address family to resolve
    ip_type: IpType,

    /// Failure policy
    run_mode: RunMode,

    /// Last fully propagated IP
    cache: IpCache,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        collaborators: Collaborators,
        settings: Settings,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        settings.validate()?;

        let webhook = match (settings.webhook.enabled, collaborators.webhook) {
            (true, Some(webhook)) => Some(webhook),
            (true, None) => {
                return Err(Error::config(
                    "Webhook is enabled but no webhook executor was supplied",
                ));
            }
            (false, Some(_)) => {
                debug!("Webhook executor supplied but webhook is disabled, ignoring it");
                None
            }
            (false, None) => None,
        };

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ip_detector: collaborators.ip_detector,
            resolver: collaborators.resolver,
            provider: collaborators.provider,
            webhook,
            notifications: collaborators.notifications,
            interval: settings.interval(),
            ip_type: settings.ip_type,
            run_mode: settings.run_mode(),
            cache: IpCache::new(settings.ip_cache_timeout()),
            domains: settings.domains,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown, or a successful single pass in run-once mode
    /// - `Err(Error)`: The single pass failed in run-once mode
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the engine until `shutdown_rx` fires
    ///
    /// Dropping the sender counts as a shutdown request.
    pub async fn run_with_shutdown(&mut self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async move {
            let _ = shutdown_rx.await;
        })
        .await
    }

    async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.emit_event(EngineEvent::Started {
            domains_count: self.domains.len(),
        });

        if self.run_mode == RunMode::Once {
            let result = self.update_ip().await;
            self.emit_event(EngineEvent::Stopped {
                reason: "Run-once pass finished".to_string(),
            });
            return result;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately: initial pass
        ticker.tick().await;
        self.run_pass().await;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("DNS update loop cancelled");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }

                _ = ticker.tick() => {
                    self.run_pass().await;
                }
            }
        }

        Ok(())
    }

    /// One loop iteration; errors never escape the loop
    async fn run_pass(&mut self) {
        if let Err(e) = self.update_ip().await {
            error!("Update IP failed during the DNS update loop: {}", e);
        }
        debug!(
            "DNS update loop finished, will run again in {} seconds",
            self.interval.as_secs()
        );
    }

    /// Perform one pass against the currently detected IP
    pub async fn update_ip(&mut self) -> Result<()> {
        let ip = match self.ip_detector.detect().await {
            Ok(ip) => ip,
            Err(e) => return self.settle(Error::current_ip(e)),
        };

        self.cache.expire_if_stale(Instant::now());

        if self.cache.is_hit(ip) {
            debug!("IP ({}) matches cached IP, skipping", ip);
            self.emit_event(EngineEvent::PassSkipped { ip });
            return Ok(());
        }

        for domain in &self.domains {
            if let Err(e) = self.update_domain(domain, ip).await {
                return self.settle(Error::update_dns(e));
            }
        }

        self.cache.store(ip, Instant::now());
        self.emit_event(EngineEvent::PassCompleted { ip });
        Ok(())
    }

    /// Reconcile one domain's subdomains against `ip`
    ///
    /// # Returns
    ///
    /// The labels that were written, in configuration order.
    pub async fn update_domain(&self, domain: &Domain, ip: IpAddr) -> Result<Vec<String>> {
        let mut updated = Vec::new();

        for sub_domain in &domain.sub_domains {
            let hostname = domain.hostname(sub_domain);

            let last_ip = match self.resolver.resolve(&hostname, self.ip_type).await {
                Ok(resolved) => Some(resolved),
                Err(e) if e.is_missing_record() => {
                    error!("Failed to resolve DNS for domain: {}, error: {}", hostname, e);
                    self.emit_event(EngineEvent::RecordUnresolved {
                        hostname,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => {
                    // Resolver flakiness must not block propagation
                    warn!("Failed to resolve DNS for domain: {}, error: {}", hostname, e);
                    None
                }
            };

            if last_ip == Some(ip) {
                info!(
                    "IP is the same as the resolved one, skip update, domain: {}, current IP: {}",
                    hostname, ip
                );
                self.emit_event(EngineEvent::RecordUnchanged { hostname, ip });
                continue;
            }

            info!(
                "IP is different from the resolved one, do update, domain: {}, current IP: {}, resolved IP: {}",
                hostname,
                ip,
                display_ip(last_ip)
            );

            self.provider
                .update_record(&domain.domain_name, sub_domain, ip)
                .await?;

            updated.push(sub_domain.clone());
            self.emit_event(EngineEvent::RecordUpdated {
                hostname: hostname.clone(),
                new_ip: ip,
                previous_ip: last_ip,
            });

            if let Some(webhook) = &self.webhook {
                webhook.execute(&hostname, ip, last_ip).await?;
            }
        }

        if !updated.is_empty() {
            let message = format!("[ {} ] of {}", updated.join(", "), domain.domain_name);
            self.notifications.send(&message, ip).await;
            self.emit_event(EngineEvent::DomainUpdated {
                domain_name: domain.domain_name.clone(),
                sub_domains: updated.clone(),
                ip,
            });
        }

        Ok(updated)
    }

    /// Currently cached IP
    pub fn cached_ip(&self) -> Option<IpAddr> {
        self.cache.cached_ip()
    }

    /// Failure policy in effect
    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Apply the failure policy to an error that ended a pass
    fn settle(&self, err: Error) -> Result<()> {
        self.emit_event(EngineEvent::PassFailed {
            error: err.to_string(),
        });

        match self.run_mode {
            RunMode::Once => Err(err),
            RunMode::Daemon => {
                error!("{}", err);
                Ok(())
            }
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
            // Nobody listens; events are optional
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

fn display_ip(ip: Option<IpAddr>) -> String {
    ip.map(|ip| ip.to_string()).unwrap_or_default()
}
