// # Notifier Trait
//
// One delivery channel (chat, push, mail, ...). The engine never talks to a
// channel directly; it hands every message to the [`NotificationManager`],
// which fans it out and swallows delivery failures.

use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{debug, warn};

/// Trait for notification channel implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` about the new address `ip`
    async fn send(&self, message: &str, ip: IpAddr) -> Result<(), crate::Error>;

    /// Channel name (for logging)
    fn channel_name(&self) -> &'static str;
}

/// Fan-out over the configured notification channels
///
/// Sending is fire-and-forget from the caller's point of view: channel
/// errors are logged here and never returned.
#[derive(Default)]
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationManager {
    /// Create a manager with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Number of configured channels
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Whether no channel is configured
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Deliver a message on every channel, in registration order
    pub async fn send(&self, message: &str, ip: IpAddr) {
        for notifier in &self.notifiers {
            match notifier.send(message, ip).await {
                Ok(()) => debug!("Notification sent via {}", notifier.channel_name()),
                Err(e) => warn!(
                    "Failed to send notification via {}: {}",
                    notifier.channel_name(),
                    e
                ),
            }
        }
    }
}

impl std::fmt::Debug for NotificationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels: Vec<&str> = self.notifiers.iter().map(|n| n.channel_name()).collect();
        f.debug_struct("NotificationManager")
            .field("channels", &channels)
            .finish()
    }
}
