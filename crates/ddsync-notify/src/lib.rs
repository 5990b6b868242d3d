// # ddsync-notify
//
// Outbound change reports:
// - [`HttpWebhook`]: one templated HTTP call per written record
// - [`SlackNotifier`], [`TelegramNotifier`]: chat channels fed by the
//   engine's `NotificationManager`, one message per updated domain
//
// Every request is a single attempt with a timeout. Webhook failures abort
// the pass; channel failures are swallowed by the manager.

mod slack;
mod telegram;
mod webhook;

pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::{HttpWebhook, render_template};

use ddsync_core::{Error, Result};
use std::time::Duration;

/// Per-request timeout for every outbound call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Text shared by the chat channels
fn chat_text(message: &str, ip: std::net::IpAddr) -> String {
    format!("DNS updated: {} now points to {}", message, ip)
}
