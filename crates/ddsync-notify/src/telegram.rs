//! Telegram bot channel

use crate::{chat_text, http_client};
use ddsync_core::traits::Notifier;
use ddsync_core::{Error, Result};
use std::net::IpAddr;

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends change messages through a Telegram bot
pub struct TelegramNotifier {
    /// Bot token
    /// ⚠️ NEVER log this value; it is part of every request URL
    bot_token: String,
    chat_id: String,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();

        if bot_token.is_empty() {
            return Err(Error::config("Telegram bot token cannot be empty"));
        }
        if chat_id.is_empty() {
            return Err(Error::config("Telegram chat ID cannot be empty"));
        }

        Ok(Self {
            bot_token,
            chat_id,
            api_base: TELEGRAM_API_BASE.to_string(),
            client: http_client()?,
        })
    }

    /// Point the notifier at another API base (e.g., a local mock)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str, ip: IpAddr) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": chat_text(message, ip),
        });

        // reqwest errors carry the URL, and with it the token
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                Error::notification(format!("Telegram request failed: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            return Err(Error::notification(format!(
                "Telegram answered {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "telegram"
    }
}
