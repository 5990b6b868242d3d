//! Slack incoming-webhook channel

use crate::{chat_text, http_client};
use ddsync_core::traits::Notifier;
use ddsync_core::{Error, Result};
use std::net::IpAddr;

/// Posts change messages to a Slack incoming webhook
pub struct SlackNotifier {
    /// The webhook URL embeds its own secret
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        let webhook_url = webhook_url.into();
        if !webhook_url.starts_with("https://") && !webhook_url.starts_with("http://") {
            return Err(Error::config("Slack webhook URL must use HTTP or HTTPS scheme"));
        }

        Ok(Self {
            webhook_url,
            client: http_client()?,
        })
    }
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("webhook_url", &"<REDACTED>")
            .finish()
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, message: &str, ip: IpAddr) -> Result<()> {
        let payload = serde_json::json!({ "text": chat_text(message, ip) });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::notification(format!("Slack request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(Error::notification(format!(
                "Slack answered {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "slack"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_posts_text_payload() {
        let server = MockServer::start().await;
        let expected_body = json!({
            "text": "DNS updated: [ @, www ] of example.com now points to 203.0.113.10"
        });

        Mock::given(method("POST"))
            .and(path("/services/T000/B000/XXX"))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let slack = SlackNotifier::new(format!("{}/services/T000/B000/XXX", server.uri())).unwrap();

        slack
            .send("[ @, www ] of example.com", "203.0.113.10".parse().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid_token"))
            .mount(&server)
            .await;

        let slack = SlackNotifier::new(server.uri()).unwrap();

        let err = slack
            .send("[ www ] of example.com", "203.0.113.10".parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Notification(_)));
    }

    #[test]
    fn test_url_not_exposed_in_debug() {
        let slack = SlackNotifier::new("https://hooks.slack.com/services/T000/B000/SECRET").unwrap();
        assert!(!format!("{:?}", slack).contains("SECRET"));
    }
}
