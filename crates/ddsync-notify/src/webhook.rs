//! HTTP webhook fired after each record write
//!
//! Placeholders, substituted verbatim:
//!
//! | Placeholder     | Value                                  |
//! |-----------------|----------------------------------------|
//! | `{domain}`      | hostname that was written              |
//! | `{current_ip}`  | new address                            |
//! | `{previous_ip}` | published address, empty when unknown  |
//! | `{ip_type}`     | `IPv4` or `IPv6`                       |
//!
//! Without a body template the rendered URL is fetched with GET. With one,
//! the rendered body is POSTed as JSON to the rendered URL.

use crate::http_client;
use ddsync_core::config::WebhookConfig;
use ddsync_core::traits::WebhookExecutor;
use ddsync_core::{Error, IpType, Result};
use std::net::IpAddr;
use tracing::{debug, info};

/// Webhook executor over HTTP
#[derive(Debug)]
pub struct HttpWebhook {
    url: String,
    request_body: Option<String>,
    client: reqwest::Client,
}

impl HttpWebhook {
    /// Create a webhook from its configuration
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        config.validate()?;
        if config.url.is_empty() {
            return Err(Error::config("Webhook URL cannot be empty"));
        }

        Ok(Self {
            url: config.url.clone(),
            request_body: config
                .request_body
                .clone()
                .filter(|body| !body.trim().is_empty()),
            client: http_client()?,
        })
    }
}

#[async_trait::async_trait]
impl WebhookExecutor for HttpWebhook {
    async fn execute(&self, hostname: &str, new_ip: IpAddr, previous_ip: Option<IpAddr>) -> Result<()> {
        let url = render_template(&self.url, hostname, new_ip, previous_ip);

        let request = match &self.request_body {
            Some(template) => {
                let body = render_template(template, hostname, new_ip, previous_ip);
                debug!("Webhook POST {} with body {}", url, body);
                self.client
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
            }
            None => {
                debug!("Webhook GET {}", url);
                self.client.get(&url)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::webhook(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::webhook(format!(
                "Webhook answered {} for {}: {}",
                status, hostname, text
            )));
        }

        info!("Webhook executed for {}, status: {}", hostname, status);
        Ok(())
    }
}

/// Substitute the webhook placeholders in `template`
pub fn render_template(
    template: &str,
    hostname: &str,
    new_ip: IpAddr,
    previous_ip: Option<IpAddr>,
) -> String {
    let previous = previous_ip.map(|ip| ip.to_string()).unwrap_or_default();

    template
        .replace("{domain}", hostname)
        .replace("{current_ip}", &new_ip.to_string())
        .replace("{previous_ip}", &previous)
        .replace("{ip_type}", &IpType::of(&new_ip).to_string())
}
