// Daemon configuration, read from environment variables only.
//
// ### Schedule
// - `DDSYNC_INTERVAL`: Seconds between passes (default 300)
// - `DDSYNC_RUN_ONCE`: `true` for a single pass that fails loudly
// - `DDSYNC_IP_CACHE_TIMEOUT`: Seconds before the cached IP is re-verified (default 900)
//
// ### Detection and resolution
// - `DDSYNC_IP_TYPE`: `v4` (default) or `v6`
// - `DDSYNC_IP_URLS`: Comma-separated lookup endpoints, tried in order
// - `DDSYNC_RESOLVER`: Resolver endpoint (`host` or `host:port`), system resolver otherwise
//
// ### Domains
// - `DDSYNC_DOMAINS`: `example.com:@,www;example.org:home`
//
// ### DNS Provider
// - `DDSYNC_PROVIDER`: Provider type (cloudflare)
// - `DDSYNC_PROVIDER_API_TOKEN`: API token
// - `DDSYNC_PROVIDER_ZONE_ID`: Zone ID (optional)
// - `DDSYNC_MODE`: `dry-run` to log writes without sending them
//
// ### Reports
// - `DDSYNC_WEBHOOK_URL`, `DDSYNC_WEBHOOK_BODY`: Webhook, enabled iff the URL is set;
//   a body without a URL is rejected
// - `DDSYNC_SLACK_WEBHOOK_URL`: Slack incoming webhook
// - `DDSYNC_TELEGRAM_BOT_TOKEN`, `DDSYNC_TELEGRAM_CHAT_ID`: Telegram bot
//
// ### Logging
// - `DDSYNC_LOG_LEVEL`: trace, debug, info (default), warn, error

use anyhow::{Context, Result};
use ddsync_core::config::{DEFAULT_INTERVAL_SECS, DEFAULT_IP_CACHE_TIMEOUT_SECS};
use ddsync_core::{Domain, IpType, ProviderConfig, ROOT_DOMAIN, Settings, WebhookConfig};
use std::str::FromStr;

/// Providers this build knows how to configure
const SUPPORTED_PROVIDERS: &[&str] = &["cloudflare"];

/// Application configuration
pub struct Config {
    pub interval_secs: u64,
    pub run_once: bool,
    pub ip_cache_timeout_secs: u64,
    pub ip_type: IpType,
    pub ip_urls: Vec<String>,
    pub resolver: Option<String>,
    pub domains: Vec<Domain>,
    pub provider_type: String,
    pub provider_api_token: String,
    pub provider_zone_id: Option<String>,
    pub dry_run: bool,
    pub webhook_url: Option<String>,
    pub webhook_body: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            interval_secs: parse_or(var("DDSYNC_INTERVAL"), "DDSYNC_INTERVAL", DEFAULT_INTERVAL_SECS)?,
            run_once: parse_bool(var("DDSYNC_RUN_ONCE"), "DDSYNC_RUN_ONCE")?,
            ip_cache_timeout_secs: parse_or(
                var("DDSYNC_IP_CACHE_TIMEOUT"),
                "DDSYNC_IP_CACHE_TIMEOUT",
                DEFAULT_IP_CACHE_TIMEOUT_SECS,
            )?,
            ip_type: match var("DDSYNC_IP_TYPE") {
                Some(s) => s.parse().context("DDSYNC_IP_TYPE")?,
                None => IpType::default(),
            },
            ip_urls: var("DDSYNC_IP_URLS")
                .map(|s| split_list(&s, ','))
                .unwrap_or_default(),
            resolver: var("DDSYNC_RESOLVER"),
            domains: var("DDSYNC_DOMAINS")
                .map(|s| parse_domains(&s))
                .transpose()?
                .unwrap_or_default(),
            provider_type: var("DDSYNC_PROVIDER").unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: var("DDSYNC_PROVIDER_API_TOKEN").unwrap_or_default(),
            provider_zone_id: var("DDSYNC_PROVIDER_ZONE_ID"),
            dry_run: var("DDSYNC_MODE").is_some_and(|m| m.eq_ignore_ascii_case("dry-run")),
            webhook_url: var("DDSYNC_WEBHOOK_URL"),
            webhook_body: var("DDSYNC_WEBHOOK_BODY"),
            slack_webhook_url: var("DDSYNC_SLACK_WEBHOOK_URL"),
            telegram_bot_token: var("DDSYNC_TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: var("DDSYNC_TELEGRAM_CHAT_ID"),
            log_level: var("DDSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Engine-level rules (intervals, domain shape, webhook URL) are checked
    /// by [`Settings::validate`]; this adds what only the daemon knows about.
    pub fn validate(&self) -> Result<()> {
        self.settings().validate()?;

        if self.provider_api_token.is_empty() {
            anyhow::bail!(
                "DDSYNC_PROVIDER_API_TOKEN is required. \
                Set it via: export DDSYNC_PROVIDER_API_TOKEN=your_token"
            );
        }

        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DDSYNC_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        if !SUPPORTED_PROVIDERS.contains(&self.provider_type.as_str()) {
            anyhow::bail!(
                "DDSYNC_PROVIDER '{}' is not supported. Supported providers: {}",
                self.provider_type,
                SUPPORTED_PROVIDERS.join(", ")
            );
        }

        for domain in &self.domains {
            validate_domain_name(&domain.domain_name)?;
            for label in domain.sub_domains.iter().filter(|l| *l != ROOT_DOMAIN) {
                validate_domain_name(label)
                    .with_context(|| format!("Invalid subdomain of {}", domain.domain_name))?;
            }
        }

        for url in &self.ip_urls {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                anyhow::bail!("DDSYNC_IP_URLS entries must use HTTP or HTTPS scheme. Got: {}", url);
            }
        }

        if let Some(url) = &self.slack_webhook_url
            && !url.starts_with("https://")
        {
            anyhow::bail!("DDSYNC_SLACK_WEBHOOK_URL must use HTTPS. Got: {}", url);
        }

        if self.webhook_body.is_some() && self.webhook_url.is_none() {
            anyhow::bail!("DDSYNC_WEBHOOK_BODY is set but DDSYNC_WEBHOOK_URL is not");
        }

        if self.telegram_bot_token.is_some() != self.telegram_chat_id.is_some() {
            anyhow::bail!(
                "DDSYNC_TELEGRAM_BOT_TOKEN and DDSYNC_TELEGRAM_CHAT_ID must be set together"
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Engine settings
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new(self.domains.clone());
        settings.interval_secs = self.interval_secs;
        settings.run_once = self.run_once;
        settings.resolver = self.resolver.clone();
        settings.ip_type = self.ip_type;
        settings.ip_cache_timeout_secs = self.ip_cache_timeout_secs;
        settings.webhook = WebhookConfig {
            enabled: self.webhook_url.is_some(),
            url: self.webhook_url.clone().unwrap_or_default(),
            request_body: self.webhook_body.clone(),
        };
        settings
    }

    /// Provider backend configuration
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::Cloudflare {
            api_token: self.provider_api_token.clone(),
            zone_id: self.provider_zone_id.clone(),
            dry_run: self.dry_run,
        }
    }
}

/// Parse `example.com:@,www;example.org:home`
///
/// A domain without a label list manages its apex only.
pub fn parse_domains(raw: &str) -> Result<Vec<Domain>> {
    split_list(raw, ';')
        .into_iter()
        .map(|entry| match entry.split_once(':') {
            Some((name, labels)) => {
                let name = name.trim();
                let labels = split_list(labels, ',');
                if name.is_empty() || labels.is_empty() {
                    anyhow::bail!("Malformed DDSYNC_DOMAINS entry: '{}'", entry);
                }
                Ok(Domain::new(name, labels))
            }
            None => Ok(Domain::new(entry, [ROOT_DOMAIN])),
        })
        .collect()
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number. Got: {}", key, v)),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> Result<bool> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("false" | "0" | "no") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some(other) => anyhow::bail!("{} must be true or false. Got: {}", key, other),
    }
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        // Wildcards are not resolvable, so '*' is rejected with the rest
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric, hyphen and underscore only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DDSYNC_DOMAINS", "example.com:@,www"),
            ("DDSYNC_PROVIDER_API_TOKEN", "cf-0123456789abcdef0123456789abcdef"),
        ]
    }

    #[test]
    fn test_parse_domains() {
        let domains = parse_domains("example.com:@,www; example.org : home ;apex.net").unwrap();
        assert_eq!(
            domains,
            vec![
                Domain::new("example.com", ["@", "www"]),
                Domain::new("example.org", ["home"]),
                Domain::new("apex.net", ["@"]),
            ]
        );
    }

    #[test]
    fn test_parse_domains_rejects_empty_labels() {
        assert!(parse_domains("example.com:").is_err());
        assert!(parse_domains(":www").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = load(&minimal()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.ip_cache_timeout_secs, 900);
        assert!(!config.run_once);
        assert!(!config.dry_run);
        assert_eq!(config.ip_type, IpType::V4);
        assert_eq!(config.provider_type, "cloudflare");

        let settings = config.settings();
        assert!(!settings.webhook.enabled);
        assert_eq!(settings.run_mode(), ddsync_core::RunMode::Daemon);
    }

    #[test]
    fn test_full_configuration() {
        let mut vars = minimal();
        vars.extend([
            ("DDSYNC_INTERVAL", "60"),
            ("DDSYNC_RUN_ONCE", "true"),
            ("DDSYNC_IP_TYPE", "v6"),
            ("DDSYNC_IP_URLS", "https://a.example.net, https://b.example.net"),
            ("DDSYNC_RESOLVER", "1.1.1.1:53"),
            ("DDSYNC_MODE", "DRY-RUN"),
            ("DDSYNC_WEBHOOK_URL", "https://hooks.example.net/{domain}"),
            ("DDSYNC_TELEGRAM_BOT_TOKEN", "123:ABC"),
            ("DDSYNC_TELEGRAM_CHAT_ID", "42"),
        ]);
        let config = load(&vars).unwrap();
        config.validate().unwrap();

        assert_eq!(config.ip_urls.len(), 2);
        assert!(config.dry_run);

        let settings = config.settings();
        assert_eq!(settings.interval_secs, 60);
        assert_eq!(settings.ip_type, IpType::V6);
        assert_eq!(settings.resolver.as_deref(), Some("1.1.1.1:53"));
        assert!(settings.webhook.enabled);
        assert_eq!(settings.run_mode(), ddsync_core::RunMode::Once);

        match config.provider_config() {
            ProviderConfig::Cloudflare { dry_run, .. } => assert!(dry_run),
            other => panic!("unexpected provider config {:?}", other),
        }
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        let mut vars = minimal();
        vars.push(("DDSYNC_INTERVAL", "five"));
        assert!(load(&vars).is_err());

        let mut vars = minimal();
        vars.push(("DDSYNC_RUN_ONCE", "maybe"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let config = load(&[("DDSYNC_DOMAINS", "example.com:@")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_domains_fails_validation() {
        let config = load(&[("DDSYNC_PROVIDER_API_TOKEN", "cf-0123456789abcdef")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let mut vars = minimal();
        vars.push(("DDSYNC_INTERVAL", "0"));
        assert!(load(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn test_unknown_provider_fails_validation() {
        let mut vars = minimal();
        vars.push(("DDSYNC_PROVIDER", "route53"));
        assert!(load(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn test_half_telegram_config_fails_validation() {
        let mut vars = minimal();
        vars.push(("DDSYNC_TELEGRAM_BOT_TOKEN", "123:ABC"));
        assert!(load(&vars).unwrap().validate().is_err());
    }

    #[test]
    fn test_webhook_body_without_url_fails_validation() {
        let mut vars = minimal();
        vars.push(("DDSYNC_WEBHOOK_BODY", r#"{"host":"{domain}"}"#));
        let err = load(&vars).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("DDSYNC_WEBHOOK_URL"));

        vars.push(("DDSYNC_WEBHOOK_URL", "https://hooks.example.net/ddns"));
        let config = load(&vars).unwrap();
        config.validate().unwrap();
        assert!(config.settings().webhook.enabled);
    }

    #[test]
    fn test_bad_subdomain_fails_validation() {
        let config = load(&[
            ("DDSYNC_DOMAINS", "example.com:bad label"),
            ("DDSYNC_PROVIDER_API_TOKEN", "cf-0123456789abcdef"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_domain_name() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("_acme.example.com").is_ok());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name(&"a".repeat(64)).is_err());
    }
}
