//! Domain model: what to keep in sync
//!
//! A [`Domain`] is a zone name plus an ordered list of subdomain labels. The
//! label [`ROOT_DOMAIN`] stands for the zone apex itself.

use serde::{Deserialize, Serialize};

/// Subdomain label that denotes the bare domain
pub const ROOT_DOMAIN: &str = "@";

/// Fully qualified hostname of `sub_domain` under `domain_name`
///
/// [`ROOT_DOMAIN`] maps to the bare domain.
pub fn fqdn(domain_name: &str, sub_domain: &str) -> String {
    if sub_domain == ROOT_DOMAIN {
        domain_name.to_string()
    } else {
        format!("{}.{}", sub_domain, domain_name)
    }
}

/// A domain and the subdomain labels managed under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Zone name (e.g., "example.com")
    pub domain_name: String,

    /// Subdomain labels, processed in this order
    pub sub_domains: Vec<String>,
}

impl Domain {
    /// Create a new domain
    pub fn new<I, S>(domain_name: impl Into<String>, sub_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain_name: domain_name.into(),
            sub_domains: sub_domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Fully qualified hostname for a subdomain label
    pub fn hostname(&self, sub_domain: &str) -> String {
        fqdn(&self.domain_name, sub_domain)
    }

    /// Validate the domain
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain_name.trim().is_empty() {
            return Err(crate::Error::config("Domain name cannot be empty"));
        }
        if self.sub_domains.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain {} has no subdomains configured",
                self.domain_name
            )));
        }
        if self.sub_domains.iter().any(|s| s.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Domain {} has an empty subdomain label",
                self.domain_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_marker_is_bare_domain() {
        let domain = Domain::new("example.com", ["@"]);
        assert_eq!(domain.hostname(ROOT_DOMAIN), "example.com");
    }

    #[test]
    fn test_fqdn_matches_hostname() {
        let domain = Domain::new("example.org", ["@", "home"]);
        for sub in &domain.sub_domains {
            assert_eq!(fqdn("example.org", sub), domain.hostname(sub));
        }
        assert_eq!(fqdn("example.org", ROOT_DOMAIN), "example.org");
    }

    #[test]
    fn test_label_is_prefixed() {
        let domain = Domain::new("example.com", ["www", "home"]);
        assert_eq!(domain.hostname("www"), "www.example.com");
        assert_eq!(domain.hostname("home"), "home.example.com");
    }

    #[test]
    fn test_validate() {
        assert!(Domain::new("example.com", ["@"]).validate().is_ok());
        assert!(Domain::new("", ["@"]).validate().is_err());
        assert!(Domain::new("example.com", Vec::<String>::new()).validate().is_err());
        assert!(Domain::new("example.com", ["www", " "]).validate().is_err());
    }
}
