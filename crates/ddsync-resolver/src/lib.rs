// # DNS Resolver
//
// Read path of the reconciliation loop: asks a recursive resolver which
// address a hostname currently publishes, so the engine only writes records
// that actually differ.
//
// ## Resolver Selection
//
// - With an endpoint (`"1.1.1.1"`, `"1.1.1.1:5353"`, `"[2606:4700::1111]"`,
//   `"dns.example.net:53"`), that server is queried exclusively
// - Without one, the system configuration is used; if it lists no servers
//   the resolver falls back to Cloudflare's public servers
//
// Port 53 is assumed when the endpoint omits one.

use ddsync_core::traits::{DnsResolver, ResolveError};
use ddsync_core::{Error, IpType, Result};

use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{ResolveError as LookupError, TokioResolver, system_conf};

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tracing::{debug, warn};

/// Default DNS port
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Per-query timeout
const QUERY_TIMEOUT_SECS: u64 = 5;

/// Resolver backed by hickory
pub struct HickoryResolver {
    resolver: TokioResolver,

    /// Servers queried, for logging
    name_servers: Vec<SocketAddr>,
}

impl HickoryResolver {
    /// Create a resolver
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Resolver to query exclusively, or `None` for the system one
    pub async fn new(endpoint: Option<&str>) -> Result<Self> {
        let config = match endpoint {
            Some(endpoint) => {
                let addr = lookup_endpoint(endpoint).await?;
                let mut config = ResolverConfig::new();
                config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));
                config.add_name_server(NameServerConfig::new(addr, Protocol::Tcp));
                config
            }
            None => system_config(),
        };

        // Search domains would turn "www.example.com" into something else
        let mut bare = ResolverConfig::new();
        for ns in config.name_servers() {
            bare.add_name_server(ns.clone());
        }

        let mut name_servers: Vec<SocketAddr> =
            bare.name_servers().iter().map(|ns| ns.socket_addr).collect();
        name_servers.sort();
        name_servers.dedup();

        let mut opts = ResolverOpts::default();
        opts.ndots = 1;
        opts.timeout = Duration::from_secs(QUERY_TIMEOUT_SECS);

        let resolver = TokioResolver::builder_with_config(bare, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        debug!("DNS resolver using name servers {:?}", name_servers);

        Ok(Self {
            resolver,
            name_servers,
        })
    }

    /// Name servers this resolver queries
    pub fn name_servers(&self) -> &[SocketAddr] {
        &self.name_servers
    }
}

#[async_trait::async_trait]
impl DnsResolver for HickoryResolver {
    async fn resolve(
        &self,
        hostname: &str,
        ip_type: IpType,
    ) -> std::result::Result<IpAddr, ResolveError> {
        let record_type = match ip_type {
            IpType::V4 => RecordType::A,
            IpType::V6 => RecordType::AAAA,
        };

        let lookup = self
            .resolver
            .lookup(hostname, record_type)
            .await
            .map_err(classify)?;

        first_of_family(lookup.iter().filter_map(|r| r.ip_addr()), ip_type)
    }
}

/// Map a hickory failure onto the engine's view of it
fn classify(err: LookupError) -> ResolveError {
    if err.is_nx_domain() {
        ResolveError::NxDomain
    } else if err.is_no_records_found() {
        ResolveError::EmptyResult
    } else {
        ResolveError::other(err.to_string())
    }
}

/// First address of the wanted family, in answer order
fn first_of_family(
    ips: impl IntoIterator<Item = IpAddr>,
    ip_type: IpType,
) -> std::result::Result<IpAddr, ResolveError> {
    ips.into_iter()
        .find(|ip| ip_type.matches(ip))
        .ok_or(ResolveError::EmptyResult)
}

/// System resolver configuration, or Cloudflare when it has no servers
fn system_config() -> ResolverConfig {
    match system_conf::read_system_conf() {
        Ok((config, _)) if !config.name_servers().is_empty() => config,
        Ok(_) => {
            warn!("No system DNS servers found, falling back to Cloudflare DNS");
            ResolverConfig::cloudflare()
        }
        Err(e) => {
            warn!("Failed to read system DNS configuration ({}), falling back to Cloudflare DNS", e);
            ResolverConfig::cloudflare()
        }
    }
}

/// Split an endpoint into host and port
///
/// Accepts `host`, `host:port`, a bare IPv6 literal, or `[v6]:port`.
pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(Error::config("Resolver endpoint cannot be empty"));
    }

    if let Ok(addr) = endpoint.parse::<SocketAddr>() {
        return Ok((addr.ip().to_string(), addr.port()));
    }

    if let Ok(ip) = endpoint.parse::<IpAddr>() {
        return Ok((ip.to_string(), DEFAULT_DNS_PORT));
    }

    if let Some(inner) = endpoint.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let ip: IpAddr = inner
            .parse()
            .map_err(|_| Error::config(format!("Invalid resolver address: {}", endpoint)))?;
        return Ok((ip.to_string(), DEFAULT_DNS_PORT));
    }

    match endpoint.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| Error::config(format!("Invalid resolver port: {}", endpoint)))?;
            if host.is_empty() {
                return Err(Error::config(format!("Missing resolver host: {}", endpoint)));
            }
            Ok((host.to_string(), port))
        }
        None => Ok((endpoint.to_string(), DEFAULT_DNS_PORT)),
    }
}

/// Resolve an endpoint to the socket address of the server
async fn lookup_endpoint(endpoint: &str) -> Result<SocketAddr> {
    let (host, port) = parse_endpoint(endpoint)?;

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| Error::config(format!("Failed to look up resolver {}: {}", host, e)))?
        .next()
        .ok_or_else(|| Error::config(format!("Resolver {} has no addresses", host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_endpoint_defaults_port() {
        assert_eq!(parse_endpoint("1.1.1.1").unwrap(), ("1.1.1.1".to_string(), 53));
        assert_eq!(
            parse_endpoint("dns.example.net").unwrap(),
            ("dns.example.net".to_string(), 53)
        );
    }

    #[test]
    fn test_parse_endpoint_explicit_port() {
        assert_eq!(
            parse_endpoint("9.9.9.9:5353").unwrap(),
            ("9.9.9.9".to_string(), 5353)
        );
        assert_eq!(
            parse_endpoint("dns.example.net:853").unwrap(),
            ("dns.example.net".to_string(), 853)
        );
    }

    #[test]
    fn test_parse_endpoint_ipv6() {
        assert_eq!(
            parse_endpoint("2606:4700:4700::1111").unwrap(),
            ("2606:4700:4700::1111".to_string(), 53)
        );
        assert_eq!(
            parse_endpoint("[2606:4700:4700::1111]").unwrap(),
            ("2606:4700:4700::1111".to_string(), 53)
        );
        assert_eq!(
            parse_endpoint("[2606:4700:4700::1111]:5353").unwrap(),
            ("2606:4700:4700::1111".to_string(), 5353)
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_garbage() {
        assert!(parse_endpoint("").is_err());
        assert!(parse_endpoint("1.1.1.1:dns").is_err());
        assert!(parse_endpoint(":53").is_err());
        assert!(parse_endpoint("1.1.1.1:70000").is_err());
    }

    #[test]
    fn test_first_of_family_filters() {
        let answers = vec![ip("2001:db8::1"), ip("192.0.2.1"), ip("192.0.2.2")];

        assert_eq!(
            first_of_family(answers.clone(), IpType::V4),
            Ok(ip("192.0.2.1"))
        );
        assert_eq!(first_of_family(answers, IpType::V6), Ok(ip("2001:db8::1")));
        assert_eq!(
            first_of_family(Vec::new(), IpType::V4),
            Err(ResolveError::EmptyResult)
        );
    }

    #[tokio::test]
    async fn test_new_with_ip_endpoint() {
        let resolver = HickoryResolver::new(Some("192.0.2.53:5353")).await.unwrap();
        assert_eq!(
            resolver.name_servers(),
            &["192.0.2.53:5353".parse::<SocketAddr>().unwrap()]
        );
    }
}
