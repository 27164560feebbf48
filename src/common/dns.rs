use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex};

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use thiserror::Error;
use tracing::debug;

use crate::config::ResolverSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnsError {
    #[error("NXDOMAIN: domain does not exist")]
    NxDomain,
    #[error("no records found")]
    NoRecords,
    #[error("SERVFAIL: server failure")]
    ServFail,
    #[error("timeout")]
    Timeout,
    #[error("DNS error: {0}")]
    Other(String),
}

/// DNS resolver trait for abstracting DNS lookups
pub trait DnsResolver: Clone + Send + Sync + 'static {
    fn query_txt(&self, domain: &str) -> impl Future<Output = Result<Vec<String>, DnsError>> + Send;
    fn query_a(&self, domain: &str) -> impl Future<Output = Result<Vec<Ipv4Addr>, DnsError>> + Send;
    fn query_aaaa(&self, domain: &str) -> impl Future<Output = Result<Vec<Ipv6Addr>, DnsError>> + Send;
    fn query_mx(&self, domain: &str) -> impl Future<Output = Result<Vec<(u16, String)>, DnsError>> + Send;
}

/// Look up every address of `host`, IPv4 first.
///
/// Fails only when both families fail; a host with just A or just AAAA
/// records is a success.
pub async fn resolve_host<R: DnsResolver>(resolver: &R, host: &str) -> Result<Vec<IpAddr>, DnsError> {
    let v4 = resolver.query_a(host).await;
    let v6 = resolver.query_aaaa(host).await;

    match (v4, v6) {
        (Err(e), Err(_)) => Err(e),
        (v4, v6) => {
            let mut addrs: Vec<IpAddr> = v4.unwrap_or_default().into_iter().map(IpAddr::V4).collect();
            addrs.extend(v6.unwrap_or_default().into_iter().map(IpAddr::V6));
            Ok(addrs)
        }
    }
}

/// Hickory DNS resolver implementation
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Resolver backed by the platform configuration (`/etc/resolv.conf` or equivalent).
    pub fn new() -> Result<Self, DnsError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| DnsError::Other(e.to_string()))?
            .build();
        Ok(Self { resolver })
    }

    pub fn with_config(config: ResolverConfig, opts: ResolverOpts) -> Self {
        let resolver = TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();
        Self { resolver }
    }

    /// Build from explicit settings. Without an endpoint this is [`HickoryResolver::new`].
    pub fn from_settings(settings: &ResolverSettings) -> Result<Self, DnsError> {
        let Some(endpoint) = settings.endpoint else {
            return Self::new();
        };

        debug!(%endpoint, timeout = ?settings.timeout, "using custom DNS endpoint");
        let servers = NameServerConfigGroup::from_ips_clear(&[endpoint.ip()], endpoint.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = settings.timeout;
        opts.attempts = 1;
        Ok(Self::with_config(config, opts))
    }

    fn classify_error(e: &hickory_resolver::ResolveError) -> DnsError {
        let msg = e.to_string().to_lowercase();
        if msg.contains("nxdomain") {
            DnsError::NxDomain
        } else if msg.contains("no record") {
            DnsError::NoRecords
        } else if msg.contains("timeout") || msg.contains("timed out") {
            DnsError::Timeout
        } else if msg.contains("servfail") {
            DnsError::ServFail
        } else {
            DnsError::Other(e.to_string())
        }
    }
}

impl DnsResolver for HickoryResolver {
    async fn query_txt(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        match self.resolver.txt_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().map(|txt| txt.to_string()).collect()),
            Err(e) => Err(Self::classify_error(&e)),
        }
    }

    async fn query_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        match self.resolver.ipv4_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().map(|a| a.0).collect()),
            Err(e) => Err(Self::classify_error(&e)),
        }
    }

    async fn query_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, DnsError> {
        match self.resolver.ipv6_lookup(domain).await {
            Ok(lookup) => Ok(lookup.iter().map(|a| a.0).collect()),
            Err(e) => Err(Self::classify_error(&e)),
        }
    }

    async fn query_mx(&self, domain: &str) -> Result<Vec<(u16, String)>, DnsError> {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => {
                let records: Vec<(u16, String)> = lookup
                    .iter()
                    .map(|mx| (mx.preference(), mx.exchange().to_string().trim_end_matches('.').to_string()))
                    .collect();
                Ok(records)
            }
            Err(e) => Err(Self::classify_error(&e)),
        }
    }
}

/// Mock DNS resolver for testing
#[derive(Clone, Default)]
pub struct MockResolver {
    txt_records: Arc<Mutex<HashMap<String, Vec<String>>>>,
    a_records: Arc<Mutex<HashMap<String, Vec<Ipv4Addr>>>>,
    aaaa_records: Arc<Mutex<HashMap<String, Vec<Ipv6Addr>>>>,
    mx_records: Arc<Mutex<HashMap<String, Vec<(u16, String)>>>>,
    failures: Arc<Mutex<HashMap<String, DnsError>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_txt(&self, domain: &str, records: Vec<&str>) {
        let records = records.into_iter().map(String::from).collect();
        self.txt_records.lock().unwrap().insert(domain.to_lowercase(), records);
    }

    pub fn add_a(&self, domain: &str, addrs: Vec<Ipv4Addr>) {
        self.a_records.lock().unwrap().insert(domain.to_lowercase(), addrs);
    }

    pub fn add_aaaa(&self, domain: &str, addrs: Vec<Ipv6Addr>) {
        self.aaaa_records.lock().unwrap().insert(domain.to_lowercase(), addrs);
    }

    pub fn add_mx(&self, domain: &str, records: Vec<(u16, &str)>) {
        let records = records.into_iter().map(|(p, h)| (p, h.to_string())).collect();
        self.mx_records.lock().unwrap().insert(domain.to_lowercase(), records);
    }

    /// Every query for `domain`, of any type, fails with `err`.
    pub fn set_error(&self, domain: &str, err: DnsError) {
        self.failures.lock().unwrap().insert(domain.to_lowercase(), err);
    }

    pub fn set_nxdomain(&self, domain: &str) {
        self.set_error(domain, DnsError::NxDomain);
    }

    /// Queries issued so far, as `TYPE name`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn lookup<T: Clone>(
        &self,
        rtype: &str,
        domain: &str,
        table: &Mutex<HashMap<String, Vec<T>>>,
    ) -> Result<Vec<T>, DnsError> {
        let domain_lower = domain.to_lowercase();
        self.queries.lock().unwrap().push(format!("{} {}", rtype, domain_lower));
        if let Some(err) = self.failures.lock().unwrap().get(&domain_lower) {
            return Err(err.clone());
        }
        match table.lock().unwrap().get(&domain_lower) {
            Some(records) => Ok(records.clone()),
            None => Err(DnsError::NoRecords),
        }
    }
}

impl DnsResolver for MockResolver {
    async fn query_txt(&self, domain: &str) -> Result<Vec<String>, DnsError> {
        self.lookup("TXT", domain, &*self.txt_records)
    }

    async fn query_a(&self, domain: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        self.lookup("A", domain, &*self.a_records)
    }

    async fn query_aaaa(&self, domain: &str) -> Result<Vec<Ipv6Addr>, DnsError> {
        self.lookup("AAAA", domain, &*self.aaaa_records)
    }

    async fn query_mx(&self, domain: &str) -> Result<Vec<(u16, String)>, DnsError> {
        self.lookup("MX", domain, &*self.mx_records)
    }
}
