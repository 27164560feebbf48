//! Resolver configuration.
//!
//! Settings are a plain value handed to [`HickoryResolver::from_settings`]
//! when the resolver is built. Nothing here is global; two resolvers with
//! different endpoints can run side by side.
//!
//! [`HickoryResolver::from_settings`]: crate::common::dns::HickoryResolver::from_settings

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::spf::SpfError;

pub const DNS_PORT: u16 = 53;

/// Per-exchange timeout used with an explicit endpoint.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// `None` uses the platform resolver configuration.
    pub endpoint: Option<SocketAddr>,
    pub timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ResolverSettings {
    /// Send every query to `endpoint` (`host`, `host:port` or `[v6]:port`).
    /// The host must be an IP address literal.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, SpfError> {
        Ok(Self {
            endpoint: Some(parse_endpoint(endpoint)?),
            ..Self::default()
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_endpoint(endpoint: &str) -> Result<SocketAddr, SpfError> {
    let invalid = || SpfError::InvalidResolver {
        resolver: endpoint.to_string(),
    };

    let trimmed = endpoint.trim();
    if let Ok(addr) = trimmed.parse::<SocketAddr>() {
        return Ok(addr);
    }
    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| invalid())
}
