use std::net::IpAddr;

use crate::common::cidr::Network;

/// A directive token and the networks it authorizes.
///
/// `ip4:`/`ip6:` carry exactly one network. `a`/`mx` carry one full-length
/// network per resolved address, possibly none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfEntry {
    pub entry: String,
    pub networks: Vec<Network>,
}

impl SpfEntry {
    pub fn new(entry: impl Into<String>, networks: Vec<Network>) -> Self {
        Self {
            entry: entry.into(),
            networks,
        }
    }

    /// Entry for a host expansion: every address becomes a /32 or /128.
    pub fn from_hosts(entry: impl Into<String>, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self::new(entry, addrs.into_iter().map(Network::host).collect())
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.networks.iter().any(|n| n.contains(ip))
    }
}

/// Which lookup a bare `a` or `mx` token defers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// A/AAAA of the record's own domain.
    A,
    /// MX of the record's own domain, then A/AAAA of each exchange.
    Mx,
}

impl HostKind {
    pub fn token(&self) -> &'static str {
        match self {
            HostKind::A => "a",
            HostKind::Mx => "mx",
        }
    }
}

/// One recognized term of a record, in record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `ip4:` or `ip6:` range, already resolved.
    Range(SpfEntry),
    /// `include:<domain>`.
    Include(String),
    /// Bare `a` or `mx`, resolved when the tree is built.
    Host(HostKind),
}
