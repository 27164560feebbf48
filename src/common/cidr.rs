use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// An address-family-tagged network prefix: base address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Network {
    pub addr: IpAddr,
    pub prefix: u8,
}

impl Network {
    /// Full-length network for a single host (/32 or /128).
    pub fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix: family_width(addr),
        }
    }

    /// Returns `None` if `prefix` exceeds the address family width.
    pub fn new(addr: IpAddr, prefix: u8) -> Option<Self> {
        (prefix <= family_width(addr)).then_some(Self { addr, prefix })
    }

    /// The netmask as an address of the same family.
    pub fn mask(&self) -> IpAddr {
        match self.addr {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(ip4_mask(self.prefix))),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(ip6_mask(self.prefix))),
        }
    }

    /// IPv4 networks also contain the IPv4-mapped IPv6 form of their addresses.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => ip4_in_network(ip, net, self.prefix),
            (IpAddr::V6(net), IpAddr::V6(ip)) => ip6_in_network(ip, net, self.prefix),
            (IpAddr::V4(net), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|ip| ip4_in_network(ip, net, self.prefix)),
            (IpAddr::V6(_), IpAddr::V4(_)) => false,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

fn family_width(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn ip4_mask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= 32 => !0,
        p => !0u32 << (32 - p),
    }
}

fn ip6_mask(prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p if p >= 128 => !0,
        p => !0u128 << (128 - p),
    }
}

/// Check if an IPv4 address falls within a network/prefix.
/// prefix=0 matches all. prefix>32 matches none.
pub fn ip4_in_network(ip: Ipv4Addr, network: Ipv4Addr, prefix: u8) -> bool {
    if prefix > 32 {
        return false;
    }
    let mask = ip4_mask(prefix);
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

/// Check if an IPv6 address falls within a network/prefix.
/// prefix=0 matches all. prefix>128 matches none.
pub fn ip6_in_network(ip: Ipv6Addr, network: Ipv6Addr, prefix: u8) -> bool {
    if prefix > 128 {
        return false;
    }
    let mask = ip6_mask(prefix);
    (u128::from(ip) & mask) == (u128::from(network) & mask)
}
