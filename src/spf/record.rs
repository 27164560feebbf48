//! SPF record parsing.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::mechanism::{HostKind, SpfEntry, Term};
use super::SpfError;
use crate::common::cidr::Network;

/// Policy used when a record never sets one.
pub const NEUTRAL_POLICY: &str = "neutral";

/// Minimum token count: version, one mechanism, terminal policy.
const MIN_TOKENS: usize = 3;

/// One record, split into its recognized terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub version: String,
    /// Last token of the record, whatever it is.
    pub policy: String,
    pub terms: Vec<Term>,
    /// Tokens that looked like ranges but could not be parsed.
    pub errors: Vec<SpfError>,
}

impl ParsedRecord {
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::Include(domain) => Some(domain.as_str()),
            _ => None,
        })
    }
}

/// Parse the record published by `domain`.
///
/// Unknown tokens are ignored. A malformed `ip4:`/`ip6:` token is reported
/// in `errors` and contributes nothing; only a record that is too short
/// fails outright.
pub fn parse_record(record: &str, domain: &str) -> Result<ParsedRecord, SpfError> {
    let parts: Vec<&str> = record.split_whitespace().collect();

    if parts.len() < MIN_TOKENS {
        return Err(SpfError::RecordInvalid {
            domain: domain.to_string(),
            record: record.to_string(),
        });
    }

    let mut parsed = ParsedRecord {
        version: String::new(),
        policy: parts[parts.len() - 1].to_string(),
        terms: Vec::new(),
        errors: Vec::new(),
    };

    for part in parts {
        if parsed.version.is_empty() && part.contains("v=") {
            parsed.version = part.to_string();
        }

        match parse_term(part) {
            Ok(Some(term)) => parsed.terms.push(term),
            Ok(None) => {}
            Err(reason) => parsed.errors.push(SpfError::InvalidMechanism {
                domain: domain.to_string(),
                entry: part.to_string(),
                reason,
            }),
        }
    }

    Ok(parsed)
}

fn parse_term(part: &str) -> Result<Option<Term>, String> {
    let lower = part.to_ascii_lowercase();

    if let Some(rest) = strip_prefix_at(part, &lower, "ip4:") {
        return parse_ip4(rest).map(|net| Some(Term::Range(SpfEntry::new(part, vec![net]))));
    }

    if let Some(rest) = strip_prefix_at(part, &lower, "ip6:") {
        return parse_ip6(rest).map(|net| Some(Term::Range(SpfEntry::new(part, vec![net]))));
    }

    if let Some(domain) = strip_prefix_at(part, &lower, "include:") {
        if domain.is_empty() {
            return Err("include requires domain".into());
        }
        return Ok(Some(Term::Include(domain.to_string())));
    }

    match lower.as_str() {
        "a" => Ok(Some(Term::Host(HostKind::A))),
        "mx" => Ok(Some(Term::Host(HostKind::Mx))),
        _ => Ok(None),
    }
}

/// Case-insensitive prefix match that returns the rest of the original token.
fn strip_prefix_at<'a>(original: &'a str, lower: &str, prefix: &str) -> Option<&'a str> {
    lower.starts_with(prefix).then(|| &original[prefix.len()..])
}

fn split_prefix(s: &str) -> Result<(&str, Option<u8>), String> {
    match s.split_once('/') {
        Some((addr, p)) => {
            let prefix: u8 = p.parse().map_err(|_| format!("invalid prefix: {}", p))?;
            Ok((addr, Some(prefix)))
        }
        None => Ok((s, None)),
    }
}

fn parse_ip4(s: &str) -> Result<Network, String> {
    let (addr_str, prefix) = split_prefix(s)?;
    let addr: Ipv4Addr = addr_str
        .parse()
        .map_err(|_| format!("invalid IPv4: {}", addr_str))?;

    Network::new(IpAddr::V4(addr), prefix.unwrap_or(32)).ok_or_else(|| "IPv4 prefix > 32".into())
}

fn parse_ip6(s: &str) -> Result<Network, String> {
    let (addr_str, prefix) = split_prefix(s)?;
    let addr: Ipv6Addr = addr_str
        .parse()
        .map_err(|_| format!("invalid IPv6: {}", addr_str))?;

    Network::new(IpAddr::V6(addr), prefix.unwrap_or(128)).ok_or_else(|| "IPv6 prefix > 128".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(term: &Term) -> &SpfEntry {
        match term {
            Term::Range(entry) => entry,
            other => panic!("expected range, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_minimal_rejected() {
        let err = parse_record("v=spf1 -all", "example.com").unwrap_err();
        assert_eq!(
            err,
            SpfError::RecordInvalid {
                domain: "example.com".into(),
                record: "v=spf1 -all".into(),
            }
        );
    }

    #[test]
    fn test_parse_empty_rejected() {
        assert!(parse_record("", "example.com").is_err());
        assert!(parse_record("   ", "example.com").is_err());
    }

    #[test]
    fn test_parse_version_and_policy() {
        let record = parse_record("v=spf1 include:_spf.example.net ~all", "example.org").unwrap();
        assert_eq!(record.version, "v=spf1");
        assert_eq!(record.policy, "~all");
        assert_eq!(record.includes().collect::<Vec<_>>(), vec!["_spf.example.net"]);
        assert!(record.errors.is_empty());
    }

    #[test]
    fn test_policy_is_last_token_even_if_unrecognized() {
        let record = parse_record("v=spf1 ip4:192.0.2.1 include:a.example", "example.com").unwrap();
        assert_eq!(record.policy, "include:a.example");
    }

    #[test]
    fn test_parse_ip4_default_prefix() {
        let record = parse_record("v=spf1 ip4:203.0.113.5 -all", "example.com").unwrap();
        let entry = range(&record.terms[0]);
        assert_eq!(entry.entry, "ip4:203.0.113.5");
        assert_eq!(entry.networks, vec![Network::new("203.0.113.5".parse().unwrap(), 32).unwrap()]);
    }

    #[test]
    fn test_parse_ip4_explicit_prefix() {
        let record = parse_record("v=spf1 ip4:127.0.0.1/16 ~all", "example.com").unwrap();
        let net = range(&record.terms[0]).networks[0];
        assert_eq!(net.prefix, 16);
        assert_eq!(net.mask(), "255.255.0.0".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_parse_ip6() {
        let record = parse_record("v=spf1 ip6:2001:db8::/32 ip6:2001:db8::1 -all", "example.com").unwrap();
        assert_eq!(range(&record.terms[0]).networks[0].prefix, 32);
        assert_eq!(range(&record.terms[1]).networks[0].prefix, 128);
    }

    #[test]
    fn test_parse_case_insensitive() {
        let record = parse_record("v=spf1 IP4:192.0.2.1 INCLUDE:Other.Example MX -ALL", "example.com").unwrap();
        assert_eq!(record.terms.len(), 3);
        assert_eq!(record.terms[1], Term::Include("Other.Example".into()));
        assert_eq!(record.terms[2], Term::Host(HostKind::Mx));
    }

    #[test]
    fn test_terms_keep_record_order() {
        let record = parse_record("v=spf1 mx ip4:192.0.2.0/24 a include:x.example ip6:::1 -all", "example.com").unwrap();
        let kinds: Vec<&str> = record
            .terms
            .iter()
            .map(|t| match t {
                Term::Range(e) => e.entry.as_str(),
                Term::Include(_) => "include",
                Term::Host(k) => k.token(),
            })
            .collect();
        assert_eq!(kinds, vec!["mx", "ip4:192.0.2.0/24", "a", "include", "ip6:::1"]);
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let record = parse_record("v=spf1 ptr exists:x.example a:other.example mx/24 ?all", "example.com").unwrap();
        assert!(record.terms.is_empty());
        assert!(record.errors.is_empty());
        assert_eq!(record.policy, "?all");
    }

    #[test]
    fn test_bad_prefix_is_soft_error() {
        let record = parse_record("v=spf1 ip4:192.0.2.0/abc ip4:192.0.2.9 -all", "example.com").unwrap();
        assert_eq!(record.terms.len(), 1);
        assert_eq!(record.errors.len(), 1);
        assert!(matches!(
            &record.errors[0],
            SpfError::InvalidMechanism { entry, .. } if entry == "ip4:192.0.2.0/abc"
        ));
    }

    #[test]
    fn test_oversized_prefix_is_soft_error() {
        let record = parse_record("v=spf1 ip4:192.0.2.0/33 ip6:::/129 -all", "example.com").unwrap();
        assert!(record.terms.is_empty());
        assert_eq!(record.errors.len(), 2);
    }

    #[test]
    fn test_bad_address_is_soft_error() {
        let record = parse_record("v=spf1 ip4:2001:db8::1 ip6:not-an-ip include: -all", "example.com").unwrap();
        assert!(record.terms.is_empty());
        assert_eq!(record.errors.len(), 3);
    }

    #[test]
    fn test_explicit_prefix_mask_bits() {
        for n in [0u8, 1, 8, 16, 24, 31, 32] {
            let record = parse_record(&format!("v=spf1 ip4:10.0.0.0/{} -all", n), "example.com").unwrap();
            let IpAddr::V4(mask) = range(&record.terms[0]).networks[0].mask() else {
                panic!("expected v4 mask");
            };
            assert_eq!(u32::from(mask).leading_ones(), n as u32);
            assert_eq!(u32::from(mask).count_ones(), n as u32);
        }
        for n in [0u8, 48, 64, 127, 128] {
            let record = parse_record(&format!("v=spf1 ip6:2001:db8::/{} -all", n), "example.com").unwrap();
            let IpAddr::V6(mask) = range(&record.terms[0]).networks[0].mask() else {
                panic!("expected v6 mask");
            };
            assert_eq!(u128::from(mask).leading_ones(), n as u32);
            assert_eq!(u128::from(mask).count_ones(), n as u32);
        }
    }
}
