//! SPF record resolution: fetch a domain's policy, expand its includes into
//! a tree, flatten the tree into an allowlist and match sender addresses.

mod allowlist;
mod mechanism;
mod record;
mod tree;
mod types;
mod validate;

pub use allowlist::aggregate_allowlist;
pub use mechanism::{HostKind, SpfEntry, Term};
pub use record::{parse_record, ParsedRecord};
pub use tree::{SpfResolver, DEFAULT_MAX_INCLUDE_DEPTH};
pub use types::{SpfRecord, Verdict};
pub use validate::validate;

use thiserror::Error;

use crate::common::dns::DnsError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpfError {
    #[error("could not find SPF record for {domain}")]
    RecordNotFound { domain: String },
    #[error("'{domain}' returned an invalid spf record, '{record}'")]
    RecordInvalid { domain: String, record: String },
    #[error("could not validate SPF record for {domain}: '{ip}' is not an IP address")]
    ValidationFailed { domain: String, ip: String },
    #[error("'{resolver}' is an invalid resolver")]
    InvalidResolver { resolver: String },
    #[error("'{domain}' has an invalid mechanism '{entry}': {reason}")]
    InvalidMechanism {
        domain: String,
        entry: String,
        reason: String,
    },
    #[error("could not expand '{entry}' for {domain}: {source}")]
    HostExpansion {
        domain: String,
        entry: String,
        source: DnsError,
    },
    #[error("include loop: {domain} includes itself")]
    IncludeCycle { domain: String },
    #[error("include of {domain} exceeds the nesting limit of {limit}")]
    LookupLimitExceeded { domain: String, limit: usize },
    #[error(transparent)]
    Dns(#[from] DnsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_message() {
        let err = SpfError::RecordNotFound {
            domain: "example.org".into(),
        };
        assert_eq!(err.to_string(), "could not find SPF record for example.org");
    }

    #[test]
    fn record_invalid_message() {
        let err = SpfError::RecordInvalid {
            domain: "fail.example.org".into(),
            record: "v=spf1 -all".into(),
        };
        assert!(err.to_string().contains("invalid spf record"));
        assert!(err.to_string().contains("'v=spf1 -all'"));
    }

    #[test]
    fn validation_failed_message() {
        let err = SpfError::ValidationFailed {
            domain: "example.org".into(),
            ip: "nope".into(),
        };
        assert!(err.to_string().starts_with("could not validate SPF record for example.org"));
    }

    #[test]
    fn dns_error_is_transparent() {
        let err = SpfError::from(DnsError::Timeout);
        assert_eq!(err.to_string(), "timeout");
    }
}
