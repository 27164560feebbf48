use std::fmt;

use super::mechanism::SpfEntry;
use super::record::NEUTRAL_POLICY;
use super::SpfError;

/// Outcome of matching a sender against a domain's allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Sender is inside the allowlist.
    Pass,
    /// Not listed, record ends in `-all`.
    Fail,
    /// Not listed, record ends in `~all`.
    SoftFail,
    /// Not listed, and the terminal policy maps to nothing.
    Neutral,
}

impl Verdict {
    /// Verdict for an unmatched sender under the terminal `policy` token.
    pub fn from_policy(policy: &str) -> Self {
        match policy {
            "~all" => Verdict::SoftFail,
            "-all" => Verdict::Fail,
            _ => Verdict::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::SoftFail => "softfail",
            Verdict::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resolved SPF policy of one domain, with its includes as children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpfRecord {
    pub domain: String,
    pub version: String,
    /// Terminal policy token, e.g. `~all`.
    pub policy: String,
    /// The TXT value selected as this domain's SPF record.
    pub record: String,
    /// One node per `include:` that resolved, in record order.
    pub includes: Vec<SpfRecord>,
    /// Ranges declared directly by this record, in record order.
    pub entries: Vec<SpfEntry>,
    /// Flattened ranges of this node and every descendant. Filled in on the
    /// root by [`SpfResolver::get`](super::SpfResolver::get).
    pub allowlist: Vec<SpfEntry>,
    /// Failures that did not stop resolution.
    pub errors: Vec<SpfError>,
}

impl SpfRecord {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            version: String::new(),
            policy: NEUTRAL_POLICY.to_string(),
            record: String::new(),
            includes: Vec::new(),
            entries: Vec::new(),
            allowlist: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Soft errors of this node followed by those of its includes, depth first.
    pub fn all_errors(&self) -> Vec<&SpfError> {
        let mut out: Vec<&SpfError> = self.errors.iter().collect();
        for include in &self.includes {
            out.extend(include.all_errors());
        }
        out
    }
}
