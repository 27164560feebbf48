use std::net::IpAddr;

use super::mechanism::SpfEntry;
use super::types::{SpfRecord, Verdict};
use super::SpfError;

/// Match `ip` against a flattened allowlist.
///
/// Any containing network gives `(Pass, true)`. Otherwise the verdict comes
/// from the terminal `policy` and the flag is false. An `ip` that does not
/// parse matches nothing.
pub fn validate(allowlist: &[SpfEntry], policy: &str, ip: &str) -> (Verdict, bool) {
    match ip.trim().parse::<IpAddr>() {
        Ok(ip) => validate_addr(allowlist, policy, ip),
        Err(_) => (Verdict::from_policy(policy), false),
    }
}

fn validate_addr(allowlist: &[SpfEntry], policy: &str, ip: IpAddr) -> (Verdict, bool) {
    if allowlist.iter().any(|entry| entry.contains(ip)) {
        return (Verdict::Pass, true);
    }
    (Verdict::from_policy(policy), false)
}

impl SpfRecord {
    /// Validate a sender address given as text against this record's allowlist.
    pub fn validate(&self, ip: &str) -> (Verdict, bool) {
        validate(&self.allowlist, &self.policy, ip)
    }

    pub fn validate_ip(&self, ip: IpAddr) -> (Verdict, bool) {
        validate_addr(&self.allowlist, &self.policy, ip)
    }

    /// Like [`SpfRecord::validate`], but an unparsable address is an error.
    pub fn try_validate(&self, ip: &str) -> Result<(Verdict, bool), SpfError> {
        let addr = ip.trim().parse::<IpAddr>().map_err(|_| SpfError::ValidationFailed {
            domain: self.domain.clone(),
            ip: ip.to_string(),
        })?;
        Ok(self.validate_ip(addr))
    }
}
