use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::dns::{resolve_host, DnsError, DnsResolver};
use crate::common::domain::normalize;

use super::allowlist::aggregate_allowlist;
use super::mechanism::{HostKind, SpfEntry, Term};
use super::record::parse_record;
use super::types::SpfRecord;
use super::SpfError;

/// How deep `include:` chains may nest below the queried domain.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;

const SPF_VERSION: &str = "v=spf1";

type NodeFuture<'a> = Pin<Box<dyn Future<Output = Result<SpfRecord, SpfError>> + Send + 'a>>;

/// Resolves a domain's SPF record and everything it includes.
pub struct SpfResolver<R: DnsResolver> {
    resolver: Arc<R>,
    max_include_depth: usize,
}

impl<R: DnsResolver> SpfResolver<R> {
    pub fn new(resolver: Arc<R>) -> Self {
        Self {
            resolver,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Resolve `domain` and flatten every reachable range onto the root's
    /// `allowlist`, ready for [`SpfRecord::validate`].
    pub async fn get(&self, domain: &str) -> Result<SpfRecord, SpfError> {
        let mut record = self.build_tree(domain).await?;
        record.allowlist = aggregate_allowlist(&record);
        debug!(
            domain = %record.domain,
            entries = record.allowlist.len(),
            soft_errors = record.all_errors().len(),
            "SPF allowlist ready"
        );
        Ok(record)
    }

    /// Build the record tree for `domain` without aggregating it.
    ///
    /// Only failures of `domain` itself are returned as errors. Failures of
    /// included domains and of `a`/`mx` lookups end up in the `errors` of
    /// the node that referenced them.
    pub async fn build_tree(&self, domain: &str) -> Result<SpfRecord, SpfError> {
        let mut chain = Vec::new();
        self.build_node(domain, &mut chain).await
    }

    /// `chain` holds the normalized domains from the root down to the
    /// caller, and is restored before returning.
    fn build_node<'a>(&'a self, domain: &'a str, chain: &'a mut Vec<String>) -> NodeFuture<'a> {
        Box::pin(async move {
            debug!(domain, depth = chain.len(), "resolving SPF record");

            let mut spf = SpfRecord::new(domain);
            spf.record = self.lookup_spf(domain).await?;

            let parsed = parse_record(&spf.record, domain)?;
            spf.version = parsed.version;
            spf.policy = parsed.policy;
            for err in parsed.errors {
                warn!(domain, error = %err, "skipping mechanism");
                spf.errors.push(err);
            }

            let mut includes = Vec::new();
            for term in parsed.terms {
                match term {
                    Term::Range(entry) => spf.entries.push(entry),
                    Term::Host(kind) => {
                        let entry = self.expand_host(domain, kind, &mut spf.errors).await;
                        spf.entries.push(entry);
                    }
                    Term::Include(target) => includes.push(target),
                }
            }

            chain.push(normalize(domain));
            for target in includes {
                match self.build_include(&target, chain).await {
                    Ok(child) => spf.includes.push(child),
                    Err(err) => {
                        warn!(domain, include = %target, error = %err, "include contributes nothing");
                        spf.errors.push(err);
                    }
                }
            }
            chain.pop();

            Ok(spf)
        })
    }

    async fn build_include(&self, target: &str, chain: &mut Vec<String>) -> Result<SpfRecord, SpfError> {
        if chain.contains(&normalize(target)) {
            return Err(SpfError::IncludeCycle {
                domain: target.to_string(),
            });
        }
        if chain.len() > self.max_include_depth {
            return Err(SpfError::LookupLimitExceeded {
                domain: target.to_string(),
                limit: self.max_include_depth,
            });
        }
        self.build_node(target, chain).await
    }

    /// First TXT value of `domain` carrying the SPF version tag.
    async fn lookup_spf(&self, domain: &str) -> Result<String, SpfError> {
        let txt_records = self.resolver.query_txt(domain).await?;

        txt_records
            .into_iter()
            .find(|txt| txt.to_ascii_lowercase().contains(SPF_VERSION))
            .ok_or_else(|| SpfError::RecordNotFound {
                domain: domain.to_string(),
            })
    }

    /// Resolve a bare `a`/`mx` against the record's own domain. A failed
    /// lookup is recorded in `errors` and yields an entry with no networks.
    async fn expand_host(&self, domain: &str, kind: HostKind, errors: &mut Vec<SpfError>) -> SpfEntry {
        let token = kind.token();
        let result = match kind {
            HostKind::A => resolve_host(self.resolver.as_ref(), domain).await,
            HostKind::Mx => self.resolve_mx(domain, errors).await,
        };

        match result {
            Ok(addrs) => SpfEntry::from_hosts(token, addrs),
            Err(source) => {
                let err = SpfError::HostExpansion {
                    domain: domain.to_string(),
                    entry: token.to_string(),
                    source,
                };
                warn!(domain, error = %err, "host expansion failed");
                errors.push(err);
                SpfEntry::from_hosts(token, Vec::new())
            }
        }
    }

    /// Addresses of every MX exchange of `domain`, lowest preference first.
    /// An exchange that does not resolve is recorded and skipped.
    async fn resolve_mx(&self, domain: &str, errors: &mut Vec<SpfError>) -> Result<Vec<IpAddr>, DnsError> {
        let mut hosts = self.resolver.query_mx(domain).await?;
        hosts.sort_by_key(|(preference, _)| *preference);

        let mut addrs = Vec::new();
        for (_, host) in hosts {
            // null MX
            if host.is_empty() || host == "." {
                continue;
            }
            match resolve_host(self.resolver.as_ref(), &host).await {
                Ok(found) => addrs.extend(found),
                Err(source) => {
                    warn!(domain, exchange = %host, error = %source, "MX exchange did not resolve");
                    errors.push(SpfError::HostExpansion {
                        domain: host,
                        entry: HostKind::Mx.token().to_string(),
                        source,
                    });
                }
            }
        }
        Ok(addrs)
    }
}
