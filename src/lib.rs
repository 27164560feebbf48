//! SPF allowlist resolution.
//!
//! Fetches a domain's SPF record, expands its `include:` chain into a tree,
//! flattens the tree into an allowlist of networks and checks sender
//! addresses against it.
//!
//! DNS access goes through the [`common::dns::DnsResolver`] trait. Use
//! [`common::dns::HickoryResolver`] for real lookups and
//! [`common::dns::MockResolver`] in tests. Nothing is cached between calls.

pub mod common;
pub mod config;
pub mod logging;
pub mod spf;

pub use config::ResolverSettings;
pub use spf::{SpfError, SpfRecord, SpfResolver, Verdict};
