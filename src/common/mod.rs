//! Infrastructure shared by the SPF resolver: DNS access, CIDR math, domain names.

pub mod cidr;
pub mod dns;
pub mod domain;
