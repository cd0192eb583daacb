//! Core traits for the DDNS client
//!
//! - [`IpResolver`]: Discover the current public address
//! - [`DnsProvider`]: Validate the domain and upsert records via provider APIs

pub mod ip_resolver;
pub mod dns_provider;

pub use ip_resolver::{IpResolver, IpVersion};
pub use dns_provider::{
    DnsProvider, DnsProviderFactory, RecordType, RemoteRecord, UpsertOutcome,
    find_matching_record,
};
