// # DNS Provider Trait
//
// Defines the capability set every DNS vendor adapter implements:
// validate the managed domain, discover the current address, and upsert
// one record.
//
// ## Implementations
//
// - ArvanCloud: `ddns-provider-arvan` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{DnsProvider, RecordType};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//     let ip = "203.0.113.9".parse()?;
//
//     provider.validate_domain("example.com").await?;
//     provider
//         .upsert_record("example.com", "home", RecordType::for_ip(&ip), ip)
//         .await?;
//
//     Ok(())
// }
// ```

use crate::traits::ip_resolver::{IpResolver, IpVersion};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// DNS record type managed by the client
///
/// Always derived from the address family of the new IP, never
/// configured independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Record type for an address
    pub fn for_ip(ip: &IpAddr) -> Self {
        Self::for_version(IpVersion::of(ip))
    }

    /// Record type for an address family
    pub fn for_version(version: IpVersion) -> Self {
        match version {
            IpVersion::V4 => RecordType::A,
            IpVersion::V6 => RecordType::Aaaa,
        }
    }

    /// Lowercase wire name (`a`, `aaaa`)
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "a",
            RecordType::Aaaa => "aaaa",
        }
    }

    /// Whether a provider-reported type string names this record type
    pub fn matches(self, raw: &str) -> bool {
        raw.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => f.write_str("A"),
            RecordType::Aaaa => f.write_str("AAAA"),
        }
    }
}

/// A record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Provider-assigned record ID
    pub id: String,
    /// Record name (label under the domain)
    pub name: String,
    /// Record type as reported by the provider
    pub record_type: String,
}

/// Find the record an upsert should overwrite
///
/// Linear scan over `(name, type)`; the first entry in provider order
/// wins. Providers that do not return a stable order make this choice
/// arbitrary when duplicates exist.
pub fn find_matching_record<'a>(
    records: &'a [RemoteRecord],
    name: &str,
    record_type: RecordType,
) -> Option<&'a RemoteRecord> {
    records
        .iter()
        .find(|r| r.name == name && record_type.matches(&r.record_type))
}

/// Result of an upsert operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No matching record existed; a new one was created
    Created {
        /// ID of the created record, when the provider reports it
        record_id: Option<String>,
    },
    /// An existing record was overwritten
    Updated {
        /// ID of the overwritten record
        record_id: String,
    },
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the coordinator runs one upsert
/// per configured record concurrently against the same provider.
///
/// # Retries
///
/// Providers make single-shot API calls and return errors as-is. The
/// polling loop decides when to try again.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Confirm the domain exists under the account
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The domain is managed by this account
    /// - `Err(Error::DomainNotFound)`: The provider answered 404
    /// - `Err(Error)`: Any other failure, with its status/message intact
    async fn validate_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Address family this provider prefers when the run does not choose one
    fn ip_version_preference(&self) -> IpVersion {
        IpVersion::V4
    }

    /// Discover the current public address
    ///
    /// Defaults to asking `resolver`. Providers with their own discovery
    /// method may override this.
    async fn current_ip(
        &self,
        resolver: &dyn IpResolver,
        version: IpVersion,
    ) -> Result<IpAddr, crate::Error> {
        resolver.current_address(version).await
    }

    /// Create or overwrite `record` under `domain` so it points at `new_ip`
    ///
    /// Not atomic: an external edit between listing and writing is
    /// silently overwritten.
    async fn upsert_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<UpsertOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    /// - `timeout`: Per-request timeout for the provider's HTTP client
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
