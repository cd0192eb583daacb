// # IP Resolver Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP discovery endpoints: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{IpResolver, IpVersion};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//
//     let current_ip = resolver.current_address(IpVersion::V4).await?;
//     println!("public address: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// IP address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// The family an address belongs to
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    /// Parse a numeric version (`4` or `6`)
    ///
    /// Any other value is rejected with [`crate::Error::InvalidInput`].
    pub fn from_number(version: u8) -> Result<Self, crate::Error> {
        match version {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(crate::Error::invalid_input(format!(
                "Unsupported IP version: {} (expected 4 or 6)",
                other
            ))),
        }
    }

    /// Numeric version (`4` or `6`)
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        IpVersion::of(ip) == self
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// Trait for public IP discovery
///
/// Implementations issue a single lookup per call and never retry;
/// the polling loop owns the retry policy.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Get the current public address for the given family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current public address
    /// - `Err(Error)`: If the lookup failed, timed out, or returned garbage
    async fn current_address(&self, version: IpVersion) -> Result<IpAddr, crate::Error>;

    /// Resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str {
        "unknown"
    }
}
