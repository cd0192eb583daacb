// # HTTP IP Resolver
//
// This crate provides an HTTP-based public IP resolver for the DDNS client.
//
// ## Architecture
//
// One plain-text "what is my IP" endpoint per address family. A lookup is
// a single GET whose body is the literal address. Each family has its own
// client bound to that family's unspecified local address, so the request
// itself travels over the family being asked about even when the endpoint
// hostname resolves for both.
//
// No caching and no retries: every call hits the network, and the polling
// loop decides what to do with failures.

use async_trait::async_trait;
use ddns_core::traits::{IpResolver, IpVersion};
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

/// Default IPv4 discovery endpoint
pub const DEFAULT_IPV4_ENDPOINT: &str = "https://v4.ident.me";

/// Default IPv6 discovery endpoint
pub const DEFAULT_IPV6_ENDPOINT: &str = "https://v6.ident.me";

/// Default HTTP timeout for discovery requests
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-based public IP resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// Endpoint queried for IPv4 lookups
    v4_url: String,

    /// Endpoint queried for IPv6 lookups
    v6_url: String,

    /// Client that only connects over IPv4
    v4_client: reqwest::Client,

    /// Client that only connects over IPv6
    v6_client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver using the default endpoints
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoints(DEFAULT_IPV4_ENDPOINT, DEFAULT_IPV6_ENDPOINT, timeout)
    }

    /// Create a resolver with custom endpoints
    ///
    /// # Parameters
    ///
    /// - `v4_url`: Endpoint returning the caller's IPv4 address as plain text
    /// - `v6_url`: Endpoint returning the caller's IPv6 address as plain text
    /// - `timeout`: Per-request timeout
    pub fn with_endpoints(
        v4_url: impl Into<String>,
        v6_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            v4_url: v4_url.into(),
            v6_url: v6_url.into(),
            v4_client: pinned_client(IpAddr::V4(Ipv4Addr::UNSPECIFIED), timeout)?,
            v6_client: pinned_client(IpAddr::V6(Ipv6Addr::UNSPECIFIED), timeout)?,
        })
    }

    /// Endpoint used for a family
    pub fn endpoint(&self, version: IpVersion) -> &str {
        match version {
            IpVersion::V4 => &self.v4_url,
            IpVersion::V6 => &self.v6_url,
        }
    }

    fn client(&self, version: IpVersion) -> &reqwest::Client {
        match version {
            IpVersion::V4 => &self.v4_client,
            IpVersion::V6 => &self.v6_client,
        }
    }
}

// Binding the local side restricts the connector to remote addresses of
// the same family
fn pinned_client(local: IpAddr, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .local_address(local)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn current_address(&self, version: IpVersion) -> Result<IpAddr> {
        let url = self.endpoint(version);
        tracing::debug!("Fetching current {} address from {}", version, url);

        let response = self
            .client(version)
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let body = response.text().await.map_err(transport_error)?;
        parse_address(&body, version)
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}

/// Parse a discovery response body
///
/// Surrounding whitespace is ignored. An address of the other family is
/// rejected.
fn parse_address(body: &str, version: IpVersion) -> Result<IpAddr> {
    let text = body.trim();

    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::ip_source(format!("Invalid IP address: '{}'", text)))?;

    if !version.matches(&ip) {
        return Err(Error::ip_source(format!(
            "Expected {} address, got: {}",
            version, ip
        )));
    }

    Ok(ip)
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::timeout(format!("IP lookup timed out: {}", e))
    } else if e.is_connect() || e.is_request() {
        Error::network(format!("IP lookup failed: {}", e))
    } else {
        Error::ip_source(format!("Failed to read response: {}", e))
    }
}
