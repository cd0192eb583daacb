// # ArvanCloud DNS Provider
//
// This crate provides an ArvanCloud DNS provider implementation for the
// DDNS client.
//
// ## Behavior
//
// - One validation call per run (`GET /domains/{domain}`), 404 means the
//   domain is not in the account
// - Upsert is list-then-write: find the record by name and type, PUT it
//   if present, POST a new one otherwise
// - Errors propagate as-is; the polling loop owns retries and backoff
// - The API key never appears in logs or `Debug` output
//
// ## API Reference
//
// - ArvanCloud CDN API v4: https://www.arvancloud.ir/api/cdn/4.0
// - Domain info: GET `/domains/:domain`
// - List records: GET `/domains/:domain/dns-records`
// - Create record: POST `/domains/:domain/dns-records`
// - Update record: PUT `/domains/:domain/dns-records/:id`

pub mod session;
pub mod types;

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{
    DnsProvider, DnsProviderFactory, RecordType, RemoteRecord, UpsertOutcome,
    find_matching_record,
};
use ddns_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

pub use session::ProviderSession;
use session::check_status;
use types::{DnsRecordList, DnsRecordPayload, DnsRecordResponse};

/// ArvanCloud API base URL
pub const ARVAN_API_BASE: &str = "https://napi.arvancloud.ir/cdn/4.0";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// ArvanCloud DNS provider
///
/// Stateless apart from its session; safe to share across the concurrent
/// upserts of one batch.
#[derive(Debug, Clone)]
pub struct ArvanProvider {
    session: ProviderSession,
}

impl ArvanProvider {
    /// Create a provider against the production API
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, ARVAN_API_BASE, timeout)
    }

    /// Create a provider against a custom base URL (mock servers, proxies)
    pub fn with_base_url(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            session: ProviderSession::new(api_key, base_url, timeout)?,
        })
    }

    /// List every record of `domain`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /domains/example.com/dns-records
    /// Authorization: Apikey <key>
    /// ```
    pub async fn list_records(&self, domain: &str) -> Result<Vec<RemoteRecord>> {
        let path = format!("/domains/{}/dns-records", domain);
        let response = self.session.send(self.session.get(&path)).await?;
        let response = check_status(response).await?;

        let body = response.text().await.map_err(session::transport_error)?;
        let list: DnsRecordList = serde_json::from_str(&body)?;

        tracing::debug!("Listed {} DNS records for {}", list.data.len(), domain);
        Ok(list.data.into_iter().map(RemoteRecord::from).collect())
    }

    async fn create_record(
        &self,
        domain: &str,
        payload: &DnsRecordPayload,
    ) -> Result<Option<String>> {
        let path = format!("/domains/{}/dns-records", domain);
        let response = self
            .session
            .send(self.session.post(&path).json(payload))
            .await?;
        let response = check_status(response).await?;

        // A created record without a readable id is still a success
        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<DnsRecordResponse>(&body)
            .ok()
            .and_then(|r| r.data)
            .and_then(|d| d.id))
    }

    async fn update_record(
        &self,
        domain: &str,
        record_id: &str,
        payload: &DnsRecordPayload,
    ) -> Result<()> {
        let path = format!("/domains/{}/dns-records/{}", domain, record_id);
        let response = self
            .session
            .send(self.session.put(&path).json(payload))
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for ArvanProvider {
    /// ```http
    /// GET /domains/example.com
    /// Authorization: Apikey <key>
    /// ```
    async fn validate_domain(&self, domain: &str) -> Result<()> {
        tracing::debug!("Validating domain {} with ArvanCloud", domain);

        let path = format!("/domains/{}", domain);
        let response = self.session.send(self.session.get(&path)).await?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(Error::Http { status: 404, .. }) => Err(Error::domain_not_found(domain)),
            Err(e) => Err(e),
        }
    }

    async fn upsert_record(
        &self,
        domain: &str,
        record: &str,
        record_type: RecordType,
        new_ip: IpAddr,
    ) -> Result<UpsertOutcome> {
        let payload = DnsRecordPayload::new(record, record_type, new_ip);

        let existing = self.list_records(domain).await?;
        match find_matching_record(&existing, record, record_type) {
            Some(remote) => {
                tracing::debug!(
                    "Updating {} record {}.{} (id {})",
                    record_type,
                    record,
                    domain,
                    remote.id
                );
                self.update_record(domain, &remote.id, &payload).await?;
                Ok(UpsertOutcome::Updated {
                    record_id: remote.id.clone(),
                })
            }
            None => {
                tracing::debug!("Creating {} record {}.{}", record_type, record, domain);
                let record_id = self.create_record(domain, &payload).await?;
                Ok(UpsertOutcome::Created { record_id })
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "arvan"
    }
}

/// Factory for creating ArvanCloud providers
pub struct ArvanFactory;

impl DnsProviderFactory for ArvanFactory {
    fn create(&self, config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Arvan { api_key } => {
                Ok(Box::new(ArvanProvider::new(api_key, timeout)?))
            }
            ProviderConfig::Custom { config, .. } => {
                let api_key = config
                    .get("api_key")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| Error::config("Arvan provider requires an api_key"))?;
                let base_url = config
                    .get("base_url")
                    .and_then(|v| v.as_str())
                    .unwrap_or(ARVAN_API_BASE);
                Ok(Box::new(ArvanProvider::with_base_url(
                    api_key, base_url, timeout,
                )?))
            }
        }
    }
}

/// Register the ArvanCloud provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_core::ProviderRegistry;
///
/// let mut registry = ProviderRegistry::new();
/// ddns_provider_arvan::register(&mut registry);
/// assert!(registry.has_provider("arvan"));
/// ```
pub fn register(registry: &mut ddns_core::ProviderRegistry) {
    registry.register_provider("arvan", Box::new(ArvanFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_factory_creation() {
        let config = ProviderConfig::Arvan {
            api_key: "test_key".to_string(),
        };

        let provider = ArvanFactory.create(&config, DEFAULT_HTTP_TIMEOUT).unwrap();
        assert_eq!(provider.provider_name(), "arvan");
    }

    #[test]
    fn test_factory_missing_key() {
        let config = ProviderConfig::Arvan {
            api_key: "   ".to_string(),
        };

        assert!(ArvanFactory.create(&config, DEFAULT_HTTP_TIMEOUT).is_err());
    }

    #[test]
    fn test_factory_accepts_custom_config_with_base_url() {
        let config = ProviderConfig::Custom {
            factory: "arvan".to_string(),
            config: json!({"api_key": "k", "base_url": "http://127.0.0.1:1/cdn/4.0"}),
        };
        assert!(ArvanFactory.create(&config, DEFAULT_HTTP_TIMEOUT).is_ok());

        let missing = ProviderConfig::Custom {
            factory: "arvan".to_string(),
            config: json!({"token": "k"}),
        };
        assert!(matches!(
            ArvanFactory.create(&missing, DEFAULT_HTTP_TIMEOUT),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_register_adds_arvan() {
        let mut registry = ddns_core::ProviderRegistry::new();
        register(&mut registry);
        assert_eq!(registry.list_providers(), vec!["arvan".to_string()]);
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let provider = ArvanProvider::new("secret_key_12345", DEFAULT_HTTP_TIMEOUT).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("ArvanProvider"));
    }

    #[test]
    fn test_default_preference_is_ipv4() {
        let provider = ArvanProvider::new("key", DEFAULT_HTTP_TIMEOUT).unwrap();
        assert_eq!(
            provider.ip_version_preference(),
            ddns_core::IpVersion::V4
        );
    }
}
