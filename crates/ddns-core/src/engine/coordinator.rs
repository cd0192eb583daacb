//! Update coordinator
//!
//! Owns one provider, the managed domain and its record names. Validates
//! the domain once, looks up the current address, and fans a new address
//! out to every record.

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpResolver, IpVersion, RecordType, UpsertOutcome};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Result of upserting a single record
#[derive(Debug)]
pub struct RecordOutcome {
    /// Record name
    pub record: String,
    /// Record type derived from the new address
    pub record_type: RecordType,
    /// What the provider did, or why it failed
    pub result: Result<UpsertOutcome>,
}

impl RecordOutcome {
    /// Whether the upsert succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Coordinates validation and batch upserts against one provider
pub struct UpdateCoordinator {
    provider: Arc<dyn DnsProvider>,
    resolver: Arc<dyn IpResolver>,
    domain: String,
    records: Vec<String>,
    ip_version: IpVersion,
}

impl UpdateCoordinator {
    /// Create a coordinator
    ///
    /// The address family comes from `config.ip_version`, falling back to
    /// the provider's preference.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        resolver: Box<dyn IpResolver>,
        config: &DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        let provider: Arc<dyn DnsProvider> = Arc::from(provider);
        let ip_version = config
            .ip_version
            .unwrap_or_else(|| provider.ip_version_preference());

        Ok(Self {
            provider,
            resolver: Arc::from(resolver),
            domain: config.domain.clone(),
            records: config.records.clone(),
            ip_version,
        })
    }

    /// Managed domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Managed record names, in configured order
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Address family this coordinator tracks
    pub fn ip_version(&self) -> IpVersion {
        self.ip_version
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Confirm the domain exists at the provider
    ///
    /// A 404 becomes [`Error::DomainNotFound`]; every other failure is
    /// returned unchanged.
    pub async fn validate(&self) -> Result<()> {
        match self.provider.validate_domain(&self.domain).await {
            Ok(()) => {
                info!("Domain {} validated", self.domain);
                Ok(())
            }
            Err(Error::DomainNotFound(_)) | Err(Error::Http { status: 404, .. }) => {
                error!(
                    "Domain {} not found in your {} account",
                    self.domain,
                    self.provider.provider_name()
                );
                Err(Error::domain_not_found(self.domain.clone()))
            }
            Err(e) => {
                error!("Failed to validate domain {}: {}", self.domain, e);
                Err(e)
            }
        }
    }

    /// Look up the current public address for the tracked family
    pub async fn current_ip(&self) -> Result<IpAddr> {
        let ip = self
            .provider
            .current_ip(self.resolver.as_ref(), self.ip_version)
            .await?;

        if !self.ip_version.matches(&ip) {
            return Err(Error::ip_source(format!(
                "Expected {} address, got {}",
                self.ip_version, ip
            )));
        }

        Ok(ip)
    }

    /// Upsert every configured record to point at `new_ip`
    ///
    /// All upserts start together and run to completion independently.
    /// A failure never cancels or rolls back its siblings. Returns one
    /// outcome per record, in configured order.
    pub async fn apply_new_ip(&self, new_ip: IpAddr) -> Vec<RecordOutcome> {
        let record_type = RecordType::for_ip(&new_ip);
        let mut tasks = JoinSet::new();

        for (index, record) in self.records.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let domain = self.domain.clone();
            let record = record.clone();

            tasks.spawn(async move {
                let result = provider
                    .upsert_record(&domain, &record, record_type, new_ip)
                    .await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<UpsertOutcome>>> =
            self.records.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => error!("Record update task failed: {}", e),
            }
        }

        self.records
            .iter()
            .zip(results)
            .map(|(record, result)| {
                let result = result.unwrap_or_else(|| {
                    Err(Error::Other("record update task aborted".to_string()))
                });
                self.log_outcome(record, new_ip, &result);
                RecordOutcome {
                    record: record.clone(),
                    record_type,
                    result,
                }
            })
            .collect()
    }

    fn log_outcome(&self, record: &str, new_ip: IpAddr, result: &Result<UpsertOutcome>) {
        match result {
            Ok(UpsertOutcome::Created { record_id }) => {
                info!(
                    "Created DNS record {}.{} with IP {}",
                    record, self.domain, new_ip
                );
                debug!("Created record id: {:?}", record_id);
            }
            Ok(UpsertOutcome::Updated { record_id }) => {
                info!(
                    "Updated DNS record {}.{} with IP {}",
                    record, self.domain, new_ip
                );
                debug!("Updated record id: {}", record_id);
            }
            Err(e) => {
                error!(
                    "Failed to update DNS record {}.{}: {}",
                    record, self.domain, e
                );
            }
        }
    }
}
