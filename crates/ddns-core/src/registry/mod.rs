//! Plugin-based provider registry
//!
//! The registry maps provider names to factories so the daemon can build
//! whichever provider the configuration names, without hardcoded
//! if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ddns_core::registry::ProviderRegistry;
//! use ddns_core::config::ProviderConfig;
//! use std::time::Duration;
//!
//! let mut registry = ProviderRegistry::new();
//! ddns_provider_arvan::register(&mut registry);
//!
//! let config = ProviderConfig::from_name("arvan", "my-api-key");
//! let provider = registry.create_provider(&config, Duration::from_secs(30))?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &mut ProviderRegistry) {
//!     registry.register_provider("arvan", Box::new(ArvanFactory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::time::Duration;

/// Provider registry for plugin-based DNS provider creation
///
/// Populated once at startup, then only read.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories, keyed by lowercase name
    providers: HashMap<String, Box<dyn DnsProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "arvan")
    /// - `factory`: Factory object for creating provider instances
    ///
    /// Registering a name twice replaces the earlier factory.
    pub fn register_provider(
        &mut self,
        name: impl Into<String>,
        factory: Box<dyn DnsProviderFactory>,
    ) {
        self.providers.insert(name.into().to_lowercase(), factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Provider configuration
    /// - `timeout`: Per-request timeout for the provider's HTTP client
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error::Config)`: If the provider type is not registered
    /// - `Err(Error)`: If creation fails
    pub fn create_provider(
        &self,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name().to_lowercase();

        let factory = self.providers.get(&provider_type).ok_or_else(|| {
            Error::config(format!(
                "Unknown provider type: {} (available: {})",
                provider_type,
                self.list_providers().join(", ")
            ))
        })?;

        factory.create(config, timeout)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(&name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{RecordType, UpsertOutcome};
    use async_trait::async_trait;
    use std::net::IpAddr;

    struct NullProvider;

    #[async_trait]
    impl DnsProvider for NullProvider {
        async fn validate_domain(&self, _domain: &str) -> Result<()> {
            Ok(())
        }

        async fn upsert_record(
            &self,
            _domain: &str,
            _record: &str,
            _record_type: RecordType,
            _new_ip: IpAddr,
        ) -> Result<UpsertOutcome> {
            Ok(UpsertOutcome::Created { record_id: None })
        }

        fn provider_name(&self) -> &'static str {
            "null"
        }
    }

    struct NullProviderFactory;

    impl DnsProviderFactory for NullProviderFactory {
        fn create(
            &self,
            _config: &ProviderConfig,
            _timeout: Duration,
        ) -> Result<Box<dyn DnsProvider>> {
            Ok(Box::new(NullProvider))
        }
    }

    #[test]
    fn test_registry_registration() {
        let mut registry = ProviderRegistry::new();

        assert!(!registry.has_provider("null"));

        registry.register_provider("Null", Box::new(NullProviderFactory));

        assert!(registry.has_provider("null"));
        assert!(registry.has_provider("NULL"));
        assert_eq!(registry.list_providers(), vec!["null".to_string()]);
    }

    #[test]
    fn test_create_registered_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register_provider("null", Box::new(NullProviderFactory));

        let config = ProviderConfig::from_name("null", "key");
        let provider = registry
            .create_provider(&config, Duration::from_secs(30))
            .unwrap();
        assert_eq!(provider.provider_name(), "null");
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let registry = ProviderRegistry::new();
        let config = ProviderConfig::from_name("route53", "key");

        let err = registry
            .create_provider(&config, Duration::from_secs(30))
            .err()
            .expect("unknown provider must fail");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("route53"));
    }
}
