// # ddns-core
//
// Core library for the polling DDNS client.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpResolver**: Trait for discovering the current public address
// - **DnsProvider**: Trait for validating a domain and upserting records via provider APIs
// - **UpdateCoordinator**: Fans a new address out to every managed record
// - **PollingLoop**: Timer-driven loop that decides when an update is needed
// - **ProviderRegistry**: Plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from vendor adapters
// 2. **Plugin-Based**: Providers are registered by name, no hard-coded if-else
// 3. **Library-First**: All core functionality can be used as a library
// 4. **Availability**: Transient failures are logged and the loop keeps polling

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpResolver, DnsProvider, IpVersion, RecordType};
pub use engine::{EngineEvent, PollingLoop, RecordOutcome, UpdateCoordinator};
pub use registry::ProviderRegistry;
pub use config::{DdnsConfig, EngineConfig, ProviderConfig};
pub use error::{Error, Result};
