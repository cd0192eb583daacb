//! Core DDNS engine
//!
//! The engine is split in two:
//! - [`UpdateCoordinator`]: validates the domain, looks up the current
//!   address, and upserts every record for a new address
//! - [`PollingLoop`]: drives the coordinator on a timer and decides when
//!   an update is needed
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   current_ip    ┌───────────────────┐   upsert_record   ┌─────────────┐
//! │ PollingLoop │ ──────────────▶ │ UpdateCoordinator │ ────────────────▶ │ DnsProvider │
//! └─────────────┘   apply_new_ip  └───────────────────┘                   └─────────────┘
//!        │                                 │
//!        ▼                                 ▼
//! ┌─────────────┐                  ┌─────────────┐
//! │   Events    │                  │ IpResolver  │
//! └─────────────┘                  └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Ask the coordinator for the current address
//! 2. On failure, sleep `min(interval, backoff cap)` and try again
//! 3. If the address differs from the last known one, upsert all records
//! 4. Sleep for the interval

mod coordinator;
mod polling;

pub use coordinator::{RecordOutcome, UpdateCoordinator};
pub use polling::PollingLoop;

use crate::traits::{RecordType, UpsertOutcome};
use std::net::IpAddr;
use std::time::Duration;

/// Events emitted by the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Loop started
    Started {
        records_count: usize,
    },

    /// Startup validation succeeded
    DomainValidated {
        domain: String,
    },

    /// A new address was observed (or the first one)
    IpChanged {
        previous_ip: Option<IpAddr>,
        new_ip: IpAddr,
    },

    /// The observed address matches the last known one
    IpUnchanged {
        current_ip: IpAddr,
    },

    /// One record was created or updated
    RecordUpserted {
        record: String,
        record_type: RecordType,
        outcome: UpsertOutcome,
    },

    /// One record failed to update; siblings are unaffected
    RecordUpdateFailed {
        record: String,
        error: String,
    },

    /// Address lookup failed
    CheckFailed {
        error: String,
        retry_in: Duration,
    },

    /// Loop stopped
    Stopped {
        reason: String,
    },
}
