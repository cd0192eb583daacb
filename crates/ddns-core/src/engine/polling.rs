//! Polling loop
//!
//! Each tick asks the coordinator for the current address, compares it
//! with the last known one, and pushes an update when it changed. Ticks
//! are separated by the configured interval, or by a capped backoff
//! after a failed lookup.

use super::coordinator::UpdateCoordinator;
use super::EngineEvent;
use crate::config::EngineConfig;
use crate::error::Result;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Timer-driven loop around an [`UpdateCoordinator`]
///
/// ## Lifecycle
///
/// 1. Create with [`PollingLoop::new()`]
/// 2. Start with [`PollingLoop::run()`]
/// 3. The domain is validated once; failure ends the run
/// 4. Ticks repeat until a shutdown signal arrives
///
/// The last known address starts unknown, so the first successful
/// lookup always triggers an update.
pub struct PollingLoop {
    coordinator: UpdateCoordinator,
    engine: EngineConfig,
    last_known_ip: Option<IpAddr>,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PollingLoop {
    /// Create a polling loop
    ///
    /// # Returns
    ///
    /// A tuple of (loop, event_receiver) where event_receiver yields engine events
    pub fn new(
        coordinator: UpdateCoordinator,
        engine: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        engine.validate()?;

        let (tx, rx) = mpsc::channel(engine.event_channel_capacity);

        let polling = Self {
            coordinator,
            engine,
            last_known_ip: None,
            event_tx: tx,
        };

        Ok((polling, rx))
    }

    /// Last address that triggered an update, if any
    pub fn last_known_ip(&self) -> Option<IpAddr> {
        self.last_known_ip
    }

    /// The coordinator driven by this loop
    pub fn coordinator(&self) -> &UpdateCoordinator {
        &self.coordinator
    }

    /// Run until SIGINT/Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Startup validation failed
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// With `None`, behaves like [`PollingLoop::run()`].
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            records_count: self.coordinator.records().len(),
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => wait_for_ctrl_c().await,
            }
        };
        tokio::pin!(shutdown);

        let validated = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            result = self.coordinator.validate() => Some(result),
        };

        match validated {
            None => {
                info!("Shutdown signal received during domain validation");
                return self.stop();
            }
            Some(Err(e)) => {
                self.emit_event(EngineEvent::Stopped {
                    reason: e.to_string(),
                });
                return Err(e);
            }
            Some(Ok(())) => {}
        }

        self.emit_event(EngineEvent::DomainValidated {
            domain: self.coordinator.domain().to_string(),
        });

        info!(
            "Polling {} address every {}s for {} record(s) under {}",
            self.coordinator.ip_version(),
            self.engine.interval_secs,
            self.coordinator.records().len(),
            self.coordinator.domain()
        );

        // Shutdown is observed before every tick and while sleeping; a
        // started tick runs to completion
        loop {
            let stop_requested = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if stop_requested {
                info!("Shutdown signal received");
                break;
            }

            let delay = self.tick().await;

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.stop()
    }

    fn stop(&self) -> Result<()> {
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        Ok(())
    }

    /// Perform one check and return the delay before the next one
    pub async fn tick(&mut self) -> Duration {
        let new_ip = match self.coordinator.current_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                let retry_in = self.engine.retry_delay(&e);
                error!("Error occurred: {} (retrying in {}s)", e, retry_in.as_secs());
                self.emit_event(EngineEvent::CheckFailed {
                    error: e.to_string(),
                    retry_in,
                });
                return retry_in;
            }
        };

        if self.last_known_ip == Some(new_ip) {
            info!("IP unchanged: {}", new_ip);
            self.emit_event(EngineEvent::IpUnchanged { current_ip: new_ip });
            return self.engine.interval();
        }

        let previous_ip = self.last_known_ip.replace(new_ip);
        info!(
            "IP changed from {} to {}",
            previous_ip
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "None".to_string()),
            new_ip
        );
        self.emit_event(EngineEvent::IpChanged {
            previous_ip,
            new_ip,
        });

        let outcomes = self.coordinator.apply_new_ip(new_ip).await;
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            warn!(
                "{} of {} record(s) failed to update; they will be retried on the next IP change",
                failed,
                outcomes.len()
            );
        }

        for outcome in outcomes {
            let event = match outcome.result {
                Ok(result) => EngineEvent::RecordUpserted {
                    record: outcome.record,
                    record_type: outcome.record_type,
                    outcome: result,
                },
                Err(e) => EngineEvent::RecordUpdateFailed {
                    record: outcome.record,
                    error: e.to_string(),
                },
            };
            self.emit_event(event);
        }

        self.engine.interval()
    }

    fn emit_event(&self, event: EngineEvent) {
        debug!("Engine event: {:?}", event);
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. \
                     Consider increasing event_channel_capacity."
                );
            }
        }
    }
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
