//! Background eviction of idle boot states
//!
//! Machines that stop talking mid-boot must not pin registry entries
//! forever. The reaper wakes on a fixed interval and evicts every entry
//! idle past the TTL. Eviction is unconditional: a machine that idles
//! out loses its remembered stage and is treated as new on its next
//! contact — bounded memory is preferred over perfect continuity.

use crate::state::{now_unix, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sweep cadence and idle threshold.
///
/// The interval stays well below the TTL, so entry staleness is bounded
/// at interval + TTL in the worst case.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often to sweep
    pub interval: Duration,
    /// Idle duration after which an entry is evicted
    pub ttl: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            ttl: Duration::from_secs(3 * 60),
        }
    }
}

/// Spawn the reaper loop. Runs until `shutdown` fires.
pub fn spawn(
    registry: Arc<Registry>,
    config: ReaperConfig,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(config.interval) => {
                    let cutoff = now_unix() - config.ttl.as_secs() as i64;
                    debug!(cutoff, "sweeping idle boot states");
                    match registry.expire_older_than(cutoff) {
                        Ok(evicted) => {
                            for mac in evicted {
                                debug!(%mac, "boot state expired");
                            }
                        }
                        Err(e) => warn!(error = %e, "boot state sweep failed"),
                    }
                }
                _ = shutdown.changed() => {
                    debug!("reaper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BootState, Machine, INIT_TARGET};

    fn backdated(mac: &str, last_access: i64) -> BootState {
        BootState {
            machine: Machine::new(mac, "10.0.0.9", "sr-db01"),
            target: INIT_TARGET.to_string(),
            environment: String::new(),
            params: Default::default(),
            retry: 1,
            last_access,
        }
    }

    #[tokio::test]
    async fn test_reaper_evicts_idle_entries() {
        let registry = Arc::new(Registry::new());
        registry.insert_raw(backdated("02:00:00:00:00:01", now_unix() - 60));
        registry
            .add_or_reset(Machine::new("02:00:00:00:00:02", "10.0.0.2", "sr-web02"))
            .unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let config = ReaperConfig {
            interval: Duration::from_millis(20),
            ttl: Duration::from_secs(30),
        };
        let handle = spawn(registry.clone(), config, shutdown_rx);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(registry.lookup("02:00:00:00:00:01").unwrap().is_none());
        assert!(registry.lookup("02:00:00:00:00:02").unwrap().is_some());

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reaper_stops_on_shutdown() {
        let registry = Arc::new(Registry::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let handle = spawn(registry, ReaperConfig::default(), shutdown_rx);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper did not stop on shutdown")
            .unwrap();
    }
}
