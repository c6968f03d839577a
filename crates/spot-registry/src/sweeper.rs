//! Periodic staleness sweep.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::SweeperConfig;
use crate::registry::GarageRegistry;

/// Background task that runs
/// [`invalidate_stale_spots`](GarageRegistry::invalidate_stale_spots) on a
/// fixed interval until stopped.
#[derive(Debug)]
pub struct StalenessSweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StalenessSweeper {
    /// Spawn the sweep loop. The first sweep runs one interval after start.
    pub fn start(registry: Arc<GarageRegistry>, config: SweeperConfig) -> Self {
        let (shutdown, mut stop) = watch::channel(false);
        let period = config.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval = ?period, "staleness sweeper started");

            loop {
                tokio::select! {
                    biased;
                    changed = stop.changed() => {
                        // a dropped sender counts as a stop request
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let cleared = registry.invalidate_stale_spots().await;
                        debug!(cleared, "staleness sweep finished");
                    }
                }
            }
            info!("staleness sweeper stopped");
        });

        Self { shutdown, handle }
    }

    /// Signal the loop to exit and wait for it. A sweep already in progress
    /// completes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
