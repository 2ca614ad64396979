//! Background eviction of idle client records.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::info;

use super::registry::ClientRegistry;

/// Default idle timeout before a client record is evicted: 3 minutes.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(180);
/// Default cadence of the eviction sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(2);

/// Periodic eviction sweep over the client registry.
///
/// Runs as one long-lived background task, started once at startup, and
/// makes forward progress independent of traffic volume so that idle records
/// cannot accumulate under high client churn. A record may survive up to one
/// sweep interval past its idle threshold.
pub struct Sweeper {
    registry: Arc<ClientRegistry>,
    idle_timeout: Duration,
    interval: Duration,
}

impl Sweeper {
    /// Create a sweeper over `registry`.
    pub fn new(registry: Arc<ClientRegistry>, idle_timeout: Duration, interval: Duration) -> Self {
        Self {
            registry,
            idle_timeout,
            interval,
        }
    }

    /// Run the sweep loop until `signal` resolves.
    ///
    /// The loop evicts idle records once per interval and exits cleanly when
    /// the shutdown signal fires, so tests and process shutdown do not have
    /// to abort the task.
    pub async fn run_with_shutdown<F>(self, signal: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!(
            idle_timeout_secs = self.idle_timeout.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Eviction sweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.registry.sweep(Instant::now(), self.idle_timeout);
                }
                _ = &mut signal => {
                    info!("Eviction sweeper stopped");
                    break;
                }
            }
        }
    }
}
