//! Line puller pool.
//!
//! One independent worker per configured sport; each worker periodically
//! fetches the sport's current line from the provider and upserts it into the
//! shared store. The pool also answers the readiness probe.

pub mod client;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::puller::client::LinesProviderClient;
use crate::storage::LineStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullerStatus {
    Ready,
    NotReady,
    ProviderUnavailable,
}

/// Handle over the pool of pulling workers, kept by the readiness endpoint.
pub struct LinePuller {
    sports: Vec<String>,
    storage: Arc<dyn LineStorage>,
    // One unreachable flag per worker, so a healthy sport cannot mask a
    // persistently failing one.
    worker_down: Vec<Arc<AtomicBool>>,
}

impl LinePuller {
    /// Spawns one pulling worker per configured sport. Workers run until
    /// `shutdown` fires; the returned handles are awaited on shutdown.
    pub fn spawn(
        client: LinesProviderClient,
        sports: Vec<String>,
        pull_intervals: &HashMap<String, u32>,
        storage: Arc<dyn LineStorage>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<(Arc<Self>, Vec<JoinHandle<()>>)> {
        let mut worker_down = Vec::with_capacity(sports.len());
        let mut workers = Vec::with_capacity(sports.len());

        for sport in &sports {
            let Some(&interval) = pull_intervals.get(sport) else {
                bail!("pulling interval for {sport} is not configured");
            };

            let down = Arc::new(AtomicBool::new(false));
            worker_down.push(Arc::clone(&down));

            workers.push(tokio::spawn(run_worker(
                client.clone(),
                sport.clone(),
                Duration::from_secs(u64::from(interval)),
                Arc::clone(&storage),
                down,
                shutdown.clone(),
            )));
        }

        let puller = Arc::new(Self {
            sports,
            storage,
            worker_down,
        });

        Ok((puller, workers))
    }

    /// Readiness probe. Ready once every configured sport has a stored line;
    /// an unreachable provider is only reported while still filling up.
    pub async fn status(&self) -> PullerStatus {
        let count = match self.storage.count().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "storage count failed during readiness probe");
                0
            }
        };

        if count == self.sports.len() {
            return PullerStatus::Ready;
        }
        if self.worker_down.iter().any(|down| down.load(Ordering::Relaxed)) {
            return PullerStatus::ProviderUnavailable;
        }

        PullerStatus::NotReady
    }
}

/// Pulls one sport forever. Fetch or parse failures are logged and flip this
/// worker's unreachable flag, leaving the last stored value in place; the
/// next successful fetch clears the flag.
async fn run_worker(
    client: LinesProviderClient,
    sport: String,
    period: Duration,
    storage: Arc<dyn LineStorage>,
    provider_down: Arc<AtomicBool>,
    shutdown: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(sport = %sport, every_s = period.as_secs(), "line puller worker started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match client.fetch_line(&sport).await {
            Ok(line) => {
                provider_down.store(false, Ordering::Relaxed);
                if let Err(e) = storage.upload(&sport, line).await {
                    warn!(sport = %sport, error = %e, "failed to store pulled line");
                }
            }
            Err(e) => {
                provider_down.store(true, Ordering::Relaxed);
                warn!(sport = %sport, error = %e, "line pull failed; keeping last known value");
            }
        }
    }

    info!(sport = %sport, "line puller worker shut down");
}
