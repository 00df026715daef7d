use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::Update;

/// Schedules pushes for one session.
///
/// Blocks on the first update before any ticker exists, then multiplexes
/// reconfiguration against ticks. Every update replaces the ticker and its
/// sport set is forwarded ahead of the next tick, so a set change is always
/// observed as an absolute push before any further delta.
pub(crate) async fn run_timer(
    session: CancellationToken,
    mut update_rx: Receiver<Update>,
    push_tx: Sender<Option<HashSet<String>>>,
) {
    let first = tokio::select! {
        _ = session.cancelled() => return,
        update = update_rx.recv() => match update {
            Some(update) => update,
            None => return,
        },
    };

    let mut ticker = new_ticker(first.interval);
    if push_tx.send(first.sport_set).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = session.cancelled() => break,
            update = update_rx.recv() => {
                let Some(update) = update else { break };
                ticker = new_ticker(update.interval);
                if push_tx.send(update.sport_set).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if push_tx.send(None).await.is_err() {
                    break;
                }
            }
        }
    }

    debug!("session timer stopped");
}

fn new_ticker(period: Duration) -> Interval {
    // First tick one full period from now; tokio's default interval fires
    // immediately, which would inject a spurious delta push right after every
    // reconfiguration.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
