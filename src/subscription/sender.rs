use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{ServerFrame, SubscriptionResponse};
use crate::storage::LineStorage;

/// Builds and writes pushes for one session.
///
/// Owns the per-subscriber baseline (`last_seen_line`). A `Some(set)` trigger
/// replaces the baseline wholesale and reports absolute values for exactly
/// that set; a `None` trigger reports per-sport deltas against the baseline
/// and advances it. The write half is shared with the receiver, which uses it
/// once, for the terminal frame, strictly after this task has been joined.
pub(crate) async fn run_sender<S>(
    session: CancellationToken,
    mut push_rx: Receiver<Option<HashSet<String>>>,
    storage: Arc<dyn LineStorage>,
    sink: Arc<Mutex<S>>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    let mut last_seen_line: HashMap<String, f64> = HashMap::new();

    loop {
        let trigger = tokio::select! {
            _ = session.cancelled() => break,
            trigger = push_rx.recv() => match trigger {
                Some(trigger) => trigger,
                None => break,
            },
        };

        let mut sport_name_to_line = HashMap::new();
        match trigger {
            None => {
                let mut refreshed = HashMap::with_capacity(last_seen_line.len());
                for (sport, prev) in &last_seen_line {
                    let current = read_line(storage.as_ref(), sport).await;
                    sport_name_to_line.insert(sport.clone(), current - prev);
                    refreshed.insert(sport.clone(), current);
                }
                last_seen_line = refreshed;
            }
            Some(sport_set) => {
                last_seen_line = HashMap::with_capacity(sport_set.len());
                for sport in sport_set {
                    let current = read_line(storage.as_ref(), &sport).await;
                    sport_name_to_line.insert(sport.clone(), current);
                    last_seen_line.insert(sport, current);
                }
            }
        }

        let frame = ServerFrame::Lines(SubscriptionResponse { sport_name_to_line });
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode subscription response");
                continue;
            }
        };

        if let Err(e) = sink.lock().await.send(Message::Text(text.into())).await {
            // The transport surfaces fatal conditions through the receiver; a
            // failed push is not terminal on its own.
            warn!(error = %e, "failed to push lines to subscriber");
        }
    }

    debug!("session sender stopped");
}

/// Missing keys and storage read failures read as absence. Validation
/// guarantees subscribed sports exist at session start, so this stays a
/// tolerated corner rather than an error path.
async fn read_line(storage: &dyn LineStorage, sport: &str) -> f64 {
    match storage.get(sport).await {
        Ok(Some(line)) => line,
        Ok(None) => 0.0,
        Err(e) => {
            warn!(sport = %sport, error = %e, "line read failed; treating as absent");
            0.0
        }
    }
}
