use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::error::SubscribeError;
use super::sender::run_sender;
use super::timer::run_timer;
use super::types::{ServerFrame, SubscriptionRequest, Update};
use crate::storage::LineStorage;

/// Shared, immutable inputs of every subscription session.
pub struct SubscriptionService {
    storage: Arc<dyn LineStorage>,
    pull_intervals: HashMap<String, u32>,
    shutdown: CancellationToken,
}

impl SubscriptionService {
    pub fn new(
        storage: Arc<dyn LineStorage>,
        pull_intervals: HashMap<String, u32>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            storage,
            pull_intervals,
            shutdown,
        }
    }

    /// Runs one subscription session to completion.
    ///
    /// The session owns three cooperating activities under one child
    /// cancellation scope: this receiver loop, the timer task and the sender
    /// task. Both tasks are joined before this returns, on every exit path.
    pub async fn handle_socket(&self, socket: WebSocket) {
        let (ws_tx, mut ws_rx) = socket.split();
        let sink = Arc::new(Mutex::new(ws_tx));

        let session = self.shutdown.child_token();
        let (update_tx, update_rx) = mpsc::channel::<Update>(1);
        let (push_tx, push_rx) = mpsc::channel::<Option<HashSet<String>>>(1);

        let timer = tokio::spawn(run_timer(session.clone(), update_rx, push_tx));
        let sender = tokio::spawn(run_sender(
            session.clone(),
            push_rx,
            Arc::clone(&self.storage),
            Arc::clone(&sink),
        ));

        info!("subscription session opened");

        // The valid sport set is snapshotted once per session; sports pulled
        // into the store later are rejected until the client reconnects.
        let valid_sports = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "failed to snapshot sport keys");
                HashSet::new()
            }
        };

        let mut current_set: HashSet<String> = HashSet::new();

        let terminal: Option<SubscribeError> = loop {
            let frame = tokio::select! {
                _ = session.cancelled() => break None,
                frame = ws_rx.next() => frame,
            };

            let msg = match frame {
                None => break None,
                Some(Err(e)) => {
                    warn!(error = %e, "error receiving from subscription stream");
                    continue;
                }
                Some(Ok(msg)) => msg,
            };

            let req: SubscriptionRequest = match msg {
                Message::Text(text) => match serde_json::from_str(text.as_str()) {
                    Ok(req) => req,
                    Err(e) => {
                        warn!(error = %e, "malformed subscription request");
                        continue;
                    }
                },
                Message::Close(_) => break None,
                // Ping/pong and binary frames carry no requests.
                _ => continue,
            };

            match validate(&req, &valid_sports, &self.pull_intervals) {
                Err(err) => break Some(err),
                Ok(new_set) => {
                    let sport_set = (new_set != current_set).then(|| new_set.clone());
                    current_set = new_set;

                    let update = Update {
                        interval: Duration::from_secs(u64::from(req.time_interval)),
                        sport_set,
                    };
                    // Blocking send: backpressure from a stalled sender is
                    // intentional.
                    if update_tx.send(update).await.is_err() {
                        break None;
                    }
                }
            }
        };

        session.cancel();
        let _ = timer.await;
        let _ = sender.await;

        // The sender has been joined; the write half is exclusively ours now.
        let mut sink = sink.lock().await;
        if let Some(err) = terminal {
            warn!(error = %err, "subscription request rejected; closing stream");
            let frame = ServerFrame::Error {
                code: err.code().to_string(),
                message: err.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&frame) {
                let _ = sink.send(Message::Text(text.into())).await;
            }
        }
        let _ = sink.send(Message::Close(None)).await;

        info!("subscription session closed");
    }
}

/// Checks a request against the session's sport snapshot and the configured
/// pulling intervals; the first failed check wins. Returns the requested
/// sport set on success.
fn validate(
    req: &SubscriptionRequest,
    valid_sports: &HashSet<String>,
    pull_intervals: &HashMap<String, u32>,
) -> Result<HashSet<String>, SubscribeError> {
    if req.sport_names.is_empty() {
        return Err(SubscribeError::EmptySportList);
    }

    for sport in &req.sport_names {
        if !valid_sports.contains(sport) {
            return Err(SubscribeError::UnknownSport);
        }
    }

    for sport in &req.sport_names {
        let pulling = pull_intervals.get(sport).copied().unwrap_or(0);
        if pulling > req.time_interval {
            return Err(SubscribeError::PeriodicityTooFast);
        }
    }

    let mut set = HashSet::with_capacity(req.sport_names.len());
    for sport in &req.sport_names {
        if !set.insert(sport.clone()) {
            return Err(SubscribeError::DuplicateSport);
        }
    }

    Ok(set)
}
