//! Poller pool and readiness endpoint against an in-process stub provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use sportlines::puller::client::LinesProviderClient;
use sportlines::puller::{LinePuller, PullerStatus};
use sportlines::readiness;
use sportlines::storage::{LineStorage, MemoryLineStorage};

/// Stub lines provider: answers with the configured value, upper-casing the
/// sport key the way the real provider does, and 500s for anything else.
#[derive(Clone, Default)]
struct StubProvider {
    lines: Arc<RwLock<HashMap<String, f64>>>,
}

async fn lines_handler(
    State(stub): State<StubProvider>,
    Path(sport): Path<String>,
) -> axum::response::Response {
    let Some(value) = stub.lines.read().get(&sport).copied() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let mut lines = serde_json::Map::new();
    lines.insert(
        sport.to_uppercase(),
        serde_json::Value::String(format!("{value}")),
    );
    Json(serde_json::json!({ "lines": lines })).into_response()
}

async fn spawn_stub(stub: StubProvider) -> String {
    let app = Router::new()
        .route("/api/v1/lines/{sport}", get(lines_handler))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api/v1/lines/")
}

fn intervals(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
    pairs.iter().map(|(s, i)| (s.to_string(), *i)).collect()
}

async fn wait_for_status(puller: &LinePuller, wanted: PullerStatus) {
    let deadline = Duration::from_secs(10);
    let poll = async {
        loop {
            if puller.status().await == wanted {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    tokio::time::timeout(deadline, poll)
        .await
        .unwrap_or_else(|_| panic!("puller never reached {wanted:?}"));
}

#[tokio::test]
async fn workers_fill_the_store_until_ready() {
    let stub = StubProvider::default();
    stub.lines.write().insert("soccer".into(), 1.5);
    stub.lines.write().insert("football".into(), 0.7);
    let base_url = spawn_stub(stub).await;

    let storage = Arc::new(MemoryLineStorage::new());
    let shutdown = CancellationToken::new();
    let client = LinesProviderClient::new(base_url).unwrap();
    let (puller, workers) = LinePuller::spawn(
        client,
        vec!["soccer".into(), "football".into()],
        &intervals(&[("soccer", 1), ("football", 1)]),
        storage.clone() as Arc<dyn LineStorage>,
        shutdown.clone(),
    )
    .unwrap();

    assert_eq!(puller.status().await, PullerStatus::NotReady);
    wait_for_status(&puller, PullerStatus::Ready).await;

    assert_eq!(storage.get("soccer").await.unwrap(), Some(1.5));
    assert_eq!(storage.get("football").await.unwrap(), Some(0.7));

    shutdown.cancel();
    for worker in workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn failing_sport_flags_the_provider_and_keeps_good_values() {
    // The stub only knows soccer; football pulls keep failing.
    let stub = StubProvider::default();
    stub.lines.write().insert("soccer".into(), 1.5);
    let base_url = spawn_stub(stub).await;

    let storage = Arc::new(MemoryLineStorage::new());
    let shutdown = CancellationToken::new();
    let client = LinesProviderClient::new(base_url).unwrap();
    let (puller, _workers) = LinePuller::spawn(
        client,
        vec!["soccer".into(), "football".into()],
        &intervals(&[("soccer", 1), ("football", 1)]),
        storage.clone() as Arc<dyn LineStorage>,
        shutdown.clone(),
    )
    .unwrap();

    wait_for_status(&puller, PullerStatus::ProviderUnavailable).await;

    // The healthy worker kept its last good value in place.
    assert_eq!(storage.get("soccer").await.unwrap(), Some(1.5));
    assert_eq!(storage.get("football").await.unwrap(), None);

    shutdown.cancel();
}

async fn spawn_readiness(puller: Arc<LinePuller>, shutdown: CancellationToken) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(readiness::serve(listener, puller, shutdown));
    format!("http://{addr}/ready")
}

async fn probe(url: &str) -> (StatusCode, String) {
    let resp = reqwest::get(url).await.unwrap();
    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    (status, body["response"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn ready_endpoint_reports_all_three_states() {
    let stub = StubProvider::default();
    stub.lines.write().insert("soccer".into(), 1.5);
    let base_url = spawn_stub(stub).await;

    let storage = Arc::new(MemoryLineStorage::new());
    let shutdown = CancellationToken::new();
    let client = LinesProviderClient::new(base_url).unwrap();

    // football is never served by the stub, so the pool cannot become ready
    // on its own; the slow soccer interval keeps the first probe race-free.
    let (puller, _workers) = LinePuller::spawn(
        client,
        vec!["soccer".into(), "football".into()],
        &intervals(&[("soccer", 3600), ("football", 2)]),
        storage.clone() as Arc<dyn LineStorage>,
        shutdown.clone(),
    )
    .unwrap();

    let url = spawn_readiness(Arc::clone(&puller), shutdown.clone()).await;

    // Before the first tick nothing is pulled and nothing has failed yet.
    let (status, body) = probe(&url).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Please try later");

    wait_for_status(&puller, PullerStatus::ProviderUnavailable).await;
    let (status, body) = probe(&url).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "Service is unavailable");

    // Completing the store flips the endpoint to OK.
    storage.upload("soccer", 1.5).await.unwrap();
    storage.upload("football", 0.7).await.unwrap();
    let (status, body) = probe(&url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    shutdown.cancel();
}
