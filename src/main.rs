use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sportlines::config::{Cli, Config};
use sportlines::db::Db;
use sportlines::logger::init_tracing;
use sportlines::puller::client::LinesProviderClient;
use sportlines::puller::LinePuller;
use sportlines::readiness;
use sportlines::storage::{LineStorage, MemoryLineStorage, SqlxLineStorage};
use sportlines::subscription::server as stream_server;
use sportlines::subscription::session::SubscriptionService;

/// Connects the configured store backend: SQL when a database URL is given,
/// otherwise the in-memory map. Everything downstream sees the same trait.
async fn init_storage(cfg: &Config) -> anyhow::Result<Arc<dyn LineStorage>> {
    match &cfg.database_url {
        Some(url) => {
            sqlx::any::install_default_drivers();
            let db = Db::connect(url).await?;
            db.migrate().await?;
            Ok(Arc::new(SqlxLineStorage::new(db.pool.clone())))
        }
        None => Ok(Arc::new(MemoryLineStorage::new())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_level());

    let cfg = Config::from_cli(&cli)?;
    info!(http = %cfg.http_addr, stream = %cfg.stream_addr, "starting sportlines service");

    let shutdown = CancellationToken::new();
    let storage = init_storage(&cfg).await?;

    let client = LinesProviderClient::new(cfg.provider_url.clone())?;
    let (puller, workers) = LinePuller::spawn(
        client,
        cfg.sports.clone(),
        &cfg.pull_intervals,
        Arc::clone(&storage),
        shutdown.clone(),
    )?;

    let service = Arc::new(SubscriptionService::new(
        Arc::clone(&storage),
        cfg.pull_intervals.clone(),
        shutdown.clone(),
    ));

    let http_listener = TcpListener::bind(cfg.http_addr).await?;
    let stream_listener = TcpListener::bind(cfg.stream_addr).await?;

    let readiness_srv = tokio::spawn(readiness::serve(
        http_listener,
        Arc::clone(&puller),
        shutdown.clone(),
    ));
    let stream_srv = tokio::spawn(stream_server::serve(
        stream_listener,
        service,
        shutdown.clone(),
    ));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received; draining workers and sessions");
    shutdown.cancel();

    for worker in workers {
        let _ = worker.await;
    }
    readiness_srv.await??;
    stream_srv.await??;

    info!("sportlines service stopped");
    Ok(())
}
