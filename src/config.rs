use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::bail;
use clap::{Parser, ValueEnum};
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// tracing has no fatal level; map it to the closest severity.
    pub fn as_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error | LogLevel::Fatal => Level::ERROR,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(name = "sportlines", version)]
pub struct Cli {
    /// Listen address for the readiness HTTP server
    #[clap(long, default_value = "0.0.0.0:8090")]
    pub http: SocketAddr,

    /// Listen address for the subscription stream server
    #[clap(long, default_value = "0.0.0.0:8091")]
    pub stream: SocketAddr,

    /// Base URL of the lines provider (must end in '/')
    #[clap(long, default_value = "http://localhost:8000/api/v1/lines/")]
    pub provider: String,

    /// Interval for pulling baseball lines (seconds)
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub baseball: u32,

    /// Interval for pulling football lines (seconds)
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub football: u32,

    /// Interval for pulling soccer lines (seconds)
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub soccer: u32,

    /// Log level
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    pub log: LogLevel,

    /// Database connection string; the store is kept in memory when unset
    #[clap(long)]
    pub database_url: Option<String>,
}

/// Runtime configuration shared by the poller pool and the subscription
/// service. The sport catalogue and per-sport pulling intervals are fixed at
/// startup; components receive them from here rather than via globals.
#[derive(Clone, Debug)]
pub struct Config {
    pub http_addr: SocketAddr,
    pub stream_addr: SocketAddr,
    pub provider_url: String,
    pub sports: Vec<String>,
    pub pull_intervals: HashMap<String, u32>,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        if !cli.provider.ends_with('/') {
            bail!("provider base URL must end in '/': {}", cli.provider);
        }

        let pull_intervals = HashMap::from([
            ("baseball".to_string(), cli.baseball),
            ("football".to_string(), cli.football),
            ("soccer".to_string(), cli.soccer),
        ]);

        Ok(Self {
            http_addr: cli.http,
            stream_addr: cli.stream,
            provider_url: cli.provider.clone(),
            sports: vec!["baseball".into(), "football".into(), "soccer".into()],
            pull_intervals,
            database_url: cli.database_url.clone(),
        })
    }
}
