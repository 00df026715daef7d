use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no line for sport {0} in provider response")]
    MissingSport(String),

    #[error("line parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}

/// Wire shape of a provider response:
/// `{"lines": {"<SPORT_UPPER>": "<decimal string>"}}`.
#[derive(Debug, Deserialize)]
struct LinesEnvelope {
    lines: HashMap<String, String>,
}

#[derive(Clone)]
pub struct LinesProviderClient {
    http: Client,
    base_url: String,
}

impl LinesProviderClient {
    pub fn new(base_url: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Fetches the current line for one sport. The provider keys its JSON by
    /// the upper-cased sport name and encodes the value as a decimal string.
    #[instrument(
        skip(self),
        fields(sport = %sport),
        level = "debug"
    )]
    pub async fn fetch_line(&self, sport: &str) -> Result<f64, ProviderError> {
        let url = format!("{}{}", self.base_url, sport);

        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let envelope: LinesEnvelope = resp.json().await?;

        let raw = envelope
            .lines
            .get(&sport.to_uppercase())
            .ok_or_else(|| ProviderError::MissingSport(sport.to_string()))?;
        let line: f64 = raw.parse()?;

        debug!(line, "line fetched from provider");

        Ok(line)
    }
}
