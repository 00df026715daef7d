use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client frame: (re)parameterises the subscription. `time_interval` is the
/// desired push period in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub sport_names: Vec<String>,
    pub time_interval: u32,
}

/// One push. Values are absolute lines right after a sport-set change and
/// deltas against the previous push otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub sport_name_to_line: HashMap<String, f64>,
}

/// Server-to-client wire frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Lines(SubscriptionResponse),
    Error { code: String, message: String },
}

/// Receiver-to-timer message: the latest accepted interval, plus the new
/// sport set when it changed. `None` reconfigures the interval only.
#[derive(Debug, Clone)]
pub(crate) struct Update {
    pub interval: Duration,
    pub sport_set: Option<HashSet<String>>,
}
