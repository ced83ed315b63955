// ── Runtime station configuration ──
//
// Describes *which* station to poll and how often. Built by the CLI or
// another host layer and handed in; core never reads config files and
// keeps no process-wide state shared across stations.

use std::time::Duration;

use url::Url;

/// Configuration for polling a single charging station.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Charge service base URL.
    pub api_base: Url,
    /// POI uid of the station.
    pub poi_uid: String,
    /// Optional display name override (falls back to the feed's own name).
    pub name: Option<String>,
    /// How often the poll task runs.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            api_base: voltly_api::API_BASE.parse().expect("valid default API base"),
            poi_uid: String::new(),
            name: None,
            poll_interval: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
        }
    }
}
