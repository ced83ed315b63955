// Charge service response types
//
// The station payload itself is a deep, loosely-typed document that the
// core's path-based converters walk directly, so only the envelope and the
// place-search response are modeled. Fields use `#[serde(default)]`
// liberally because the vendor is inconsistent about field presence.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Response envelope ────────────────────────────────────────────────

/// Standard charge service response envelope.
///
/// Every endpoint wraps its payload:
/// ```json
/// { "data": { ... }, ... }
/// ```
/// `data` may be absent or null on vendor-side errors.
#[derive(Debug, Deserialize)]
pub struct ChargeEnvelope {
    #[serde(default)]
    pub data: Option<Value>,

    /// Catch-all for undocumented envelope fields (status codes, messages).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Place search (station discovery) ─────────────────────────────────

/// Response from the Baidu place search API used for station discovery.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceSearchResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<PlacePoi>,
}

/// A single point of interest from the place search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacePoi {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
