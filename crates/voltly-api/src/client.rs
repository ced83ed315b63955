// Charge service HTTP client
//
// Wraps `reqwest::Client` with the vendor's URL construction, the fixed
// query parameters every call must carry, and `{data: ...}` envelope
// unwrapping. Callers always receive the inner `data` object; the envelope
// is stripped before they see it.

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::models::ChargeEnvelope;
use crate::transport::TransportConfig;

/// Default base URL of the vendor charge service.
pub const API_BASE: &str = "https://charging.map.baidu.com/charge_service";

/// Pricing-tier type code used when the station detail omits `tp_code`.
pub const DEFAULT_TP_CODE: i64 = 88;

/// Query parameters the service requires on every call.
const COMMON_PARAMS: [(&str, &str); 4] = [
    ("sv", "19.0.0"),
    ("os", "ios"),
    ("cuid", ""),
    ("callback", ""),
];

/// Raw HTTP client for the charge service API.
///
/// The service is read-only and unauthenticated beyond its fixed query
/// parameters, so there is no session state here -- just URL construction
/// and envelope handling.
pub struct ChargeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ChargeClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` should be the service root, e.g. [`API_BASE`].
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for discovery flows that need direct access).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/{api}`.
    pub(crate) fn api_url(&self, api: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            api.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the station detail document for a POI uid.
    ///
    /// Returns the envelope's `data` object; an empty object when the
    /// service answered without data.
    pub async fn station_detail(&self, uid: &str) -> Result<Map<String, Value>, Error> {
        self.get("charge_station/get_charge_detail", &[("uid", uid)])
            .await
    }

    /// Fetch the connector detail document for one pricing tier.
    ///
    /// `tp_code` is the tier type code from the station detail; pass
    /// [`DEFAULT_TP_CODE`] when the tier omits it.
    pub async fn connector_detail(
        &self,
        uid: &str,
        station_id: &str,
        tp_code: i64,
    ) -> Result<Map<String, Value>, Error> {
        let code = tp_code.to_string();
        self.get(
            "charge_station/get_connector_detail",
            &[("uid", uid), ("station_id", station_id), ("tp_code", &code)],
        )
        .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET with the common query parameters and unwrap the envelope.
    pub(crate) async fn get(
        &self,
        api: &str,
        params: &[(&str, &str)],
    ) -> Result<Map<String, Value>, Error> {
        let url = self.api_url(api)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&COMMON_PARAMS)
            .query(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let envelope: ChargeEnvelope =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        match envelope.data {
            Some(Value::Object(map)) => {
                debug!(api, fields = map.len(), "request succeeded");
                Ok(map)
            }
            _ => {
                warn!(api, "response carried no data object");
                Ok(Map::new())
            }
        }
    }
}
