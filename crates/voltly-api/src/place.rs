// Station discovery
//
// Two ways to find a station's POI uid: keyword search against the Baidu
// place API (needs a map API key), or peeling a `j.map.baidu.com` share
// link, whose redirect target embeds the uid.

use std::time::Duration;

use reqwest::header::LOCATION;
use tracing::{debug, warn};

use crate::client::ChargeClient;
use crate::error::Error;
use crate::models::PlaceSearchResponse;

/// Baidu place search endpoint for keyword discovery.
pub const PLACE_SEARCH_URL: &str = "https://api.map.baidu.com/place/v2/search";

/// POI uids are long alphanumeric tokens; anything shorter is noise.
const MIN_UID_LEN: usize = 16;

impl ChargeClient {
    /// Search for charging stations by keyword within a region.
    ///
    /// Appends the vendor's category suffix to the keyword the same way the
    /// mobile client does, so bare station names still match.
    pub async fn search_stations(
        &self,
        api_key: &str,
        region: &str,
        keyword: &str,
    ) -> Result<PlaceSearchResponse, Error> {
        let query = format!("{keyword}充电站");
        debug!(region, %query, "place search");

        let resp = self
            .http()
            .get(PLACE_SEARCH_URL)
            .query(&[
                ("ak", api_key),
                ("region", region),
                ("query", &query),
                ("output", "json"),
            ])
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
        let parsed: PlaceSearchResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        if parsed.results.is_empty() {
            warn!(message = ?parsed.message, "place search returned no results");
        }
        Ok(parsed)
    }
}

/// Resolve a `j.map.baidu.com` share link to the POI uid it points at.
///
/// The short link answers with a redirect whose `Location` URL carries the
/// uid as a query parameter; the redirect itself is never followed.
pub async fn resolve_share_link(link: &str, timeout: Duration) -> Result<Option<String>, Error> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(Error::Transport)?;

    let resp = http
        .get(link.trim())
        .send()
        .await
        .map_err(Error::Transport)?;

    let Some(location) = resp
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
    else {
        warn!(%link, "share link did not redirect");
        return Ok(None);
    };

    Ok(extract_poi_uid(location))
}

/// Extract a POI uid from free text (a map URL, a pasted share message).
///
/// Accepts both the plain `uid=` form and the percent-encoded `uid%3D`
/// form, and requires the token to look like a real uid (16+ word chars).
pub fn extract_poi_uid(text: &str) -> Option<String> {
    for marker in ["uid=", "uid%3D"] {
        let mut search_from = 0;
        while let Some(pos) = text.get(search_from..)?.find(marker) {
            let begin = search_from + pos + marker.len();
            let token: String = text[begin..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if token.len() >= MIN_UID_LEN {
                return Some(token);
            }
            search_from = begin;
        }
    }
    None
}
