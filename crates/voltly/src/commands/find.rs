//! `voltly find` -- station discovery by keyword search or share link.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tabled::Tabled;

use voltly_api::models::PlacePoi;
use voltly_api::place::resolve_share_link;
use voltly_api::{API_BASE, ChargeClient, TransportConfig, extract_poi_uid};

use crate::cli::{FindArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled, Serialize)]
struct StationRow {
    #[tabled(rename = "UID")]
    uid: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

pub async fn handle(args: FindArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let timeout = Duration::from_secs(global.timeout);

    if let Some(ref link) = args.link {
        // A full map URL may already carry the uid; only short links
        // need the redirect peek.
        let uid = match extract_poi_uid(link) {
            Some(uid) => Some(uid),
            None => resolve_share_link(link, timeout).await?,
        };
        return match uid {
            Some(uid) => {
                output::print_output(&uid, global.quiet);
                Ok(())
            }
            None => Err(CliError::Operation(format!("no POI uid found in {link}"))),
        };
    }

    let Some(ref query) = args.query else {
        return Err(CliError::Validation {
            field: "find".into(),
            reason: "pass --query or --link".into(),
        });
    };

    let config = voltly_config::load_config_or_default();
    let api_key = match args.api_key {
        Some(key) => SecretString::from(key),
        None => voltly_config::resolve_api_key(&config).map_err(|_| CliError::NoApiKey)?,
    };

    let transport = TransportConfig { timeout };
    let base = API_BASE.parse().expect("valid default API base");
    let client = ChargeClient::new(base, &transport)?;

    let region = args.region.as_deref().unwrap_or("全国");
    let response = client
        .search_stations(api_key.expose_secret(), region, query)
        .await?;

    if response.results.is_empty() {
        let message = response
            .message
            .unwrap_or_else(|| "no matching stations".into());
        return Err(CliError::Operation(message));
    }

    let rendered = output::render_list(
        &global.output,
        &response.results,
        |poi: &PlacePoi| StationRow {
            uid: poi.uid.clone(),
            name: poi.name.clone(),
            address: poi.address.clone().unwrap_or_default(),
        },
        |poi| poi.uid.clone(),
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}
