//! Station resolution: config file profiles + CLI flag overrides.

use std::time::Duration;

use voltly_config::{Config, load_config_or_default, profile_to_station_config};
use voltly_core::StationConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The profile name in effect: `--station` flag, then the file's default.
pub fn active_station_name(global: &GlobalOpts, config: &Config) -> Option<String> {
    global
        .station
        .clone()
        .or_else(|| config.default_station.clone())
}

/// Build a `StationConfig` from the config file, profile, and CLI overrides.
pub fn build_station_config(global: &GlobalOpts) -> Result<StationConfig, CliError> {
    let config = load_config_or_default();

    // An explicit --uid wins over any profile.
    if let Some(ref uid) = global.uid {
        if uid.is_empty() {
            return Err(CliError::Validation {
                field: "uid".into(),
                reason: "must not be empty".into(),
            });
        }
        return Ok(StationConfig {
            poi_uid: uid.clone(),
            poll_interval: Duration::from_secs(config.defaults.poll_interval),
            timeout: Duration::from_secs(global.timeout),
            ..StationConfig::default()
        });
    }

    let Some(name) = active_station_name(global, &config) else {
        return Err(no_station());
    };
    let Some(profile) = config.stations.get(&name) else {
        // A missing named profile is a user error; a missing default
        // profile just means nothing is configured yet.
        if global.station.is_some() {
            return Err(CliError::UnknownProfile {
                name,
                path: config_path_display(),
            });
        }
        return Err(no_station());
    };

    let mut station = profile_to_station_config(profile, &config.defaults)?;
    if profile.timeout.is_none() {
        station.timeout = Duration::from_secs(global.timeout);
    }
    Ok(station)
}

pub fn config_path_display() -> String {
    voltly_config::config_path().display().to_string()
}

fn no_station() -> CliError {
    CliError::NoStation {
        path: config_path_display(),
    }
}
