//! `voltly config` -- inspect and bootstrap the configuration file.

use voltly_config::{Config, StationProfile, config_path, load_config, save_config};

use crate::cli::{ConfigAction, ConfigArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigAction::Show => {
            let mut config = load_config()?;
            // Never echo the key itself.
            if config.api_key.is_some() {
                config.api_key = Some("<redacted>".into());
            }
            let rendered =
                toml::to_string_pretty(&config).map_err(voltly_config::ConfigError::from)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigAction::Init { uid } => {
            let path = config_path();
            if path.exists() {
                return Err(CliError::Operation(format!(
                    "config already exists at {}",
                    path.display()
                )));
            }

            let mut config = Config::default();
            config.stations.insert(
                "default".into(),
                StationProfile {
                    poi_uid: uid.unwrap_or_default(),
                    name: None,
                    api_base: None,
                    poll_interval: None,
                    timeout: None,
                },
            );
            save_config(&config)?;
            output::print_output(
                &format!("wrote starter config to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}
