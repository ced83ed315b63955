//! `voltly status` -- one-shot refresh and render.

use voltly_core::StationCoordinator;

use crate::cli::{GlobalOpts, OutputFormat, StatusArgs};
use crate::config::build_station_config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let station = build_station_config(global)?;
    let coordinator = StationCoordinator::new(station)?;
    let values = coordinator.refresh().await;

    let rendered = if args.raw {
        let snapshot = coordinator.snapshot().await;
        match global.output {
            OutputFormat::JsonCompact => output::render_json_compact(&snapshot),
            _ => output::render_json_pretty(&snapshot),
        }
    } else {
        output::render_values(&global.output, &values, output::should_color(&global.color))
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
