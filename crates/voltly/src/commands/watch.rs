//! `voltly watch` -- continuous polling with change notifications.

use std::time::Duration;

use voltly_core::{FlatValues, StationCoordinator};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::build_station_config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut station = build_station_config(global)?;
    if let Some(secs) = args.interval {
        station.poll_interval = Duration::from_secs(secs);
    }

    let coordinator = StationCoordinator::new(station)?;
    let color = output::should_color(&global.color);

    // Initial cycle, shown in full; the registry is populated after it,
    // so the subscription picks up dynamic tier/connector attrs too.
    let initial = coordinator.start().await;
    output::print_output(
        &output::render_values(&global.output, &initial, color),
        global.quiet,
    );

    let mut subscription = coordinator.subscribe(&args.attr).await;
    let mut remaining = args.count;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = subscription.next() => {
                let Some(values) = update else { break };

                // The coordinator delivers the full mapping; show only the
                // fields this subscription asked about.
                let subset: FlatValues = values
                    .iter()
                    .filter(|(attr, _)| subscription.attrs().contains(attr.as_str()))
                    .map(|(attr, value)| (attr.clone(), value.clone()))
                    .collect();
                output::print_output(
                    &output::render_values(&global.output, &subset, color),
                    global.quiet,
                );

                if let Some(count) = remaining.as_mut() {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        break;
                    }
                }
            }
        }
    }

    coordinator.stop().await;
    Ok(())
}
