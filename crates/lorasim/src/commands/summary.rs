//! Fleet summary handler.

use lorasim_core::{Controller, FleetSummary};

use crate::cli::{GlobalOpts, SummaryArgs};
use crate::error::CliError;
use crate::output;

fn detail(s: &FleetSummary, refreshed: Option<&str>) -> String {
    let mut lines = vec![
        format!("Devices:   {}", s.total_devices),
        format!("  active:  {}", s.active_devices),
        format!("  paused:  {}", s.inactive_devices()),
        format!("Gateways:  {}", s.total_gateways),
    ];
    if let Some(at) = refreshed {
        lines.push(format!("Refreshed: {at}"));
    }
    lines.join("\n")
}

pub async fn handle(
    controller: &Controller,
    args: SummaryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (summary, refreshed) = if args.remote {
        (controller.fleet_summary().await?, None)
    } else {
        let refreshed = controller
            .store()
            .last_refresh()
            .map(|at| {
                at.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            });
        (controller.summary(), refreshed)
    };

    let out = output::render_single(
        &global.output,
        &summary,
        |s| detail(s, refreshed.as_deref()),
        |s| format!("{} {} {}", s.total_devices, s.active_devices, s.total_gateways),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
