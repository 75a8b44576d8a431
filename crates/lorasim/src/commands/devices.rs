//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lorasim_core::{Controller, DeviceFilter, DeviceRecord, EntityId, FleetCommand, GateState};

use crate::cli::{DeviceListArgs, DevicesArgs, DevicesCommand, GlobalOpts, SelectArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "EUI")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Uplink")]
    uplink: String,
}

impl DeviceRow {
    fn new(d: &DeviceRecord, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            gateway: d
                .gateway_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            region: d.region.clone().unwrap_or_default(),
            state: output::paint_activation(d.activation, color),
            uplink: output::paint_uplink(d.uplink, color),
        }
    }
}

fn detail(d: &Arc<DeviceRecord>) -> String {
    [
        format!("EUI:      {}", d.id),
        format!("Name:     {}", d.name),
        format!(
            "Gateway:  {}",
            d.gateway_id
                .as_ref()
                .map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Region:   {}", d.region.as_deref().unwrap_or("-")),
        format!("State:    {}", d.activation),
        format!("Uplink:   {}", d.uplink),
    ]
    .join("\n")
}

fn gates_detail(g: &GateState) -> String {
    let flag = |on: bool| if on { "yes" } else { "no" };
    [
        format!("start:         {}", flag(g.can_start)),
        format!("stop:          {}", flag(g.can_stop)),
        format!("uplink-start:  {}", flag(g.can_start_uplink)),
        format!("uplink-stop:   {}", flag(g.can_stop_uplink)),
        format!("edit:          {}", flag(g.can_edit)),
        format!("delete:        {}", flag(g.can_delete)),
    ]
    .join("\n")
}

fn filters(args: &DeviceListArgs) -> Vec<DeviceFilter> {
    let mut filters = Vec::new();
    if let Some(state) = args.state {
        filters.push(DeviceFilter::ByActivation(state));
    }
    if let Some(uplink) = args.uplink {
        filters.push(DeviceFilter::ByUplink(uplink));
    }
    if let Some(ref gw) = args.gateway {
        filters.push(DeviceFilter::ByGateway(EntityId::new(gw.trim())));
    }
    if let Some(ref region) = args.region {
        filters.push(DeviceFilter::ByRegion(region.clone()));
    }
    if filters.is_empty() {
        filters.push(DeviceFilter::All);
    }
    filters
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list) => {
            let filters = filters(&list);
            let color = output::should_color(&global.color);
            let snap: Vec<Arc<DeviceRecord>> = controller
                .devices_snapshot()
                .iter()
                .filter(|d| filters.iter().all(|f| f.matches(d)))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &snap,
                |d| DeviceRow::new(d, color),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let found = util::resolve_device(controller, &device)?;
            let out = output::render_single(&global.output, &found, detail, |d| d.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Gates(sel) => {
            let selection = util::select_devices(controller, &sel);
            let gates = controller.gates(&selection);
            let out = output::render_single(&global.output, &gates, gates_detail, |g| {
                FleetCommand::ALL
                    .iter()
                    .filter(|c| g.allows(**c))
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Start(sel) => run(controller, FleetCommand::StartDevices, &sel, global).await,
        DevicesCommand::Stop(sel) => run(controller, FleetCommand::StopDevices, &sel, global).await,
        DevicesCommand::UplinkStart(sel) => {
            run(controller, FleetCommand::StartUplink, &sel, global).await
        }
        DevicesCommand::UplinkStop(sel) => {
            run(controller, FleetCommand::StopUplink, &sel, global).await
        }

        DevicesCommand::Delete(sel) => {
            let selection = util::select_devices(controller, &sel);
            util::ensure_devices(controller, &selection)?;
            super::delete_selection(controller, &selection, global, "devices").await
        }
    }
}

/// Send one gated batch command and report the result.
async fn run(
    controller: &Controller,
    command: FleetCommand,
    sel: &SelectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let selection = util::select_devices(controller, sel);
    let result = controller.execute(command, &selection).await?;

    if matches!(global.output, crate::cli::OutputFormat::Table) {
        if !global.quiet {
            eprintln!(
                "✓ {} sent for {} device(s), {} changed",
                command,
                result.ids.len(),
                result.changed
            );
        }
        return Ok(());
    }

    let out = output::render_single(&global.output, &result, |_| String::new(), |r| {
        r.ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
