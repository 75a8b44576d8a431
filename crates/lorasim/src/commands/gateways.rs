//! Gateway command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lorasim_core::{Controller, GatewayFilter, GatewayRecord};

use crate::cli::{GatewaysArgs, GatewaysCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct GatewayRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
    #[tabled(rename = "Devices")]
    devices: u32,
}

impl From<&Arc<GatewayRecord>> for GatewayRow {
    fn from(g: &Arc<GatewayRecord>) -> Self {
        Self {
            id: g.id.to_string(),
            name: g.name.clone(),
            mac: g.mac.as_ref().map(ToString::to_string).unwrap_or_default(),
            kind: g.kind_label(),
            devices: g.device_count,
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: GatewaysArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GatewaysCommand::List { virtual_only, real } => {
            let filter = if virtual_only {
                GatewayFilter::Virtual
            } else if real {
                GatewayFilter::Real
            } else {
                GatewayFilter::All
            };
            let snap: Vec<Arc<GatewayRecord>> = controller
                .gateways_snapshot()
                .iter()
                .filter(|g| filter.matches(g))
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &snap,
                |g| GatewayRow::from(g),
                |g| g.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GatewaysCommand::Delete(sel) => {
            let selection = util::select_gateways(controller, &sel);
            util::ensure_gateways(controller, &selection)?;
            super::delete_selection(controller, &selection, global, "gateways").await
        }
    }
}
