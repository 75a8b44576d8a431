//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use tracing::warn;

use lorasim_core::{Confirm, Controller, DeviceRecord, EntityId, Selection};

use crate::cli::{GlobalOpts, SelectArgs};
use crate::error::CliError;

/// Build a device selection from explicit ids or `--all`.
pub fn select_devices(controller: &Controller, args: &SelectArgs) -> Selection {
    if args.all {
        controller
            .devices_snapshot()
            .iter()
            .map(|d| d.id.clone())
            .collect()
    } else {
        parse_ids(&args.ids)
    }
}

/// Build a gateway selection from explicit ids or `--all`.
pub fn select_gateways(controller: &Controller, args: &SelectArgs) -> Selection {
    if args.all {
        controller
            .gateways_snapshot()
            .iter()
            .map(|g| g.id.clone())
            .collect()
    } else {
        parse_ids(&args.ids)
    }
}

fn parse_ids(raw: &[String]) -> Selection {
    raw.iter().map(|s| EntityId::new(s.trim())).collect()
}

/// Resolve a device by EUI, falling back to an exact name match.
pub fn resolve_device(
    controller: &Controller,
    identifier: &str,
) -> Result<Arc<DeviceRecord>, CliError> {
    match controller.device(&EntityId::new(identifier)) {
        Ok(found) => Ok(found),
        Err(not_found) => controller
            .devices_snapshot()
            .iter()
            .find(|d| d.name == identifier)
            .cloned()
            .ok_or_else(|| not_found.into()),
    }
}

/// Every selected id must name a registry device.
pub fn ensure_devices(controller: &Controller, selection: &Selection) -> Result<(), CliError> {
    for id in selection.iter() {
        controller.device(id)?;
    }
    Ok(())
}

/// Every selected id must name a registry gateway.
pub fn ensure_gateways(controller: &Controller, selection: &Selection) -> Result<(), CliError> {
    for id in selection.iter() {
        controller.gateway(id)?;
    }
    Ok(())
}

// ── Confirmation ────────────────────────────────────────────────────

/// Terminal yes/no prompt, auto-approving if `--yes` was passed.
pub struct PromptConfirm {
    yes: bool,
}

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                warn!(error = %e, "confirmation prompt failed");
                false
            })
    }
}

/// A confirmer for `action`, refusing up front when no terminal is
/// attached and `--yes` was not given.
pub fn confirmer(global: &GlobalOpts, action: &str) -> Result<PromptConfirm, CliError> {
    if !global.yes && !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Ok(PromptConfirm { yes: global.yes })
}
