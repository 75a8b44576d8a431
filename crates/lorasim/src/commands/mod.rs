//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod gateways;
pub mod logs;
pub mod summary;
pub mod util;

use lorasim_core::{Controller, DeleteOutcome, Selection};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a simulator-bound command to the appropriate handler.
///
/// Commands that read the registry load it first; `logs` and
/// `summary --remote` talk to the simulator directly.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let needs_registry = match &cmd {
        Command::Logs(_) => false,
        Command::Summary(args) => !args.remote,
        _ => true,
    };
    if needs_registry {
        controller.connect().await?;
    }

    match cmd {
        Command::Devices(args) => devices::handle(controller, args, global).await,
        Command::Gateways(args) => gateways::handle(controller, args, global).await,
        Command::Logs(args) => logs::handle(controller, args, global).await,
        Command::Summary(args) => summary::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Confirm and delete a selection, reporting what was removed.
pub(crate) async fn delete_selection(
    controller: &Controller,
    selection: &Selection,
    global: &GlobalOpts,
    kind: &str,
) -> Result<(), CliError> {
    let confirm = util::confirmer(global, &format!("{kind} delete"))?;
    let outcome = controller
        .delete_records(selection, &confirm)
        .await
        .map_err(|e| CliError::from(e).for_kind(kind))?;

    if !global.quiet {
        match outcome {
            DeleteOutcome::Cancelled => eprintln!("Cancelled; nothing was deleted"),
            DeleteOutcome::Deleted { ids } => eprintln!("✓ Deleted {} {kind}", ids.len()),
        }
    }
    Ok(())
}
