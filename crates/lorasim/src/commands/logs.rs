//! Device log viewer.
//!
//! One-shot mode waits for the first settled fetch and prints it.
//! Follow mode keeps the monitor polling and prints only lines it has
//! not printed yet, until interrupted.

use tokio::sync::watch;

use lorasim_core::{Controller, EntityId, LogSnapshot, LogStatus};

use crate::cli::{GlobalOpts, LogsArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    controller: &Controller,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let monitor = controller.log_monitor();
    let mut rx = monitor.subscribe();
    monitor.open(EntityId::new(args.device.trim()));

    if !args.follow {
        let snap = next_settled(&mut rx).await;
        monitor.close();
        return print_once(&snap?, global);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut printed: Vec<String> = Vec::new();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            snap = next_settled(&mut rx) => {
                let snap = snap?;
                if snap.status == LogStatus::Error {
                    if let Some(ref err) = snap.last_error {
                        eprintln!("! {err}");
                    }
                    continue;
                }
                let fresh = fresh_lines(&printed, &snap.buffer);
                if !fresh.is_empty() {
                    output::print_output(&fresh.join("\n"), global.quiet);
                }
                printed = snap.buffer;
            }
        }
    }

    monitor.close();
    Ok(())
}

/// Wait for the next `Ready` or `Error` snapshot.
async fn next_settled(rx: &mut watch::Receiver<LogSnapshot>) -> Result<LogSnapshot, CliError> {
    loop {
        rx.changed().await.map_err(|_| CliError::ApiError {
            code: "logs".into(),
            message: "log monitor stopped".into(),
        })?;
        let snap = rx.borrow_and_update().clone();
        if matches!(snap.status, LogStatus::Ready | LogStatus::Error) {
            return Ok(snap);
        }
    }
}

fn print_once(snap: &LogSnapshot, global: &GlobalOpts) -> Result<(), CliError> {
    if snap.status == LogStatus::Error {
        return Err(CliError::ApiError {
            code: "logs".into(),
            message: snap.last_error.clone().unwrap_or_default(),
        });
    }
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => snap.buffer.join("\n"),
        _ => output::render_single(&global.output, snap, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Lines of `buffer` not yet shown. A buffer that no longer extends what
/// was printed (log rotated or device reset) is shown in full.
fn fresh_lines<'a>(printed: &[String], buffer: &'a [String]) -> &'a [String] {
    if buffer.starts_with(printed) {
        &buffer[printed.len()..]
    } else {
        buffer
    }
}
