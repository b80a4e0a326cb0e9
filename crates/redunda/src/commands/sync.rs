//! Sync command: one reconciliation pass.

use serde::Serialize;
use tabled::Tabled;

use redunda_core::{Direction, SyncReport};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

/// One line of a transfer report, shared with `files push`.
#[derive(Serialize)]
pub(crate) struct TransferLine {
    file: String,
    action: &'static str,
    result: String,
}

#[derive(Tabled)]
struct TransferRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&TransferLine> for TransferRow {
    fn from(l: &TransferLine) -> Self {
        Self {
            file: l.file.clone(),
            action: l.action.into(),
            result: l.result.clone(),
        }
    }
}

fn action(direction: Direction) -> &'static str {
    match direction {
        Direction::Push => "push",
        Direction::Pull => "pull",
    }
}

/// Flatten a report into one line per file.
pub(crate) fn transfer_lines(report: &SyncReport) -> Vec<TransferLine> {
    let ok = |file: &String, action: &'static str| TransferLine {
        file: file.clone(),
        action,
        result: "ok".into(),
    };

    let mut lines: Vec<TransferLine> = report.pushed.iter().map(|f| ok(f, "push")).collect();
    lines.extend(report.pulled.iter().map(|f| {
        let mut line = ok(f, "pull");
        if report.discovered.contains(f) {
            line.result = "ok (new)".into();
        }
        line
    }));
    lines.extend(report.failures.iter().map(|f| TransferLine {
        file: f.identifier.clone(),
        action: action(f.direction),
        result: format!("failed: {}", f.error),
    }));
    lines
}

/// Print a transfer report and fail if any transfer failed.
pub(crate) fn print_report(report: &SyncReport, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        crate::cli::OutputFormat::Json => output::render_json(report),
        ref format => output::render_list(
            format,
            &transfer_lines(report),
            |l| TransferRow::from(l),
            |l| format!("{} {} {}", l.action, l.file, l.result),
        ),
    };
    output::print_output(&out, global.quiet);

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::SyncIncomplete {
            failed: report.failures.len(),
        })
    }
}

pub async fn handle(args: SyncArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let reconciler = super::reconciler(session, &args.track)?;
    let report = reconciler.sync_files().await?;
    print_report(&report, global)
}
