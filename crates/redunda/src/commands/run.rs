//! Run command: heartbeat and sync until Ctrl-C.

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::{info, warn};

use redunda_core::{DirectiveState, HeartbeatMonitor};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

/// Render one directive change as a line of output.
fn directive_line(format: &OutputFormat, standby: bool, color: bool) -> String {
    let at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    match format {
        OutputFormat::Json => json!({ "at": at, "standby": standby }).to_string(),
        OutputFormat::Plain => output::directive_label(standby, false),
        OutputFormat::Table => format!("{at}  {}", output::directive_label(standby, color)),
    }
}

pub async fn handle(args: RunArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let format = global.output.clone();
    let color = output::should_color(&global.color);
    let quiet = global.quiet;

    let monitor = HeartbeatMonitor::from_config(&session.service, DirectiveState::shared())?
        .with_listener(move |standby: bool| {
            info!(standby, "directive changed");
            output::print_output(&directive_line(&format, standby, color), quiet);
        });
    if args.debug || session.debug {
        warn!("debug override enabled, this instance will never stand by");
        monitor.set_debug_override(true);
    }

    let reconciler = if args.no_sync {
        None
    } else {
        Some(super::reconciler(session, &args.track)?)
    };

    monitor.start();
    if let Some(ref reconciler) = reconciler {
        match reconciler.sync_and_start().await {
            Ok(report) => info!(
                pushed = report.pushed.len(),
                pulled = report.pulled.len(),
                failed = report.failures.len(),
                "initial sync complete"
            ),
            Err(e) => warn!(error = %e, "initial sync failed, retrying on schedule"),
        }
    }

    info!(profile = %session.profile_name, "running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    monitor.shutdown().await;
    if let Some(reconciler) = reconciler {
        reconciler.shutdown().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_lines_per_format() {
        assert_eq!(directive_line(&OutputFormat::Plain, true, false), "standby");

        let json: serde_json::Value =
            serde_json::from_str(&directive_line(&OutputFormat::Json, false, false))
                .expect("valid JSON");
        assert_eq!(json["standby"], false);

        assert!(directive_line(&OutputFormat::Table, false, false).ends_with("active"));
    }
}
