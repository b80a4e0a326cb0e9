//! Status command: one heartbeat, then print the directive.

use serde::Serialize;

use redunda_core::{DirectiveState, HeartbeatMonitor};

use crate::cli::GlobalOpts;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StatusView {
    profile: String,
    endpoint: String,
    bot_version: Option<String>,
    standby: bool,
    debug_override: bool,
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = HeartbeatMonitor::from_config(&session.service, DirectiveState::shared())?;
    if session.debug {
        monitor.set_debug_override(true);
    }

    let outcome = monitor.tick().await?;
    tracing::debug!(?outcome, "heartbeat sent");

    let view = StatusView {
        profile: session.profile_name.clone(),
        endpoint: session.service.endpoint.to_string(),
        bot_version: monitor.version().map(str::to_owned),
        standby: monitor.is_standby(),
        debug_override: monitor.is_debug_override(),
    };
    let color = output::should_color(&global.color);

    let out = output::render_single(
        &global.output,
        &view,
        |v| {
            let mut detail = format!(
                "Directive: {}\nProfile:   {}\nEndpoint:  {}",
                output::directive_label(v.standby, color),
                v.profile,
                v.endpoint,
            );
            if let Some(ref version) = v.bot_version {
                detail.push_str(&format!("\nVersion:   {version}"));
            }
            if v.debug_override {
                detail.push_str("\nDebug override active, heartbeat skipped");
            }
            detail
        },
        |v| output::directive_label(v.standby, false),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
