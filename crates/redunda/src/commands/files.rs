//! File command handlers.

use chrono::SecondsFormat;
use tabled::Tabled;

use redunda_core::RemoteFileDescriptor;
use redunda_core::files::codec;

use crate::cli::{FilesArgs, FilesCommand, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RemoteFileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&RemoteFileDescriptor> for RemoteFileRow {
    fn from(f: &RemoteFileDescriptor) -> Self {
        Self {
            file: f.identifier.clone(),
            key: f.encoded_key.clone(),
            updated: f.updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: FilesArgs, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        FilesCommand::List => {
            let reconciler = super::reconciler(session, &[])?;
            let listing = reconciler.fetch_remote_listing().await?;
            let out = output::render_list(
                &global.output,
                &listing,
                |f| RemoteFileRow::from(f),
                |f| f.identifier.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FilesCommand::Push { files } => {
            // Only the named files, not the profile's tracked set.
            let reconciler = super::reconciler(
                &Session {
                    tracked_files: Vec::new(),
                    ..session.clone()
                },
                &files,
            )?;
            let report = reconciler.push_all_tracked().await;
            super::sync::print_report(&report, global)
        }

        FilesCommand::Pull { file } => {
            codec::check_identifier(&file)?;
            let reconciler = super::reconciler(session, &[])?;
            if !reconciler.pull_file(&file).await? {
                return Err(CliError::NotFound {
                    resource_type: "file".into(),
                    identifier: file,
                    list_command: "files list".into(),
                });
            }
            if !global.quiet {
                eprintln!("✓ Pulled {file}");
            }
            Ok(())
        }
    }
}
