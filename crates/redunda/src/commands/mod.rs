//! Command dispatch: bridges CLI args -> core services -> output formatting.

pub mod config_cmd;
pub mod files;
pub mod run;
pub mod status;
pub mod sync;

use std::sync::Arc;

use redunda_core::{FileReconciler, FileStore, LocalFileStore};

use crate::cli::{Command, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, session, global).await,
        Command::Status => status::handle(session, global).await,
        Command::Sync(args) => sync::handle(args, session, global).await,
        Command::Files(args) => files::handle(args, session, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before a session is resolved")
        }
    }
}

/// A reconciler over the working directory, tracking the profile's files
/// plus `extra`.
pub(crate) fn reconciler(session: &Session, extra: &[String]) -> Result<FileReconciler, CliError> {
    let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
    let reconciler = FileReconciler::from_config(&session.service, store)?;
    for file in session.tracked_files.iter().chain(extra) {
        reconciler.track_file(file.as_str())?;
    }
    Ok(reconciler)
}
