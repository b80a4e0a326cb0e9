//! Coordination logic between `redunda-api` and the bot embedding it.
//!
//! Two independent services share an API key:
//!
//! - **[`HeartbeatMonitor`]** reports liveness on a fixed cadence and keeps
//!   the process-wide [`DirectiveState`] in line with the service's
//!   standby/active directive. Directive changes reach a single
//!   [`DirectiveListener`] and any number of [`DirectiveStream`]
//!   subscribers.
//!
//! - **[`FileReconciler`]** mirrors a set of tracked local files against
//!   the service. Each pass lists the remote files, plans pushes and pulls
//!   with a last-write-wins rule ([`files::plan`]), and executes the
//!   transfers best-effort, collecting failures in a [`SyncReport`].
//!
//! Both services run their periodic work on tokio tasks and never block
//! each other. Construction goes through [`ServiceConfig`].

pub mod config;
pub mod error;
pub mod files;
pub mod heartbeat;
mod task;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_SYNC_INTERVAL, ServiceConfig,
};
pub use error::CoreError;
pub use files::{
    Direction, FileReconciler, FileRegistry, FileStore, LocalFileStore, RemoteFileDescriptor,
    SyncPlan, SyncReport, TransferFailure,
};
pub use heartbeat::{
    DirectiveListener, DirectiveState, DirectiveStream, HeartbeatMonitor, TickOutcome,
};
