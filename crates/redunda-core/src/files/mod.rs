// ── File reconciliation ──
//
// Mirrors a set of tracked local files against the coordination service.
// A pass lists the remote files, plans transfers (see `plan`), then runs
// every push before every pull. Individual transfer failures are recorded
// in the `SyncReport`; only a failed listing aborts a pass.

pub mod codec;
mod plan;
mod registry;
mod store;

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use redunda_api::RedundaClient;

pub use plan::{RemoteFileDescriptor, SyncPlan, plan};
pub use registry::FileRegistry;
pub use store::{FileStore, LocalFileStore};

use crate::config::{DEFAULT_SYNC_INTERVAL, MIN_INTERVAL, ServiceConfig};
use crate::error::CoreError;
use crate::task::{FirstTick, PeriodicTask};

/// Transfer direction of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Push,
    Pull,
}

/// A transfer that failed during a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferFailure {
    pub identifier: String,
    pub direction: Direction,
    pub error: String,
}

/// Outcome of a reconciliation pass or a batch push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub pushed: Vec<String>,
    pub pulled: Vec<String>,
    /// Remote files the pass started tracking.
    pub discovered: Vec<String>,
    pub failures: Vec<TransferFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, identifier: &str, direction: Direction, error: &CoreError) {
        warn!(file = identifier, ?direction, error = %error, "file transfer failed");
        self.failures.push(TransferFailure {
            identifier: identifier.to_owned(),
            direction,
            error: error.to_string(),
        });
    }
}

/// Keeps tracked files in sync with the service.
///
/// Cheaply cloneable via `Arc<ReconcilerInner>`.
#[derive(Clone)]
pub struct FileReconciler {
    inner: Arc<ReconcilerInner>,
}

struct ReconcilerInner {
    client: RedundaClient,
    registry: FileRegistry,
    store: Arc<dyn FileStore>,
    interval: Duration,
    /// Serializes passes (scheduled or manual).
    pass: tokio::sync::Mutex<()>,
    task: Mutex<Option<PeriodicTask>>,
}

impl FileReconciler {
    /// Create a reconciler with the default 180s interval.
    pub fn new(client: RedundaClient, store: Arc<dyn FileStore>) -> Self {
        Self::with_settings(client, store, DEFAULT_SYNC_INTERVAL)
    }

    /// Create a reconciler running a pass every `interval`.
    ///
    /// Intervals below one second are raised to one second.
    pub fn with_settings(
        client: RedundaClient,
        store: Arc<dyn FileStore>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                client,
                registry: FileRegistry::new(),
                store,
                interval: interval.max(MIN_INTERVAL),
                pass: tokio::sync::Mutex::new(()),
                task: Mutex::new(None),
            }),
        }
    }

    /// Build a reconciler from a validated [`ServiceConfig`].
    pub fn from_config(
        config: &ServiceConfig,
        store: Arc<dyn FileStore>,
    ) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self::with_settings(client, store, config.sync_interval))
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    // ── Registry ─────────────────────────────────────────────────

    /// Start tracking a file. Tracking it again is a no-op.
    ///
    /// Returns `Ok(true)` if the file was newly tracked. Identifiers that
    /// would not survive key encoding are rejected.
    pub fn track_file(&self, identifier: impl Into<String>) -> Result<bool, CoreError> {
        let identifier = identifier.into();
        codec::check_identifier(&identifier)?;
        let added = self.inner.registry.insert(identifier.clone());
        if added {
            debug!(file = %identifier, "tracking file");
        } else {
            debug!(file = %identifier, "already tracking file");
        }
        Ok(added)
    }

    /// Tracked identifiers, in the order they were first tracked.
    pub fn tracked_files(&self) -> Vec<String> {
        self.inner.registry.snapshot()
    }

    pub fn is_tracked(&self, identifier: &str) -> bool {
        self.inner.registry.contains(identifier)
    }

    // ── Single-file operations ───────────────────────────────────

    /// Upload one local file, overwriting the remote copy.
    pub async fn push_file(&self, identifier: &str) -> Result<(), CoreError> {
        let content = self
            .inner
            .store
            .read(identifier)
            .map_err(|e| CoreError::local_io(identifier, e))?;
        let key = codec::encode(identifier);

        self.inner
            .client
            .upload_file(&key, Bytes::from(content))
            .await?;
        debug!(file = identifier, "pushed");
        Ok(())
    }

    /// Download one remote file.
    ///
    /// `Ok(None)` means the service did not serve it (missing, forbidden,
    /// offline); that is not an error.
    pub async fn fetch_remote_content(&self, identifier: &str) -> Result<Option<Bytes>, CoreError> {
        let key = codec::encode(identifier);
        Ok(self.inner.client.download_file(&key).await?)
    }

    /// Download one remote file and write it locally.
    ///
    /// Returns `false` if the service did not serve the file; the local
    /// copy is then left untouched.
    pub async fn pull_file(&self, identifier: &str) -> Result<bool, CoreError> {
        let Some(content) = self.fetch_remote_content(identifier).await? else {
            return Ok(false);
        };
        self.inner
            .store
            .write(identifier, &content)
            .map_err(|e| CoreError::local_io(identifier, e))?;
        debug!(file = identifier, len = content.len(), "pulled");
        Ok(true)
    }

    /// The remote listing, with keys decoded into identifiers.
    pub async fn fetch_remote_listing(&self) -> Result<Vec<RemoteFileDescriptor>, CoreError> {
        let files = self.inner.client.list_files().await?;
        Ok(files.into_iter().map(RemoteFileDescriptor::from).collect())
    }

    // ── Batches ──────────────────────────────────────────────────

    /// Push every tracked file, continuing past failures.
    pub async fn push_all_tracked(&self) -> SyncReport {
        let mut report = SyncReport::default();
        for identifier in self.tracked_files() {
            self.push_into(&identifier, &mut report).await;
        }
        report
    }

    /// One reconciliation pass.
    ///
    /// Fails only if the remote listing cannot be fetched, in which case
    /// neither the registry nor any local file has been touched.
    pub async fn sync_files(&self) -> Result<SyncReport, CoreError> {
        let _pass = self.inner.pass.lock().await;

        let remote = self.fetch_remote_listing().await?;
        let tracked = self.tracked_files();
        let remote: Vec<RemoteFileDescriptor> = remote
            .into_iter()
            .filter(|file| {
                // Untracked keys must not reach outside the working tree.
                let checked = if tracked.contains(&file.identifier) {
                    codec::check_identifier(&file.identifier)
                } else {
                    codec::check_remote_identifier(&file.identifier)
                };
                match checked {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(key = %file.encoded_key, error = %e, "ignoring remote file");
                        false
                    }
                }
            })
            .collect();

        let plan = plan(&tracked, &remote, |id| self.local_modified(id));
        debug!(
            push = plan.push.len(),
            pull = plan.pull.len(),
            discovered = plan.discovered.len(),
            "planned reconciliation pass"
        );

        let mut report = SyncReport::default();
        for identifier in &plan.discovered {
            if self.inner.registry.insert(identifier.clone()) {
                report.discovered.push(identifier.clone());
            }
        }

        for identifier in &plan.push {
            self.push_into(identifier, &mut report).await;
        }

        for identifier in &plan.pull {
            match self.pull_file(identifier).await {
                Ok(true) => report.pulled.push(identifier.clone()),
                Ok(false) => report.record_failure(
                    identifier,
                    Direction::Pull,
                    &CoreError::Transport {
                        message: "file listed but not served by Redunda".into(),
                        status: None,
                        transient: true,
                    },
                ),
                Err(e) => report.record_failure(identifier, Direction::Pull, &e),
            }
        }

        info!(
            pushed = report.pushed.len(),
            pulled = report.pulled.len(),
            failed = report.failures.len(),
            "reconciliation pass complete"
        );
        Ok(report)
    }

    async fn push_into(&self, identifier: &str, report: &mut SyncReport) {
        match self.push_file(identifier).await {
            Ok(()) => report.pushed.push(identifier.to_owned()),
            Err(e) => report.record_failure(identifier, Direction::Push, &e),
        }
    }

    fn local_modified(&self, identifier: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        match self.inner.store.modified(identifier) {
            Ok(mtime) => mtime,
            Err(e) => {
                debug!(file = identifier, error = %e, "cannot stat local file, treating as missing");
                None
            }
        }
    }

    // ── Scheduling ───────────────────────────────────────────────

    /// Start periodic passes. The first pass runs after one interval.
    ///
    /// Calling this while already running replaces the previous task.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let task = PeriodicTask::spawn(
            "file-sync",
            self.inner.interval,
            FirstTick::Delayed,
            move || scheduled_pass(weak.clone()),
        );

        let previous = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if previous.is_some() {
            debug!("replaced running file sync task");
        }
        info!(interval = ?self.inner.interval, "file sync started");
    }

    /// Run one pass now, then [`start`](Self::start) the periodic passes.
    ///
    /// The scheduler starts whether or not the first pass succeeded; its
    /// result is returned.
    pub async fn sync_and_start(&self) -> Result<SyncReport, CoreError> {
        let first = self.sync_files().await;
        self.start();
        first
    }

    /// Stop periodic passes. Returns `false` if they were not running.
    pub fn stop(&self) -> bool {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        task.is_some()
    }

    /// Stop periodic passes and wait for an in-flight pass to finish.
    pub async fn shutdown(&self) {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.shutdown().await;
            debug!("file sync shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

/// Scheduler boundary: a failed pass is logged and retried next interval.
async fn scheduled_pass(inner: Weak<ReconcilerInner>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let reconciler = FileReconciler { inner };
    if let Err(e) = reconciler.sync_files().await {
        warn!(error = %e, "reconciliation pass aborted");
    }
}
