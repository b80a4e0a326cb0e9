// ── Heartbeat monitor ──
//
// Reports liveness to the coordination service and keeps the shared
// `DirectiveState` in line with the answer. The periodic task fires its
// first tick immediately so the directive is established as early as
// possible; failed ticks leave the directive untouched.

mod directive;

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use tracing::{debug, info, warn};

use redunda_api::RedundaClient;

pub use directive::{DirectiveListener, DirectiveState, DirectiveStream};

use crate::config::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_SYNC_INTERVAL, MIN_INTERVAL, ServiceConfig};
use crate::error::CoreError;
use crate::files::{FileReconciler, FileStore};
use crate::task::{FirstTick, PeriodicTask};

/// What a single heartbeat did to the directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Debug override active; no request was made.
    Skipped,
    /// The service confirmed the current directive.
    Unchanged { standby: bool },
    /// The directive flipped and the listener was notified.
    Changed { standby: bool },
}

/// Periodic liveness reporter.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Every monitor in a process
/// should share one [`DirectiveState`].
#[derive(Clone)]
pub struct HeartbeatMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    client: RedundaClient,
    version: Option<String>,
    interval: Duration,
    /// Period of reconcilers handed out by `reconciler()`.
    sync_interval: Duration,
    state: Arc<DirectiveState>,
    listener: RwLock<Option<Arc<dyn DirectiveListener>>>,
    /// Serializes scheduled ticks with `check_standby_status()`.
    cycle: tokio::sync::Mutex<()>,
    task: Mutex<Option<PeriodicTask>>,
}

impl HeartbeatMonitor {
    /// Create a monitor with the default 30s interval and no version.
    pub fn new(client: RedundaClient, state: Arc<DirectiveState>) -> Self {
        Self::with_settings(client, state, None, DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Create a monitor reporting `version` every `interval`.
    ///
    /// Intervals below one second are raised to one second.
    pub fn with_settings(
        client: RedundaClient,
        state: Arc<DirectiveState>,
        version: Option<String>,
        interval: Duration,
    ) -> Self {
        Self::build(client, state, version, interval, DEFAULT_SYNC_INTERVAL)
    }

    fn build(
        client: RedundaClient,
        state: Arc<DirectiveState>,
        version: Option<String>,
        interval: Duration,
        sync_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                client,
                version,
                interval: interval.max(MIN_INTERVAL),
                sync_interval: sync_interval.max(MIN_INTERVAL),
                state,
                listener: RwLock::new(None),
                cycle: tokio::sync::Mutex::new(()),
                task: Mutex::new(None),
            }),
        }
    }

    /// Build a monitor from a validated [`ServiceConfig`].
    pub fn from_config(
        config: &ServiceConfig,
        state: Arc<DirectiveState>,
    ) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self::build(
            client,
            state,
            config.bot_version.clone(),
            config.heartbeat_interval,
            config.sync_interval,
        ))
    }

    /// Attach a listener, replacing any previous one.
    pub fn with_listener(self, listener: impl DirectiveListener + 'static) -> Self {
        self.set_listener(Some(Arc::new(listener)));
        self
    }

    /// Replace (or clear) the directive listener.
    pub fn set_listener(&self, listener: Option<Arc<dyn DirectiveListener>>) {
        *self
            .inner
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner) = listener;
    }

    /// The shared directive state this monitor reports into.
    pub fn state(&self) -> &Arc<DirectiveState> {
        &self.inner.state
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    pub fn version(&self) -> Option<&str> {
        self.inner.version.as_deref()
    }

    /// The current directive, without contacting the service.
    pub fn is_standby(&self) -> bool {
        self.inner.state.is_standby()
    }

    // ── Debug override ───────────────────────────────────────────

    /// Enable or disable debug mode.
    ///
    /// While enabled the instance is never on standby and heartbeats are
    /// not sent. Enabling flips a standing-by instance to active and
    /// notifies the listener.
    pub fn set_debug_override(&self, enabled: bool) {
        if let Some(standby) = self.inner.state.set_debug_override(enabled) {
            info!(standby, "debug override changed directive");
            self.notify(standby);
        }
    }

    pub fn is_debug_override(&self) -> bool {
        self.inner.state.is_debug_override()
    }

    // ── Scheduling ───────────────────────────────────────────────

    /// Start heartbeating: first tick now, then every interval.
    ///
    /// Calling this while already running replaces the previous task. A
    /// tick that is already in flight finishes, then the old loop exits.
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.inner);
        let task = PeriodicTask::spawn(
            "heartbeat",
            self.inner.interval,
            FirstTick::Immediate,
            move || scheduled_tick(weak.clone()),
        );

        let previous = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if previous.is_some() {
            debug!("replaced running heartbeat task");
        }
        info!(interval = ?self.inner.interval, "heartbeat started");
    }

    /// Stop heartbeating. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        task.is_some()
    }

    /// Stop heartbeating and wait for an in-flight tick to finish.
    pub async fn shutdown(&self) {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.shutdown().await;
            debug!("heartbeat shut down");
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

    // ── Reporting ────────────────────────────────────────────────

    /// Run one report/parse/update cycle.
    ///
    /// On failure the directive is left as it was and the error is
    /// returned; the scheduler logs it and carries on.
    pub async fn tick(&self) -> Result<TickOutcome, CoreError> {
        let _cycle = self.inner.cycle.lock().await;

        let state = &self.inner.state;
        if state.is_debug_override() {
            debug!("debug override active, skipping heartbeat");
            return Ok(TickOutcome::Skipped);
        }

        let report = self
            .inner
            .client
            .report_status(self.inner.version.as_deref())
            .await?;

        match state.apply(report.should_standby) {
            Some(standby) => {
                info!(standby, "directive changed");
                self.notify(standby);
                Ok(TickOutcome::Changed { standby })
            }
            None => {
                debug!(standby = state.is_standby(), "directive unchanged");
                Ok(TickOutcome::Unchanged {
                    standby: state.is_standby(),
                })
            }
        }
    }

    /// Fetch the directive now instead of waiting for the next tick.
    ///
    /// Returns `true` (stand by) if the cycle fails, whatever the stored
    /// directive is. Honours the debug override.
    pub async fn check_standby_status(&self) -> bool {
        match self.tick().await {
            Ok(_) => self.inner.state.is_standby(),
            Err(e) => {
                warn!(error = %e, "standby check failed, assuming standby");
                true
            }
        }
    }

    /// A file reconciler sharing this monitor's client and API key.
    ///
    /// It runs at the config's `sync_interval` for monitors built with
    /// [`from_config`](Self::from_config), otherwise at the default 180s.
    pub fn reconciler(&self, store: Arc<dyn FileStore>) -> FileReconciler {
        FileReconciler::with_settings(self.inner.client.clone(), store, self.inner.sync_interval)
    }

    fn notify(&self, standby: bool) {
        let listener = self
            .inner
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener.on_directive_changed(standby);
        }
    }
}

/// Scheduler boundary: errors are logged here and never stop the loop.
async fn scheduled_tick(inner: Weak<MonitorInner>) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let monitor = HeartbeatMonitor { inner };
    if let Err(e) = monitor.tick().await {
        warn!(error = %e, "heartbeat failed, directive unchanged");
    }
}
