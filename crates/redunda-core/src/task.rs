// ── Periodic background tasks ──
//
// One tokio task per service. The tick body is awaited inside the loop,
// so ticks of the same task never overlap; missed ticks are skipped
// rather than replayed in a burst.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// When the first tick of a periodic task fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FirstTick {
    /// Right away, then every period.
    Immediate,
    /// After one full period.
    Delayed,
}

/// Handle to a running periodic task.
///
/// Cancelling lets an in-flight tick run to completion; the loop exits at
/// its next iteration. Dropping the handle cancels the task.
pub(crate) struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` every `period` on the current tokio runtime.
    pub(crate) fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        first: FirstTick,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let start = match first {
                FirstTick::Immediate => Instant::now(),
                FirstTick::Delayed => Instant::now() + period,
            };
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = interval.tick() => tick().await,
                }
            }
            debug!(task = name, "periodic task stopped");
        });

        debug!(task = name, ?period, ?first, "periodic task started");
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    /// Cancel the task and wait for any in-flight tick to finish.
    pub(crate) async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                debug!(task = self.name, error = %e, "periodic task ended abnormally");
            }
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
