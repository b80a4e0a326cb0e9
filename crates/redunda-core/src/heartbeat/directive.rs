// ── Shared directive state ──
//
// The standby/active directive is a process-wide fact: every heartbeat
// monitor in the process reports into the same `DirectiveState`. The state
// lives in a `watch` channel so the read-compare-write of each update is a
// single atomic step and subscribers are woken on change.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Directive {
    standby: bool,
    debug_override: bool,
}

/// Process-wide directive: should this instance stand by?
///
/// Starts out in standby until the service says otherwise. With the debug
/// override enabled the instance is pinned to active and server responses
/// are ignored.
#[derive(Debug)]
pub struct DirectiveState {
    tx: watch::Sender<Directive>,
}

impl Default for DirectiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Directive {
            standby: true,
            debug_override: false,
        });
        Self { tx }
    }

    /// A fresh state behind an `Arc`, ready to hand to several monitors.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The current directive.
    pub fn is_standby(&self) -> bool {
        self.tx.borrow().standby
    }

    pub fn is_debug_override(&self) -> bool {
        self.tx.borrow().debug_override
    }

    /// Enable or disable the debug override.
    ///
    /// Enabling forces the directive to active. Disabling leaves the
    /// directive as is; the next successful heartbeat decides. Returns the
    /// new directive if this call changed it.
    pub fn set_debug_override(&self, enabled: bool) -> Option<bool> {
        let changed = self.tx.send_if_modified(|d| {
            d.debug_override = enabled;
            if enabled && d.standby {
                d.standby = false;
                return true;
            }
            false
        });
        changed.then_some(false)
    }

    /// Record a directive received from the service.
    ///
    /// Returns the new value if it differs from the previous one. Ignored
    /// while the debug override is enabled.
    pub(crate) fn apply(&self, standby: bool) -> Option<bool> {
        let changed = self.tx.send_if_modified(|d| {
            if d.debug_override || d.standby == standby {
                return false;
            }
            d.standby = standby;
            true
        });
        changed.then_some(standby)
    }

    /// Subscribe to directive changes.
    pub fn subscribe(&self) -> DirectiveStream {
        DirectiveStream {
            receiver: self.tx.subscribe(),
        }
    }
}

/// Observer of directive changes.
///
/// Invoked with the new value only when it differs from the previous one.
/// Any `Fn(bool)` closure qualifies.
pub trait DirectiveListener: Send + Sync {
    fn on_directive_changed(&self, standby: bool);
}

impl<F> DirectiveListener for F
where
    F: Fn(bool) + Send + Sync,
{
    fn on_directive_changed(&self, standby: bool) {
        self(standby);
    }
}

/// A subscription to the directive.
///
/// Only standby flips wake subscribers; toggling the debug override
/// without changing the directive does not.
pub struct DirectiveStream {
    receiver: watch::Receiver<Directive>,
}

impl DirectiveStream {
    /// The latest directive.
    pub fn current(&self) -> bool {
        self.receiver.borrow().standby
    }

    /// Wait for the next change, returning the new directive.
    /// Returns `None` if the state has been dropped.
    pub async fn changed(&mut self) -> Option<bool> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().standby)
    }

    /// Convert into a `Stream` yielding the current directive, then every
    /// change.
    pub fn into_stream(self) -> impl Stream<Item = bool> + Send + 'static {
        WatchStream::new(self.receiver).map(|d| d.standby)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn fresh_state_stands_by() {
        let state = DirectiveState::new();
        assert!(state.is_standby());
        assert!(!state.is_debug_override());
    }

    #[test]
    fn apply_reports_only_transitions() {
        let state = DirectiveState::new();
        let transitions: Vec<Option<bool>> = [true, true, false, false, true]
            .into_iter()
            .map(|v| state.apply(v))
            .collect();
        assert_eq!(transitions, vec![None, None, Some(false), None, Some(true)]);
        assert!(state.is_standby());
    }

    #[test]
    fn debug_override_pins_active() {
        let state = DirectiveState::new();
        assert_eq!(state.set_debug_override(true), Some(false));
        assert!(!state.is_standby());

        for v in [true, false, true, true] {
            assert_eq!(state.apply(v), None);
            assert!(!state.is_standby());
        }
    }

    #[test]
    fn disabling_debug_override_keeps_directive() {
        let state = DirectiveState::new();
        state.set_debug_override(true);
        assert_eq!(state.set_debug_override(false), None);
        assert!(!state.is_standby());
        assert_eq!(state.apply(true), Some(true));
    }

    #[test]
    fn closures_are_listeners() {
        let seen = std::sync::Mutex::new(Vec::new());
        let listener = |standby: bool| seen.lock().unwrap().push(standby);
        listener.on_directive_changed(false);
        listener.on_directive_changed(true);
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    }

    #[tokio::test]
    async fn subscribers_wake_on_change_only() {
        let state = DirectiveState::new();
        let mut sub = state.subscribe();
        assert!(sub.current());

        state.apply(true);
        state.set_debug_override(false);
        assert!(!sub.receiver.has_changed().unwrap_or(true));

        state.apply(false);
        assert_eq!(sub.changed().await, Some(false));
        assert!(!sub.current());
    }

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let state = DirectiveState::new();
        let mut stream = Box::pin(state.subscribe().into_stream());

        assert_eq!(stream.next().await, Some(true));
        state.apply(false);
        assert_eq!(stream.next().await, Some(false));
    }
}
