//! Async lifecycle gate.
//!
//! Wraps the pure [`LifecycleState`] machine in a tokio `watch` channel so
//! operations can wait for readiness. Every state change is checked
//! synchronously by the waiters; there is no race between the two readiness
//! signals and teardown.

use std::future::Future;
use std::sync::Arc;

use reader_sync_core::{LifecycleEvent, LifecycleState};
use tokio::sync::watch;

/// Shared readiness gate of one session.
///
/// Cloning shares the gate.
#[derive(Debug, Clone)]
pub struct LifecycleGate {
    state: Arc<watch::Sender<LifecycleState>>,
}

impl Default for LifecycleGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleGate {
    /// Create a gate in the `Created` state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::new());
        Self {
            state: Arc::new(state),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Feed an event and return the resulting state.
    pub fn signal(&self, event: LifecycleEvent) -> LifecycleState {
        let mut next = LifecycleState::Created;
        self.state.send_modify(|state| {
            *state = state.on_event(event);
            next = *state;
        });
        next
    }

    /// The annotation UI finished its first paint.
    pub fn annotator_ready(&self) -> LifecycleState {
        self.signal(LifecycleEvent::AnnotatorReady)
    }

    /// The renderer finished document initialization.
    pub fn renderer_ready(&self) -> LifecycleState {
        self.signal(LifecycleEvent::RendererReady)
    }

    /// Abort all pending and future guarded operations. Idempotent.
    pub fn teardown(&self) {
        self.signal(LifecycleEvent::Teardown);
    }

    /// Check if teardown has happened.
    pub fn is_torn_down(&self) -> bool {
        self.state().is_torn_down()
    }

    /// Wait until the gate settles.
    ///
    /// Returns `true` when both readiness signals fired, `false` when the gate
    /// was torn down first.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.state.subscribe();
        let ready = match rx.wait_for(LifecycleState::is_settled).await {
            Ok(state) => state.is_ready(),
            Err(_) => false,
        };
        ready
    }

    /// Run `operation` once the gate is ready.
    ///
    /// Returns `None` without invoking it if teardown happens before or while
    /// waiting.
    pub async fn guard<F, Fut, T>(&self, operation: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.wait_ready().await {
            return None;
        }
        Some(operation().await)
    }
}
