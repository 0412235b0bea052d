//! Trailing-edge coalescing of view-state notifications.
//!
//! The renderer reports view changes far more often than the host wants to
//! hear about them. [`StateDebouncer`] keeps only the latest snapshot and a
//! deadline; the snapshot is released once the deadline passes without a
//! newer notification.
//!
//! Time is an input: callers pass `now` explicitly, so the logic runs without
//! a clock or timer and tests are instant. sync-client drives it from a tokio
//! task.

use std::time::{Duration, Instant};

use reader_sync_types::{SidebarView, ViewState};

/// Default quiet window.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(100);

/// Timer-reset coalescer for a single pending value.
#[derive(Debug, Clone)]
pub struct Coalescer<T> {
    window: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Coalescer<T> {
    /// Create a coalescer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Replace the pending value and restart the quiet window.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some(value);
        self.deadline = Some(now + self.window);
    }

    /// Release the pending value if its quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// When the pending value becomes due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check if a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without releasing it.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }

    /// The quiet window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// View-state debouncer.
///
/// Full snapshots replace the pending value. Sidebar-only changes are merged
/// into the last known full snapshot so page/scroll state and sidebar state
/// are never emitted out of step.
#[derive(Debug, Clone)]
pub struct StateDebouncer {
    coalescer: Coalescer<ViewState>,
    last: Option<ViewState>,
}

impl StateDebouncer {
    /// Create a debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            coalescer: Coalescer::new(window),
            last: None,
        }
    }

    /// Record a full snapshot.
    pub fn notify(&mut self, state: ViewState, now: Instant) {
        self.last = Some(state.clone());
        self.coalescer.push(state, now);
    }

    /// Record a sidebar panel change.
    ///
    /// Returns `false` (and records nothing) when no full snapshot is known yet.
    pub fn notify_sidebar_view(&mut self, view: SidebarView, now: Instant) -> bool {
        let Some(last) = self.last.as_mut() else {
            return false;
        };
        last.sidebar_view = view;
        let merged = last.clone();
        self.coalescer.push(merged, now);
        true
    }

    /// Release the latest snapshot if the quiet window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ViewState> {
        self.coalescer.poll(now)
    }

    /// When the pending snapshot becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.coalescer.deadline()
    }

    /// Last full snapshot seen, whether or not it was emitted.
    pub fn last_state(&self) -> Option<&ViewState> {
        self.last.as_ref()
    }

    /// Drop any pending snapshot.
    pub fn cancel(&mut self) {
        self.coalescer.cancel();
    }
}

impl Default for StateDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}
