//! Session lifecycle state machine.
//!
//! Tracks the two independent readiness signals of a session (the annotation
//! UI finishing its first paint and the renderer finishing document
//! initialization) plus teardown. Pure: the caller feeds events in and reads
//! the resulting state; waiting is done by sync-client.

/// Lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Neither subsystem is ready.
    #[default]
    Created,
    /// The annotation UI is ready, the renderer is not.
    AnnotatorReady,
    /// The renderer is ready, the annotation UI is not.
    RendererReady,
    /// Both subsystems are ready; guarded operations may run.
    Ready,
    /// Session torn down. Terminal.
    TornDown,
}

/// Inputs to the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The annotation UI finished its first paint.
    AnnotatorReady,
    /// The renderer finished document initialization.
    RendererReady,
    /// The session is being replaced or closed.
    Teardown,
}

impl LifecycleState {
    /// Create a new state machine in the Created state.
    pub fn new() -> Self {
        Self::Created
    }

    /// Process an event and return the new state.
    ///
    /// Repeated readiness signals are no-ops. Teardown wins from any state
    /// and nothing leaves `TornDown`.
    pub fn on_event(self, event: LifecycleEvent) -> Self {
        match (self, event) {
            (Self::TornDown, _) => Self::TornDown,
            (_, LifecycleEvent::Teardown) => Self::TornDown,

            (Self::Created, LifecycleEvent::AnnotatorReady) => Self::AnnotatorReady,
            (Self::Created, LifecycleEvent::RendererReady) => Self::RendererReady,
            (Self::AnnotatorReady, LifecycleEvent::RendererReady) => Self::Ready,
            (Self::RendererReady, LifecycleEvent::AnnotatorReady) => Self::Ready,

            (state, _) => state,
        }
    }

    /// Both readiness signals have fired and the session is alive.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Teardown has happened.
    pub fn is_torn_down(&self) -> bool {
        matches!(self, Self::TornDown)
    }

    /// A guarded operation waiting on this state can stop waiting.
    pub fn is_settled(&self) -> bool {
        self.is_ready() || self.is_torn_down()
    }
}
