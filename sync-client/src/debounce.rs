//! Debounce driver.
//!
//! Runs a [`StateDebouncer`] on a tokio task: view notifications arrive over
//! an unbounded queue, the task sleeps until the coalescer's deadline and emits
//! `setState` with whatever is due. Stopping the driver discards anything
//! pending.

use std::time::Duration;

use reader_sync_core::StateDebouncer;
use reader_sync_types::{OutboundMessage, SidebarView, ViewState};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::outbox::Outbox;

#[derive(Debug)]
enum Notice {
    State(ViewState),
    Sidebar(SidebarView),
}

/// Handle to a running debounce task.
#[derive(Debug)]
pub struct DebounceHandle {
    tx: mpsc::UnboundedSender<Notice>,
    task: JoinHandle<()>,
}

impl DebounceHandle {
    /// Spawn the driver on the current tokio runtime.
    pub fn spawn(window: Duration, outbox: Outbox) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(rx, StateDebouncer::new(window), outbox));
        Self { tx, task }
    }

    /// Report a full view snapshot.
    pub fn notify(&self, state: ViewState) {
        // A closed queue means the driver was stopped; nothing to do.
        let _ = self.tx.send(Notice::State(state));
    }

    /// Report a sidebar panel change.
    pub fn notify_sidebar_view(&self, view: SidebarView) {
        let _ = self.tx.send(Notice::Sidebar(view));
    }

    /// Stop the driver, discarding any pending snapshot. Idempotent.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Check if the driver task has ended.
    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DebounceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

fn accept(debouncer: &mut StateDebouncer, notice: Notice) {
    match notice {
        Notice::State(state) => debouncer.notify(state, now()),
        Notice::Sidebar(view) => {
            if !debouncer.notify_sidebar_view(view, now()) {
                tracing::debug!(?view, "Sidebar change before any view state; dropped");
            }
        }
    }
}

async fn drive(
    mut rx: mpsc::UnboundedReceiver<Notice>,
    mut debouncer: StateDebouncer,
    outbox: Outbox,
) {
    loop {
        match debouncer.deadline() {
            Some(deadline) => {
                tokio::select! {
                    notice = rx.recv() => match notice {
                        Some(notice) => accept(&mut debouncer, notice),
                        None => break,
                    },
                    _ = tokio::time::sleep_until(Instant::from_std(deadline)) => {
                        if let Some(state) = debouncer.poll(now()) {
                            outbox.emit_logged(OutboundMessage::SetState { state }).await;
                        }
                    }
                }
            }
            None => match rx.recv().await {
                Some(notice) => accept(&mut debouncer, notice),
                None => break,
            },
        }
    }
    tracing::trace!(session = %outbox.session_id(), "Debounce driver stopped");
}
