//! Rendering view seam.
//!
//! The document renderer and the annotation UI live outside this crate. A
//! session drives them through [`ReaderView`] by applying [`ViewCommand`]s;
//! the view reports back through the session's event methods
//! (`annotator_ready`, `renderer_ready`, `view_area_updated`, ...).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reader_sync_core::{MenuAction, ReaderCommand};
use reader_sync_types::{Annotation, Location, Open, SessionId, ViewState};
use serde_json::Value;

/// Instruction for the rendering view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    /// Navigate to a location
    Navigate(Location),
    /// Show or hide the import prompt
    SetPromptImport(bool),
    /// Enable or disable "add to note"
    SetEnableAddToNote(bool),
    /// Replace the rendered annotation list
    SetAnnotations(Vec<Annotation>),
    /// Active tool color
    SetColor(String),
    /// Sidebar width in pixels
    SetSidebarWidth(u32),
    /// Sidebar visibility
    SetSidebarOpen(bool),
    /// Space reserved below the document
    SetBottomPlaceholderHeight(u32),
    /// Space reserved beside the toolbar
    SetToolbarPlaceholderWidth(u32),
    /// Restore a saved view state
    RestoreState {
        /// Saved state
        state: ViewState,
        /// Skip restoring the scroll position (an explicit location follows)
        skip_scroll: bool,
    },
    /// Host menu action
    Menu(MenuAction),
    /// Present an error through the renderer's error UI
    ShowError {
        /// Headline
        message: String,
        /// Details, uninterpreted
        more_info: Option<Value>,
    },
    /// Keyboard-triggered reader command
    Reader(ReaderCommand),
}

/// A rendering view bound to one session.
pub trait ReaderView: Send {
    /// Apply one command.
    fn apply(&mut self, command: ViewCommand);

    /// Release renderer resources. Called once, at session teardown.
    fn uninit(&mut self);
}

/// Creates the view for a newly opened session.
pub trait ViewFactory: Send + Sync {
    /// Build a view for `session_id` from the `open` payload (document bytes and all).
    fn create(&self, session_id: &SessionId, open: &Open) -> Box<dyn ReaderView>;
}

/// Shared log behind [`RecordingFactory`].
#[derive(Debug, Default)]
struct ViewLog {
    commands: Vec<(SessionId, ViewCommand)>,
    created: Vec<SessionId>,
    uninit: Vec<SessionId>,
}

/// View factory that records every command applied to the views it creates.
///
/// Used by tests and by hosts that want a headless session.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    log: Arc<Mutex<ViewLog>>,
}

impl RecordingFactory {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ViewLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commands applied to the view of `session_id`, in order.
    pub fn commands(&self, session_id: &SessionId) -> Vec<ViewCommand> {
        self.lock()
            .commands
            .iter()
            .filter(|(id, _)| id == session_id)
            .map(|(_, command)| command.clone())
            .collect()
    }

    /// Every command applied to any view, with its session.
    pub fn all_commands(&self) -> Vec<(SessionId, ViewCommand)> {
        self.lock().commands.clone()
    }

    /// Sessions a view was created for.
    pub fn created(&self) -> Vec<SessionId> {
        self.lock().created.clone()
    }

    /// Sessions whose view was uninitialized.
    pub fn uninitialized(&self) -> Vec<SessionId> {
        self.lock().uninit.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        *self.lock() = ViewLog::default();
    }
}

impl ViewFactory for RecordingFactory {
    fn create(&self, session_id: &SessionId, _open: &Open) -> Box<dyn ReaderView> {
        self.lock().created.push(session_id.clone());
        Box::new(RecordingView {
            session_id: session_id.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

#[derive(Debug)]
struct RecordingView {
    session_id: SessionId,
    log: Arc<Mutex<ViewLog>>,
}

impl ReaderView for RecordingView {
    fn apply(&mut self, command: ViewCommand) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .commands
            .push((self.session_id.clone(), command));
    }

    fn uninit(&mut self) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .uninit
            .push(self.session_id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_separates_sessions() {
        let factory = RecordingFactory::new();
        let s1 = SessionId::new("s1");
        let s2 = SessionId::new("s2");

        let mut v1 = factory.create(&s1, &Open::default());
        let mut v2 = factory.create(&s2, &Open::default());
        v1.apply(ViewCommand::SetSidebarOpen(true));
        v2.apply(ViewCommand::SetColor("#ff0000".into()));
        v1.uninit();

        assert_eq!(factory.created(), vec![s1.clone(), s2.clone()]);
        assert_eq!(
            factory.commands(&s1),
            vec![ViewCommand::SetSidebarOpen(true)]
        );
        assert_eq!(
            factory.commands(&s2),
            vec![ViewCommand::SetColor("#ff0000".into())]
        );
        assert_eq!(factory.uninitialized(), vec![s1]);
    }

    #[test]
    fn clear_forgets_everything() {
        let factory = RecordingFactory::new();
        let s1 = SessionId::new("s1");
        factory
            .create(&s1, &Open::default())
            .apply(ViewCommand::SetPromptImport(true));

        factory.clear();

        assert!(factory.all_commands().is_empty());
        assert!(factory.created().is_empty());
    }
}
