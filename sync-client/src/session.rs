//! One host/reader binding.
//!
//! A [`Session`] owns everything that belongs to a single opened document:
//! the lifecycle gate, the annotation store, the rendering view, the debounce
//! driver and the outbox addressed to its id. Sessions are never reused; the
//! gateway builds a new one on every `open` and tears the old one down.
//!
//! Guarded host commands go through one FIFO per session, drained by a single
//! task once both readiness signals fired, so they reach the view in the order
//! they were requested.
//!
//! After [`Session::teardown`] every method is a safe no-op: nothing reaches
//! the view or the host any more.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reader_sync_core::{
    dispatch, menu_action, AnnotationStore, KeyContext, KeyDispatch, KeyEvent, LifecycleState,
    Platform, ReaderCommand, StoreAction, StoreError, StoreNotice,
};
use reader_sync_types::{
    Annotation, AnnotationId, AnnotationPatch, Location, MenuCommand, Open, OutboundMessage,
    PopupCmd, PopupCommand, SessionId, SidebarView, ViewState,
};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};

use crate::channel::{ChannelError, EnvelopeChannel};
use crate::config::Config;
use crate::debounce::DebounceHandle;
use crate::error::SessionError;
use crate::lifecycle::LifecycleGate;
use crate::outbox::Outbox;
use crate::view::{ReaderView, ViewCommand, ViewFactory};

type SharedView = Arc<Mutex<Box<dyn ReaderView>>>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn apply_all(view: &SharedView, commands: Vec<ViewCommand>) {
    let mut view = lock(view);
    for command in commands {
        view.apply(command);
    }
}

/// A guarded request waiting for readiness.
struct Guarded {
    commands: Vec<ViewCommand>,
    done: oneshot::Sender<bool>,
}

/// Apply guarded requests in arrival order once the gate is ready.
///
/// Every request is answered, `false` once the gate is torn down. Ends when
/// the session drops the sending side.
async fn drain_guarded(
    gate: LifecycleGate,
    view: SharedView,
    mut requests: mpsc::UnboundedReceiver<Guarded>,
) {
    let ready = gate.wait_ready().await;
    while let Some(Guarded { commands, done }) = requests.recv().await {
        let applied = ready && {
            // Teardown uninitializes the view under the same lock.
            let mut view = lock(&view);
            if gate.is_torn_down() {
                false
            } else {
                for command in commands {
                    view.apply(command);
                }
                true
            }
        };
        let _ = done.send(applied);
    }
}

/// Where a click happened, as reported by the UI.
///
/// Used to place popups the host draws in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClickAnchor {
    /// Pointer x in screen coordinates
    pub screen_x: f64,
    /// Pointer y in screen coordinates
    pub screen_y: f64,
    /// Pointer x relative to the viewport
    pub client_x: f64,
    /// Pointer y relative to the viewport
    pub client_y: f64,
    /// Left edge of the clicked element, viewport-relative
    pub rect_left: f64,
    /// Top edge of the clicked element, viewport-relative
    pub rect_top: f64,
}

impl ClickAnchor {
    /// Screen position of the clicked element's top-left corner.
    pub fn screen_origin(&self) -> (f64, f64) {
        (
            self.screen_x - (self.client_x - self.rect_left),
            self.screen_y - (self.client_y - self.rect_top),
        )
    }
}

/// An open document and its annotation state.
pub struct Session {
    id: SessionId,
    gate: LifecycleGate,
    outbox: Outbox,
    store: Mutex<AnnotationStore>,
    view: SharedView,
    debouncer: DebounceHandle,
    guarded: Mutex<Option<mpsc::UnboundedSender<Guarded>>>,
    selection: Mutex<Vec<AnnotationId>>,
    platform: Platform,
    torn_down: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.gate.state())
            .field("annotations", &lock(&self.store).len())
            .finish()
    }
}

impl Session {
    /// Build a session from an `open` payload.
    ///
    /// Seeds the store, hands the initial layout to the view and queues the
    /// guarded restoration of the saved state ahead of any host command.
    /// Nothing is sent to the host until [`Session::announce`]. Must be called
    /// from within a tokio runtime.
    pub fn open(
        id: SessionId,
        open: Open,
        channel: Arc<dyn EnvelopeChannel>,
        factory: &dyn ViewFactory,
        config: &Config,
    ) -> Arc<Self> {
        let gate = LifecycleGate::new();
        let outbox = Outbox::new(id.clone(), channel, gate.clone());
        let view: SharedView = Arc::new(Mutex::new(factory.create(&id, &open)));
        let debouncer = DebounceHandle::spawn(config.debounce.quiet_window(), outbox.clone());
        let (guarded, requests) = mpsc::unbounded_channel();
        tokio::spawn(drain_guarded(gate.clone(), Arc::clone(&view), requests));

        let Open {
            state,
            location,
            annotations,
            prompt_import,
            sidebar_width,
            sidebar_open,
            bottom_placeholder_height,
            ..
        } = open;

        let session = Arc::new(Self {
            id,
            gate,
            outbox,
            store: Mutex::new(AnnotationStore::with_annotations(annotations)),
            view,
            debouncer,
            guarded: Mutex::new(Some(guarded)),
            selection: Mutex::new(Vec::new()),
            platform: config.input.platform,
            torn_down: AtomicBool::new(false),
        });

        let mut layout = Vec::new();
        if let Some(width) = sidebar_width {
            layout.push(ViewCommand::SetSidebarWidth(width));
        }
        if let Some(open) = sidebar_open {
            layout.push(ViewCommand::SetSidebarOpen(open));
        }
        if let Some(height) = bottom_placeholder_height {
            layout.push(ViewCommand::SetBottomPlaceholderHeight(height));
        }
        if prompt_import {
            layout.push(ViewCommand::SetPromptImport(true));
        }
        session.apply_view_all(layout);

        let mut restore = Vec::new();
        if let Some(state) = state {
            restore.push(ViewCommand::RestoreState {
                state,
                skip_scroll: location.is_some(),
            });
        }
        if let Some(location) = location {
            restore.push(ViewCommand::Navigate(location));
        }
        if !restore.is_empty() {
            session.enqueue_guarded(restore);
        }

        tracing::info!(session = %session.id, "Session opened");
        session
    }

    /// Tell the host the session exists by sending `initialized`.
    ///
    /// Silent once the session is torn down.
    pub async fn announce(&self) {
        self.outbox.emit_logged(OutboundMessage::Initialized).await;
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.gate.state()
    }

    /// Check if the session was torn down.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// The lifecycle gate, for hosts that guard their own operations.
    pub fn gate(&self) -> &LifecycleGate {
        &self.gate
    }

    /// Snapshot of the annotation list.
    pub fn annotations(&self) -> Vec<Annotation> {
        lock(&self.store).annotations().to_vec()
    }

    /// Look up one annotation.
    pub fn annotation(&self, id: &AnnotationId) -> Option<Annotation> {
        lock(&self.store).get(id).cloned()
    }

    /// Currently selected annotation ids.
    pub fn selection(&self) -> Vec<AnnotationId> {
        lock(&self.selection).clone()
    }

    /// Tear the session down. Synchronous and idempotent.
    ///
    /// Aborts pending and future guarded operations, stops the debouncer
    /// (discarding any pending state) and uninitializes the view.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.gate.teardown();
        lock(&self.guarded).take();
        self.debouncer.stop();
        lock(&self.view).uninit();
        tracing::info!(session = %self.id, "Session torn down");
    }

    // =========================================================================
    // View plumbing
    // =========================================================================

    fn apply_view(&self, command: ViewCommand) {
        self.apply_view_all(vec![command]);
    }

    fn apply_view_all(&self, commands: Vec<ViewCommand>) {
        if self.is_torn_down() || commands.is_empty() {
            return;
        }
        apply_all(&self.view, commands);
    }

    /// Queue `commands` behind every earlier guarded request.
    ///
    /// Resolves to `true` once applied, `false` if the session was torn down
    /// first.
    fn enqueue_guarded(&self, commands: Vec<ViewCommand>) -> oneshot::Receiver<bool> {
        let (done, result) = oneshot::channel();
        let request = Guarded { commands, done };
        let rejected = match lock(&self.guarded).as_ref() {
            Some(requests) => requests.send(request).err().map(|e| e.0),
            None => Some(request),
        };
        if let Some(request) = rejected {
            let _ = request.done.send(false);
        }
        result
    }

    async fn run_store_actions(&self, actions: Vec<StoreAction>) -> Result<(), ChannelError> {
        for action in actions {
            match action {
                StoreAction::Render => {
                    let annotations = self.annotations();
                    self.apply_view(ViewCommand::SetAnnotations(annotations));
                }
                StoreAction::Emit(StoreNotice::Set(annotation)) => {
                    self.outbox
                        .emit(OutboundMessage::SetAnnotation { annotation })
                        .await?;
                }
                StoreAction::Emit(StoreNotice::Deleted(ids)) => {
                    self.outbox
                        .emit(OutboundMessage::DeleteAnnotations { ids })
                        .await?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Host commands
    // =========================================================================

    /// Navigate once ready.
    pub fn navigate(&self, location: Location) -> oneshot::Receiver<bool> {
        self.enqueue_guarded(vec![ViewCommand::Navigate(location)])
    }

    /// Show or hide the import prompt once ready.
    pub fn set_prompt_import(&self, enable: bool) -> oneshot::Receiver<bool> {
        self.enqueue_guarded(vec![ViewCommand::SetPromptImport(enable)])
    }

    /// Enable or disable "add to note" once ready.
    pub fn set_enable_add_to_note(&self, enable: bool) -> oneshot::Receiver<bool> {
        self.enqueue_guarded(vec![ViewCommand::SetEnableAddToNote(enable)])
    }

    /// Host-pushed annotations: upsert without echo.
    pub fn apply_external_set(&self, annotations: Vec<Annotation>) {
        if self.is_torn_down() {
            return;
        }
        let actions = lock(&self.store).apply_external_set(annotations);
        if actions.contains(&StoreAction::Render) {
            self.apply_view(ViewCommand::SetAnnotations(self.annotations()));
        }
    }

    /// Host-pushed removals: delete without echo.
    pub fn apply_external_unset(&self, ids: &[AnnotationId]) {
        if self.is_torn_down() {
            return;
        }
        let actions = lock(&self.store).apply_external_unset(ids);
        lock(&self.selection).retain(|id| !ids.contains(id));
        if actions.contains(&StoreAction::Render) {
            self.apply_view(ViewCommand::SetAnnotations(self.annotations()));
        }
    }

    /// Annotation popup command.
    pub async fn popup_command(&self, cmd: PopupCmd) {
        if self.is_torn_down() {
            return;
        }
        match (cmd.cmd, cmd.id, cmd.color) {
            (PopupCommand::AddToNote, Some(id), _) => {
                let Some(mut annotation) = self.annotation(&id) else {
                    tracing::debug!(session = %self.id, %id, "addToNote for unknown annotation");
                    return;
                };
                annotation.attachment_item_id = Some(self.id.to_string());
                if let Err(e) = self.add_to_note(vec![annotation]).await {
                    tracing::warn!(session = %self.id, "addToNote failed: {}", e);
                }
            }
            (PopupCommand::DeleteAnnotation, Some(id), _) => {
                if let Err(e) = self.delete_annotations(&[id]).await {
                    tracing::warn!(session = %self.id, "Delete from popup failed: {}", e);
                }
            }
            (PopupCommand::SetAnnotationColor, Some(id), Some(color)) => {
                match self
                    .update_annotation(AnnotationPatch::new(id).color(&color))
                    .await
                {
                    Ok(()) => {}
                    Err(SessionError::Store(StoreError::NotFound { id })) => {
                        tracing::warn!(session = %self.id, %id, "Color change for unknown annotation");
                    }
                    Err(e) => tracing::warn!(session = %self.id, "Color change failed: {}", e),
                }
            }
            (PopupCommand::SetColor, _, Some(color)) => {
                self.apply_view(ViewCommand::SetColor(color));
            }
            (cmd, id, color) => {
                tracing::debug!(session = %self.id, ?cmd, ?id, ?color, "Ignoring popup command");
            }
        }
    }

    /// Host menu command.
    pub fn menu_command(&self, cmd: MenuCommand) {
        match menu_action(cmd) {
            Some(action) => self.apply_view(ViewCommand::Menu(action)),
            None => tracing::debug!(session = %self.id, ?cmd, "Ignoring menu command"),
        }
    }

    /// Set the sidebar width.
    pub fn set_sidebar_width(&self, width: u32) {
        self.apply_view(ViewCommand::SetSidebarWidth(width));
    }

    /// Open or close the sidebar.
    pub fn set_sidebar_open(&self, open: bool) {
        self.apply_view(ViewCommand::SetSidebarOpen(open));
    }

    /// Reserve space below the document.
    pub fn set_bottom_placeholder_height(&self, height: u32) {
        self.apply_view(ViewCommand::SetBottomPlaceholderHeight(height));
    }

    /// Reserve space beside the toolbar.
    pub fn set_toolbar_placeholder_width(&self, width: u32) {
        self.apply_view(ViewCommand::SetToolbarPlaceholderWidth(width));
    }

    /// Show a host error through the renderer.
    pub fn show_error(&self, message: String, more_info: Option<Value>) {
        self.apply_view(ViewCommand::ShowError { message, more_info });
    }

    // =========================================================================
    // Local edits
    // =========================================================================

    /// Create an annotation locally and forward it to the host.
    pub async fn add_annotation(&self, annotation: Annotation) -> Result<(), SessionError> {
        if self.is_torn_down() {
            return Ok(());
        }
        let actions = lock(&self.store).add(annotation);
        self.run_store_actions(actions).await?;
        Ok(())
    }

    /// Merge a partial update into an existing annotation and forward the result.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the id is not in the store.
    pub async fn update_annotation(&self, patch: AnnotationPatch) -> Result<(), SessionError> {
        if self.is_torn_down() {
            return Ok(());
        }
        let actions = lock(&self.store).update(patch)?;
        self.run_store_actions(actions).await?;
        Ok(())
    }

    /// Delete annotations locally and forward the ids actually removed.
    pub async fn delete_annotations(&self, ids: &[AnnotationId]) -> Result<(), SessionError> {
        if self.is_torn_down() {
            return Ok(());
        }
        let actions = lock(&self.store).delete(ids);
        lock(&self.selection).retain(|id| !ids.contains(id));
        self.run_store_actions(actions).await?;
        Ok(())
    }

    // =========================================================================
    // Outbound requests
    // =========================================================================

    /// User accepted the import prompt.
    pub async fn import(&self) -> Result<(), ChannelError> {
        self.outbox.emit(OutboundMessage::Import).await
    }

    /// User dismissed the import prompt.
    pub async fn dismiss_import(&self) -> Result<(), ChannelError> {
        self.outbox.emit(OutboundMessage::DismissImport).await
    }

    /// Add annotations to the current note.
    pub async fn add_to_note(&self, annotations: Vec<Annotation>) -> Result<(), ChannelError> {
        self.outbox
            .emit(OutboundMessage::AddToNote { annotations })
            .await
    }

    /// Ask the host to open its tag editor next to the clicked element.
    pub async fn open_tags_popup(
        &self,
        id: AnnotationId,
        anchor: ClickAnchor,
    ) -> Result<(), ChannelError> {
        let (x, y) = anchor.screen_origin();
        self.outbox
            .emit(OutboundMessage::OpenTagsPopup { id, x, y })
            .await
    }

    /// Ask the host to show a popup of its own.
    pub async fn popup(&self, name: &str, data: Map<String, Value>) -> Result<(), ChannelError> {
        self.outbox
            .emit(OutboundMessage::Popup {
                name: name.to_string(),
                data,
            })
            .await
    }

    /// Ask the host to open an external link.
    pub async fn open_url(&self, url: &str) -> Result<(), ChannelError> {
        self.outbox
            .emit(OutboundMessage::OpenUrl {
                url: url.to_string(),
            })
            .await
    }

    /// Ask the host to save the document.
    pub async fn save(&self) -> Result<(), ChannelError> {
        self.outbox.emit(OutboundMessage::Save).await
    }

    /// The user resized the sidebar.
    pub async fn change_sidebar_width(&self, width: u32) -> Result<(), ChannelError> {
        self.outbox
            .emit(OutboundMessage::ChangeSidebarWidth { width })
            .await
    }

    /// The user toggled the sidebar.
    pub async fn change_sidebar_open(&self, open: bool) -> Result<(), ChannelError> {
        self.outbox
            .emit(OutboundMessage::ChangeSidebarOpen { open })
            .await
    }

    // =========================================================================
    // View events
    // =========================================================================

    /// The annotation UI finished its first paint.
    ///
    /// It is handed the current annotation list before readiness is recorded.
    pub fn annotator_ready(&self) {
        if self.is_torn_down() {
            return;
        }
        self.apply_view(ViewCommand::SetAnnotations(self.annotations()));
        self.gate.annotator_ready();
    }

    /// The renderer finished document initialization.
    pub fn renderer_ready(&self) {
        if self.is_torn_down() {
            return;
        }
        self.gate.renderer_ready();
    }

    /// The visible area changed (page, zoom, scroll, layout).
    pub fn view_area_updated(&self, state: ViewState) {
        if self.is_torn_down() {
            return;
        }
        self.debouncer.notify(state);
    }

    /// The sidebar switched panels.
    pub fn sidebar_view_changed(&self, view: SidebarView) {
        if self.is_torn_down() {
            return;
        }
        self.debouncer.notify_sidebar_view(view);
    }

    /// Replace the selection.
    pub fn select_annotations(&self, ids: Vec<AnnotationId>) {
        if self.is_torn_down() {
            return;
        }
        *lock(&self.selection) = ids;
    }

    /// Handle a key-down event.
    ///
    /// Returns the dispatch so the caller can suppress the event's default
    /// action or stop its propagation.
    pub async fn handle_key(&self, event: &KeyEvent, context: KeyContext) -> KeyDispatch {
        let result = dispatch(event, context, self.platform);
        if self.is_torn_down() {
            return result;
        }

        for command in &result.commands {
            match command {
                ReaderCommand::DeleteSelected => {
                    let ids = self.deletable_selection();
                    if ids.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.delete_annotations(&ids).await {
                        tracing::warn!(session = %self.id, "Delete selected failed: {}", e);
                    }
                }
                ReaderCommand::ClearSelection => {
                    lock(&self.selection).clear();
                    self.apply_view(ViewCommand::Reader(*command));
                }
                other => self.apply_view(ViewCommand::Reader(*other)),
            }
        }
        result
    }

    fn deletable_selection(&self) -> Vec<AnnotationId> {
        let selection = self.selection();
        let store = lock(&self.store);
        selection
            .into_iter()
            .filter(|id| store.get(id).is_some_and(|a| !a.read_only))
            .collect()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannel;
    use crate::view::RecordingFactory;
    use reader_sync_types::AnnotationType;
    use serde_json::json;

    struct Fixture {
        channel: MockChannel,
        factory: RecordingFactory,
        session: Arc<Session>,
    }

    fn highlight(id: &str) -> Annotation {
        Annotation::new(id, AnnotationType::Highlight, "#ffd400", json!({"pageIndex": 0}))
    }

    fn fixture(open: Open) -> Fixture {
        let channel = MockChannel::new();
        let factory = RecordingFactory::new();
        let session = Session::open(
            SessionId::new("s1"),
            open,
            Arc::new(channel.clone()),
            &factory,
            &Config::default(),
        );
        Fixture {
            channel,
            factory,
            session,
        }
    }

    impl Fixture {
        fn commands(&self) -> Vec<ViewCommand> {
            self.factory.commands(&SessionId::new("s1"))
        }

        fn ready(&self) {
            self.session.annotator_ready();
            self.session.renderer_ready();
        }
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn open_seeds_store_and_layout() {
        let f = fixture(Open {
            annotations: vec![highlight("a1"), highlight("a2")],
            sidebar_width: Some(240),
            sidebar_open: Some(true),
            bottom_placeholder_height: Some(30),
            ..Open::default()
        });

        assert_eq!(f.session.annotations().len(), 2);
        assert_eq!(
            f.commands(),
            vec![
                ViewCommand::SetSidebarWidth(240),
                ViewCommand::SetSidebarOpen(true),
                ViewCommand::SetBottomPlaceholderHeight(30),
            ]
        );
    }

    #[tokio::test]
    async fn initialized_waits_for_announce() {
        let f = fixture(Open::default());
        settle().await;
        assert!(f.channel.sent().is_empty());

        f.session.announce().await;

        assert_eq!(f.channel.sent_messages(), vec![OutboundMessage::Initialized]);
    }

    #[tokio::test]
    async fn announce_after_teardown_is_silent() {
        let f = fixture(Open::default());
        f.session.teardown();

        f.session.announce().await;

        assert!(f.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn restore_waits_for_both_signals() {
        let location = Location(json!({"pageNumber": 3}));
        let f = fixture(Open {
            state: Some(ViewState::default()),
            location: Some(location.clone()),
            ..Open::default()
        });
        let later = Location(json!({"pageNumber": 7}));
        let pending = f.session.navigate(later.clone());

        settle().await;
        assert!(f.commands().is_empty());

        f.ready();
        assert!(pending.await.unwrap());

        // Restoration was queued first, so the host's navigation wins.
        assert_eq!(
            f.commands(),
            vec![
                ViewCommand::SetAnnotations(Vec::new()),
                ViewCommand::RestoreState {
                    state: ViewState::default(),
                    skip_scroll: true,
                },
                ViewCommand::Navigate(location),
                ViewCommand::Navigate(later),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn guarded_requests_keep_their_order() {
        for _ in 0..50 {
            let f = fixture(Open {
                location: Some(Location(json!({"pageNumber": 1}))),
                ..Open::default()
            });
            let pending: Vec<_> = (2..=5)
                .map(|n| f.session.navigate(Location(json!({"pageNumber": n}))))
                .collect();

            f.ready();
            for done in pending {
                assert!(done.await.unwrap());
            }

            let pages: Vec<_> = f
                .commands()
                .into_iter()
                .filter_map(|c| match c {
                    ViewCommand::Navigate(Location(value)) => value["pageNumber"].as_u64(),
                    _ => None,
                })
                .collect();
            assert_eq!(pages, vec![1, 2, 3, 4, 5]);
        }
    }

    #[tokio::test]
    async fn teardown_answers_every_pending_request() {
        let f = fixture(Open::default());
        let first = f.session.navigate(Location(json!({"pageNumber": 2})));
        let second = f.session.set_prompt_import(true);

        f.session.teardown();
        let after = f.session.set_enable_add_to_note(true);
        f.ready();

        assert!(!first.await.unwrap());
        assert!(!second.await.unwrap());
        assert!(!after.await.unwrap());
        assert!(f.commands().is_empty());
    }

    #[tokio::test]
    async fn annotator_gets_annotations_before_ready() {
        let f = fixture(Open {
            annotations: vec![highlight("a1")],
            ..Open::default()
        });

        f.session.annotator_ready();

        assert_eq!(
            f.commands(),
            vec![ViewCommand::SetAnnotations(vec![highlight("a1")])]
        );
        assert_eq!(f.session.state(), LifecycleState::AnnotatorReady);
    }

    #[tokio::test]
    async fn navigate_after_teardown_never_runs() {
        let f = fixture(Open::default());

        let pending = f.session.navigate(Location(json!({"pageNumber": 2})));
        f.session.teardown();

        assert!(!pending.await.unwrap());
        assert!(f
            .commands()
            .iter()
            .all(|c| !matches!(c, ViewCommand::Navigate(_))));
        assert_eq!(f.factory.uninitialized(), vec![SessionId::new("s1")]);
    }

    #[tokio::test]
    async fn teardown_is_idempotent() {
        let f = fixture(Open::default());

        f.session.teardown();
        f.session.teardown();

        assert_eq!(f.factory.uninitialized().len(), 1);
        assert!(f.session.is_torn_down());
        assert_eq!(f.session.state(), LifecycleState::TornDown);
    }

    #[tokio::test]
    async fn local_add_renders_and_forwards() {
        let f = fixture(Open::default());
        settle().await;

        f.session.add_annotation(highlight("a1")).await.unwrap();

        assert_eq!(
            f.commands().last(),
            Some(&ViewCommand::SetAnnotations(vec![highlight("a1")]))
        );
        assert_eq!(
            f.channel.sent_messages().last(),
            Some(&OutboundMessage::SetAnnotation {
                annotation: highlight("a1")
            })
        );
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let f = fixture(Open::default());

        let result = f
            .session
            .update_annotation(AnnotationPatch::new("ghost").color("#000000"))
            .await;

        assert!(matches!(
            result,
            Err(SessionError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn external_set_does_not_echo() {
        let f = fixture(Open::default());
        settle().await;
        f.channel.reset();

        f.session.apply_external_set(vec![highlight("a1")]);
        f.session.apply_external_unset(&[AnnotationId::new("a1")]);

        assert!(f.channel.sent().is_empty());
        assert!(f.session.annotations().is_empty());
    }

    #[tokio::test]
    async fn popup_add_to_note_stamps_session() {
        let f = fixture(Open {
            annotations: vec![highlight("a1")],
            ..Open::default()
        });
        settle().await;

        f.session
            .popup_command(PopupCmd {
                cmd: PopupCommand::AddToNote,
                id: Some(AnnotationId::new("a1")),
                color: None,
            })
            .await;

        let mut expected = highlight("a1");
        expected.attachment_item_id = Some("s1".to_string());
        assert_eq!(
            f.channel.sent_messages().last(),
            Some(&OutboundMessage::AddToNote {
                annotations: vec![expected]
            })
        );
    }

    #[tokio::test]
    async fn popup_color_changes() {
        let f = fixture(Open {
            annotations: vec![highlight("a1")],
            ..Open::default()
        });

        f.session
            .popup_command(PopupCmd {
                cmd: PopupCommand::SetAnnotationColor,
                id: Some(AnnotationId::new("a1")),
                color: Some("#2ea8e5".into()),
            })
            .await;
        f.session
            .popup_command(PopupCmd {
                cmd: PopupCommand::SetColor,
                id: None,
                color: Some("#ff6666".into()),
            })
            .await;

        let stored = f.session.annotation(&AnnotationId::new("a1")).unwrap();
        assert_eq!(stored.color, "#2ea8e5");
        assert_eq!(
            f.commands().last(),
            Some(&ViewCommand::SetColor("#ff6666".into()))
        );
    }

    #[tokio::test]
    async fn menu_command_reaches_view() {
        let f = fixture(Open::default());

        f.session.menu_command(MenuCommand::RotateCw);
        f.session.menu_command(MenuCommand::Unsupported);

        assert_eq!(
            f.commands(),
            vec![ViewCommand::Menu(reader_sync_core::MenuAction::RotateClockwise)]
        );
    }

    #[tokio::test]
    async fn open_tags_popup_uses_element_origin() {
        let f = fixture(Open::default());
        settle().await;

        let anchor = ClickAnchor {
            screen_x: 500.0,
            screen_y: 400.0,
            client_x: 120.0,
            client_y: 90.0,
            rect_left: 100.0,
            rect_top: 80.0,
        };
        f.session
            .open_tags_popup(AnnotationId::new("a1"), anchor)
            .await
            .unwrap();

        assert_eq!(
            f.channel.sent_messages().last(),
            Some(&OutboundMessage::OpenTagsPopup {
                id: AnnotationId::new("a1"),
                x: 480.0,
                y: 390.0,
            })
        );
    }

    #[tokio::test]
    async fn delete_key_skips_read_only() {
        let f = fixture(Open {
            annotations: vec![highlight("a1"), highlight("a2").read_only()],
            ..Open::default()
        });
        settle().await;

        f.session
            .select_annotations(vec![AnnotationId::new("a1"), AnnotationId::new("a2")]);
        let result = f
            .session
            .handle_key(&KeyEvent::new("Delete"), KeyContext::View)
            .await;

        assert_eq!(result.commands, vec![ReaderCommand::DeleteSelected]);
        assert_eq!(
            f.channel.sent_messages().last(),
            Some(&OutboundMessage::DeleteAnnotations {
                ids: vec![AnnotationId::new("a1")]
            })
        );
        assert!(f.session.annotation(&AnnotationId::new("a2")).is_some());
        assert_eq!(f.session.selection(), vec![AnnotationId::new("a2")]);
    }

    #[tokio::test]
    async fn calls_after_teardown_are_absorbed() {
        let f = fixture(Open::default());
        f.session.teardown();
        let before = f.commands().len();

        f.session.add_annotation(highlight("a1")).await.unwrap();
        f.session.set_sidebar_width(300);
        f.session.annotator_ready();
        f.session.save().await.unwrap();
        settle().await;

        assert_eq!(f.commands().len(), before);
        assert!(f.channel.sent().is_empty());
        assert!(f.session.annotations().is_empty());
    }
}
