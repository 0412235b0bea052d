//! Messaging gateway.
//!
//! Owns the active [`Session`] and routes inbound envelopes to it. An `open`
//! always replaces the session; anything else is checked against the active
//! session id first and dropped when stale. Routing never fails towards the
//! host: every envelope ends in a [`Received`] report.
//!
//! A new session's `initialized` is held back until the host sends it another
//! action or the channel goes quiet. It always precedes the session's other
//! traffic, and an `open` replaced in the meantime is never announced.

use std::fmt;
use std::sync::Arc;

use reader_sync_types::{
    Envelope, InboundAction, InboundMessage, Open, SessionId, SyncError,
};

use crate::channel::{ChannelError, EnvelopeChannel};
use crate::config::Config;
use crate::session::Session;
use crate::view::ViewFactory;

/// Why an inbound envelope had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Addressed to a session that is no longer active.
    SessionMismatch {
        /// Active session
        active: SessionId,
        /// Session named by the envelope
        received: SessionId,
    },
    /// No session is open.
    NoSession,
    /// The action is not part of the protocol.
    UnknownAction(String),
    /// The action is known but its payload could not be decoded.
    Malformed(String),
}

/// Outcome of routing one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A new session was installed.
    Opened,
    /// The action was handed to the active session.
    Dispatched(InboundAction),
    /// Nothing happened.
    Ignored(IgnoreReason),
}

/// Session-owning router between the host channel and the reader.
pub struct Gateway {
    channel: Arc<dyn EnvelopeChannel>,
    factory: Arc<dyn ViewFactory>,
    config: Config,
    session: Option<Arc<Session>>,
    unannounced: bool,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("session", &self.session.as_ref().map(|s| s.id().clone()))
            .field("unannounced", &self.unannounced)
            .finish()
    }
}

impl Gateway {
    /// Create a gateway with no open session.
    pub fn new(
        channel: Arc<dyn EnvelopeChannel>,
        factory: Arc<dyn ViewFactory>,
        config: Config,
    ) -> Self {
        Self {
            channel,
            factory,
            config,
            session: None,
            unannounced: false,
        }
    }

    /// The active session.
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tear down the active session, if any, and install a new one.
    ///
    /// The new session is announced by [`Gateway::announce`], which
    /// [`Gateway::run`] and [`Gateway::receive`] call on their own.
    pub fn open(&mut self, session_id: SessionId, open: Open) -> Arc<Session> {
        if let Some(previous) = self.session.take() {
            previous.teardown();
        }
        let session = Session::open(
            session_id,
            open,
            Arc::clone(&self.channel),
            self.factory.as_ref(),
            &self.config,
        );
        self.session = Some(Arc::clone(&session));
        self.unannounced = true;
        session
    }

    /// Send `initialized` for the active session if it has not gone out yet.
    pub async fn announce(&mut self) {
        if !std::mem::take(&mut self.unannounced) {
            return;
        }
        if let Some(session) = self.session.clone() {
            session.announce().await;
        }
    }

    /// Tear down the active session.
    pub fn close(&mut self) {
        self.unannounced = false;
        if let Some(session) = self.session.take() {
            session.teardown();
        }
    }

    /// Route one inbound envelope.
    pub async fn receive(&mut self, envelope: Envelope) -> Received {
        let is_open = envelope.action() == Some(InboundAction::Open.name());
        if !is_open {
            if let Err(reason) = self.check_session(&envelope.session_id) {
                tracing::debug!(?reason, action = ?envelope.action(), "Ignoring envelope");
                return Received::Ignored(reason);
            }
        }

        let message = match envelope.decode_inbound() {
            Ok(message) => message,
            Err(SyncError::UnknownAction(action)) => {
                tracing::debug!(%action, "Ignoring unknown action");
                return Received::Ignored(IgnoreReason::UnknownAction(action));
            }
            Err(e) => {
                tracing::debug!("Ignoring malformed envelope: {}", e);
                return Received::Ignored(IgnoreReason::Malformed(e.to_string()));
            }
        };

        if let InboundMessage::Open(open) = message {
            self.open(envelope.session_id, open);
            return Received::Opened;
        }

        let Some(session) = self.session.clone() else {
            return Received::Ignored(IgnoreReason::NoSession);
        };
        self.announce().await;
        let action = message.action();
        tracing::debug!(session = %session.id(), action = action.name(), "Dispatching");
        dispatch(&session, message).await;
        Received::Dispatched(action)
    }

    fn check_session(&self, received: &SessionId) -> Result<(), IgnoreReason> {
        match &self.session {
            None => Err(IgnoreReason::NoSession),
            Some(session) if session.id() != received => Err(IgnoreReason::SessionMismatch {
                active: session.id().clone(),
                received: received.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Route envelopes in arrival order until the channel closes.
    ///
    /// Frames that fail to arrive intact are logged and skipped. A pending
    /// `initialized` goes out before waiting for the next envelope.
    pub async fn run(&mut self) {
        loop {
            let ready = tokio::select! {
                biased;
                next = self.channel.recv() => Some(next),
                _ = std::future::ready(()) => None,
            };
            let next = match ready {
                Some(next) => next,
                None => {
                    self.announce().await;
                    self.channel.recv().await
                }
            };

            match next {
                Ok(envelope) => {
                    self.receive(envelope).await;
                }
                Err(ChannelError::ReceiveFailed(e)) => {
                    tracing::warn!("Dropping undeliverable envelope: {}", e);
                }
                Err(e) => {
                    tracing::info!("Channel ended: {}", e);
                    break;
                }
            }
        }
    }
}

async fn dispatch(session: &Session, message: InboundMessage) {
    match message {
        // Installed by the gateway before dispatch.
        InboundMessage::Open(_) => {}
        InboundMessage::Navigate { location } => {
            session.navigate(location);
        }
        InboundMessage::ToggleImportPrompt { enable } => {
            session.set_prompt_import(enable);
        }
        InboundMessage::EnableAddToNote { enable } => {
            session.set_enable_add_to_note(enable);
        }
        InboundMessage::SetAnnotations { annotations } => session.apply_external_set(annotations),
        InboundMessage::UnsetAnnotations { ids } => session.apply_external_unset(&ids),
        InboundMessage::PopupCmd(cmd) => session.popup_command(cmd).await,
        InboundMessage::MenuCmd { cmd } => session.menu_command(cmd),
        InboundMessage::SetSidebarWidth { width } => session.set_sidebar_width(width),
        InboundMessage::SetSidebarOpen { open } => session.set_sidebar_open(open),
        InboundMessage::SetBottomPlaceholderHeight { height } => {
            session.set_bottom_placeholder_height(height)
        }
        InboundMessage::SetToolbarPlaceholderWidth { width } => {
            session.set_toolbar_placeholder_width(width)
        }
        InboundMessage::Error { message, more_info } => session.show_error(message, more_info),
    }
}
