//! Outbound emission for one session.

use std::fmt;
use std::sync::Arc;

use reader_sync_types::{Envelope, OutboundMessage, SessionId};

use crate::channel::{ChannelError, EnvelopeChannel};
use crate::lifecycle::LifecycleGate;

/// The single path for reader-to-host messages.
///
/// Wraps every message in an envelope addressed to the owning session. After
/// the session's gate is torn down, emission is a silent no-op.
#[derive(Clone)]
pub struct Outbox {
    session_id: SessionId,
    channel: Arc<dyn EnvelopeChannel>,
    gate: LifecycleGate,
}

impl fmt::Debug for Outbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outbox")
            .field("session_id", &self.session_id)
            .field("torn_down", &self.gate.is_torn_down())
            .finish()
    }
}

impl Outbox {
    /// Create an outbox for `session_id`.
    pub fn new(
        session_id: SessionId,
        channel: Arc<dyn EnvelopeChannel>,
        gate: LifecycleGate,
    ) -> Self {
        Self {
            session_id,
            channel,
            gate,
        }
    }

    /// Session this outbox addresses.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Send a message to the host.
    pub async fn emit(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        if self.gate.is_torn_down() {
            tracing::trace!(
                session = %self.session_id,
                action = %message.action_name(),
                "Dropping emit after teardown"
            );
            return Ok(());
        }

        let envelope = Envelope::outbound(self.session_id.clone(), &message)
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        self.channel.send(&envelope).await
    }

    /// Send a message, logging instead of returning a failure.
    pub async fn emit_logged(&self, message: OutboundMessage) {
        let action = message.action_name();
        if let Err(e) = self.emit(message).await {
            tracing::warn!(session = %self.session_id, %action, "Emit failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannel;

    fn outbox(channel: &MockChannel, gate: &LifecycleGate) -> Outbox {
        Outbox::new(SessionId::new("s1"), Arc::new(channel.clone()), gate.clone())
    }

    #[tokio::test]
    async fn emit_wraps_session_id() {
        let channel = MockChannel::new();
        let gate = LifecycleGate::new();

        outbox(&channel, &gate)
            .emit(OutboundMessage::Import)
            .await
            .unwrap();

        let sent = channel.last_sent().unwrap();
        assert_eq!(sent.session_id, SessionId::new("s1"));
        assert_eq!(sent.action(), Some("import"));
    }

    #[tokio::test]
    async fn emit_after_teardown_is_silent() {
        let channel = MockChannel::new();
        let gate = LifecycleGate::new();
        let outbox = outbox(&channel, &gate);

        gate.teardown();

        assert!(outbox.emit(OutboundMessage::Save).await.is_ok());
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn emit_reports_channel_failure() {
        let channel = MockChannel::new();
        let gate = LifecycleGate::new();
        channel.fail_next_send("detached");

        let result = outbox(&channel, &gate).emit(OutboundMessage::Save).await;
        assert!(matches!(result, Err(ChannelError::SendFailed(_))));

        // Logged variant swallows the failure.
        channel.fail_next_send("detached");
        outbox(&channel, &gate)
            .emit_logged(OutboundMessage::Save)
            .await;
        assert!(channel.sent().is_empty());
    }
}
