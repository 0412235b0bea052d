//! Mock channel for testing.
//!
//! Allows queueing inbound envelopes and capturing sent envelopes for verification.

use super::{ChannelError, EnvelopeChannel};
use async_trait::async_trait;
use reader_sync_types::{Envelope, OutboundMessage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock channel for testing.
///
/// Starts open. `recv()` on an empty queue reports `Closed`, so a gateway
/// run loop over a mock drains the queue and stops.
#[derive(Debug, Clone)]
pub struct MockChannel {
    inner: Arc<Mutex<MockChannelInner>>,
}

#[derive(Debug)]
struct MockChannelInner {
    connected: bool,
    sent: Vec<Envelope>,
    inbound: VecDeque<Envelope>,
    fail_next_send: Option<String>,
    fail_next_recv: Option<String>,
}

impl Default for MockChannelInner {
    fn default() -> Self {
        Self {
            connected: true,
            sent: Vec::new(),
            inbound: VecDeque::new(),
            fail_next_send: None,
            fail_next_recv: None,
        }
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockChannelInner::default())),
        }
    }
}

impl MockChannel {
    /// Create a new, open mock channel.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockChannelInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an envelope to be returned by the next `recv()` call.
    pub fn queue_inbound(&self, envelope: Envelope) {
        self.lock().inbound.push_back(envelope);
    }

    /// Get all envelopes that were sent.
    pub fn sent(&self) -> Vec<Envelope> {
        self.lock().sent.clone()
    }

    /// Get the last envelope that was sent.
    pub fn last_sent(&self) -> Option<Envelope> {
        self.lock().sent.last().cloned()
    }

    /// Decode every sent envelope. Undecodable envelopes are skipped.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.lock()
            .sent
            .iter()
            .filter_map(|envelope| envelope.decode_outbound().ok())
            .collect()
    }

    /// Sent envelopes carrying the given action name.
    pub fn sent_with_action(&self, action: &str) -> Vec<Envelope> {
        self.lock()
            .sent
            .iter()
            .filter(|envelope| envelope.action() == Some(action))
            .cloned()
            .collect()
    }

    /// Cause the next send() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.lock().fail_next_send = Some(error.to_string());
    }

    /// Cause the next recv() to fail with the given error.
    pub fn fail_next_recv(&self, error: &str) {
        self.lock().fail_next_recv = Some(error.to_string());
    }

    /// Clear captured envelopes, queued input and forced failures, and reopen.
    pub fn reset(&self) {
        *self.lock() = MockChannelInner::default();
    }
}

#[async_trait]
impl EnvelopeChannel for MockChannel {
    async fn send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(ChannelError::Closed);
        }

        if let Some(error) = inner.fail_next_send.take() {
            return Err(ChannelError::SendFailed(error));
        }

        inner.sent.push(envelope.clone());
        Ok(())
    }

    async fn recv(&self) -> Result<Envelope, ChannelError> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(ChannelError::Closed);
        }

        if let Some(error) = inner.fail_next_recv.take() {
            return Err(ChannelError::ReceiveFailed(error));
        }

        inner.inbound.pop_front().ok_or(ChannelError::Closed)
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.lock().connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_sync_types::{InboundMessage, SessionId};

    fn envelope(session: &str, message: &OutboundMessage) -> Envelope {
        Envelope::outbound(SessionId::new(session), message).unwrap()
    }

    // ===========================================
    // MockChannel Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_channel_starts_open() {
        let channel = MockChannel::new();
        assert!(channel.is_connected());
    }

    #[tokio::test]
    async fn mock_channel_captures_sent() {
        let channel = MockChannel::new();

        channel
            .send(&envelope("s1", &OutboundMessage::Initialized))
            .await
            .unwrap();
        channel
            .send(&envelope("s1", &OutboundMessage::Save))
            .await
            .unwrap();

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].action(), Some("initialized"));
        assert_eq!(
            channel.sent_messages(),
            vec![OutboundMessage::Initialized, OutboundMessage::Save]
        );
        assert_eq!(channel.sent_with_action("save").len(), 1);
    }

    #[tokio::test]
    async fn mock_channel_receives_in_order() {
        let channel = MockChannel::new();
        let first = Envelope::inbound(
            SessionId::new("s1"),
            &InboundMessage::SetSidebarOpen { open: true },
        )
        .unwrap();
        let second = Envelope::inbound(
            SessionId::new("s1"),
            &InboundMessage::SetSidebarOpen { open: false },
        )
        .unwrap();

        channel.queue_inbound(first.clone());
        channel.queue_inbound(second.clone());

        assert_eq!(channel.recv().await.unwrap(), first);
        assert_eq!(channel.recv().await.unwrap(), second);
    }

    #[tokio::test]
    async fn mock_channel_recv_empty_returns_closed() {
        let channel = MockChannel::new();

        let result = channel.recv().await;
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn send_after_close_fails() {
        let channel = MockChannel::new();
        channel.close().await.unwrap();

        assert!(!channel.is_connected());
        let result = channel.send(&envelope("s1", &OutboundMessage::Save)).await;
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn forced_send_failure() {
        let channel = MockChannel::new();
        channel.fail_next_send("port detached");

        let result = channel.send(&envelope("s1", &OutboundMessage::Save)).await;
        assert!(matches!(result, Err(ChannelError::SendFailed(_))));

        // Next send should work
        channel
            .send(&envelope("s1", &OutboundMessage::Save))
            .await
            .unwrap();
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn forced_recv_failure() {
        let channel = MockChannel::new();
        let queued = Envelope::inbound(
            SessionId::new("s1"),
            &InboundMessage::SetSidebarWidth { width: 240 },
        )
        .unwrap();
        channel.queue_inbound(queued.clone());
        channel.fail_next_recv("decode error");

        let result = channel.recv().await;
        assert!(matches!(result, Err(ChannelError::ReceiveFailed(_))));

        // The queued envelope is still there
        assert_eq!(channel.recv().await.unwrap(), queued);
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn clone_shares_state() {
        let channel1 = MockChannel::new();
        let channel2 = channel1.clone();

        channel1
            .send(&envelope("s1", &OutboundMessage::Import))
            .await
            .unwrap();
        channel2
            .send(&envelope("s1", &OutboundMessage::DismissImport))
            .await
            .unwrap();

        assert_eq!(channel1.sent().len(), 2);
        assert_eq!(
            channel2.last_sent().and_then(|e| e.action().map(str::to_string)),
            Some("dismissImport".to_string())
        );
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let channel = MockChannel::new();
        channel
            .send(&envelope("s1", &OutboundMessage::Save))
            .await
            .unwrap();
        channel.close().await.unwrap();

        channel.reset();

        assert!(channel.is_connected());
        assert!(channel.sent().is_empty());
        assert!(channel.last_sent().is_none());
    }
}
