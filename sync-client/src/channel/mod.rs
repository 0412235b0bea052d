//! Envelope channel abstraction.
//!
//! The host and the reader exchange [`Envelope`]s over a bidirectional
//! message channel (a window message port, an IPC pipe, an in-process queue).
//! This module abstracts that channel so the session logic never touches the
//! host's messaging mechanism directly.
//!
//! # Design
//!
//! The channel trait is async and message-oriented:
//! - `send()` posts one envelope to the host
//! - `recv()` waits for the next envelope from the host
//! - `close()` stops the channel; later calls fail with `Closed`
//!
//! # Example
//!
//! ```ignore
//! let channel = MockChannel::new();
//! channel.queue_inbound(envelope);
//! let next = channel.recv().await?;
//! channel.send(&reply).await?;
//! ```

mod local;
mod mock;

pub use local::LocalChannel;
pub use mock::MockChannel;

use async_trait::async_trait;
use reader_sync_types::Envelope;
use thiserror::Error;

/// Channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The peer is gone or was never attached.
    #[error("not connected")]
    NotConnected,

    /// Channel closed.
    #[error("channel closed")]
    Closed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Channel trait for exchanging envelopes with the host.
///
/// Implementations deliver envelopes in the order they were sent.
#[async_trait]
pub trait EnvelopeChannel: Send + Sync {
    /// Post an envelope to the host.
    async fn send(&self, envelope: &Envelope) -> Result<(), ChannelError>;

    /// Receive the next envelope from the host.
    ///
    /// Waits until one is available or the channel closes. Must be cancel
    /// safe: a dropped `recv` future loses no envelope.
    async fn recv(&self) -> Result<Envelope, ChannelError>;

    /// Check if the channel can still carry messages.
    fn is_connected(&self) -> bool;

    /// Close the channel.
    async fn close(&self) -> Result<(), ChannelError>;
}
