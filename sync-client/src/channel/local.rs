//! In-process channel pair.
//!
//! Two connected endpoints over tokio mpsc queues. Envelopes travel as
//! MessagePack frames, the same bytes a byte-stream transport would carry, so
//! anything that survives this channel survives a real pipe.

use super::{ChannelError, EnvelopeChannel};
use async_trait::async_trait;
use reader_sync_types::Envelope;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{mpsc, watch};

/// One endpoint of an in-process channel.
#[derive(Debug)]
pub struct LocalChannel {
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    closed: watch::Sender<bool>,
}

impl LocalChannel {
    /// Create two connected endpoints: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::endpoint(a_tx, a_rx), Self::endpoint(b_tx, b_rx))
    }

    fn endpoint(
        tx: mpsc::UnboundedSender<Vec<u8>>,
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
            closed,
        }
    }

    fn sender(&self) -> Option<mpsc::UnboundedSender<Vec<u8>>> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EnvelopeChannel for LocalChannel {
    async fn send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        let tx = self.sender().ok_or(ChannelError::Closed)?;
        let frame = envelope
            .to_bytes()
            .map_err(|e| ChannelError::SendFailed(e.to_string()))?;
        tx.send(frame).map_err(|_| ChannelError::NotConnected)
    }

    async fn recv(&self) -> Result<Envelope, ChannelError> {
        let mut closed = self.closed.subscribe();
        let mut rx = self.rx.lock().await;

        let frame = tokio::select! {
            frame = rx.recv() => frame,
            _ = closed.wait_for(|closed| *closed) => None,
        };

        match frame {
            Some(frame) => Envelope::from_bytes(&frame)
                .map_err(|e| ChannelError::ReceiveFailed(e.to_string())),
            None => {
                rx.close();
                Err(ChannelError::Closed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        !*self.closed.borrow()
            && self
                .sender()
                .map(|tx| !tx.is_closed())
                .unwrap_or(false)
    }

    async fn close(&self) -> Result<(), ChannelError> {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // A pending recv holds the receiver; it closes it on wake-up.
        if let Ok(mut rx) = self.rx.try_lock() {
            rx.close();
        }
        self.closed.send_replace(true);
        Ok(())
    }
}
