//! Envelope - the addressed unit that crosses the host/reader boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{InboundMessage, OutboundMessage, SessionId, SyncError};

/// Wraps one protocol message with the session it belongs to.
///
/// The message is kept as a JSON object so that envelopes for actions this
/// side does not understand can still be received, inspected and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Session the message is addressed to (hosts may still send `itemID`)
    #[serde(alias = "itemID")]
    pub session_id: SessionId,
    /// `{action, ...payload}`
    pub message: Value,
}

impl Envelope {
    /// Wrap a raw message object.
    pub fn new(session_id: SessionId, message: Value) -> Self {
        Self {
            session_id,
            message,
        }
    }

    /// Wrap a host-to-reader message.
    pub fn inbound(session_id: SessionId, message: &InboundMessage) -> Result<Self, SyncError> {
        Ok(Self::new(session_id, message.to_value()?))
    }

    /// Wrap a reader-to-host message.
    pub fn outbound(session_id: SessionId, message: &OutboundMessage) -> Result<Self, SyncError> {
        Ok(Self::new(session_id, message.to_value()?))
    }

    /// The `action` field of the message, if present.
    pub fn action(&self) -> Option<&str> {
        self.message.get("action").and_then(Value::as_str)
    }

    /// Decode the message as host-to-reader.
    pub fn decode_inbound(&self) -> Result<InboundMessage, SyncError> {
        InboundMessage::from_value(self.message.clone())
    }

    /// Decode the message as reader-to-host.
    pub fn decode_outbound(&self) -> Result<OutboundMessage, SyncError> {
        OutboundMessage::from_value(self.message.clone())
    }

    /// Serialize to JSON text.
    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to MessagePack bytes, for byte-stream transports.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        rmp_serde::to_vec_named(self).map_err(SyncError::Serialization)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        rmp_serde::from_slice(bytes).map_err(SyncError::Deserialization)
    }
}
