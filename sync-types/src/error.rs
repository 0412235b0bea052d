//! Error types for the reader sync protocol.

use thiserror::Error;

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, Error)]
pub enum SyncError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound action is not part of the dispatch table
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// Invalid data format
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Rotation outside 0/90/180/270
    #[error("invalid rotation: {0}")]
    InvalidRotation(u16),

    /// Unknown sidebar, scroll or spread mode discriminator
    #[error("invalid {kind} mode: {value}")]
    InvalidMode {
        /// Which mode family was being decoded.
        kind: &'static str,
        /// The rejected discriminator.
        value: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::UnknownAction("frobnicate".into());
        assert_eq!(err.to_string(), "unknown action: frobnicate");

        let err = SyncError::InvalidMode {
            kind: "scroll",
            value: 9,
        };
        assert_eq!(err.to_string(), "invalid scroll mode: 9");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncError>();
    }
}
