//! Session error types.

use reader_sync_core::StoreError;
use thiserror::Error;

use crate::channel::ChannelError;

/// Errors from local session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The annotation store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The resulting message could not be delivered.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}
