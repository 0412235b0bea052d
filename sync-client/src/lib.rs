//! # sync-client
//!
//! Session runtime for the embedded reader sync protocol.
//!
//! This is the library a host embeds next to its document renderer. It
//! interprets the pure state machines of `sync-core` on a tokio runtime.
//!
//! ## Features
//!
//! - **Single active session**: every `open` replaces the previous session
//! - **Lifecycle gating**: operations wait for both the renderer and the
//!   annotation UI to be ready, and are dropped silently after teardown
//! - **Debounced view state**: bursts of view changes collapse into one
//!   `setState`
//! - **Channel abstraction**: pluggable envelope channel (in-process, mock)
//!
//! ## Example
//!
//! ```ignore
//! use reader_sync_client::{Config, Gateway, LocalChannel, RecordingFactory};
//!
//! let (host, reader) = LocalChannel::pair();
//! let mut gateway = Gateway::new(Arc::new(reader), Arc::new(RecordingFactory::new()), Config::default());
//!
//! // Route host envelopes until the channel closes
//! gateway.run().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod outbox;
pub mod session;
pub mod view;

pub use channel::{ChannelError, EnvelopeChannel, LocalChannel, MockChannel};
pub use config::{Config, ConfigError, DebounceConfig, InputConfig, LoggingConfig};
pub use debounce::DebounceHandle;
pub use error::SessionError;
pub use gateway::{Gateway, IgnoreReason, Received};
pub use lifecycle::LifecycleGate;
pub use logging::LoggingError;
pub use outbox::Outbox;
pub use session::{ClickAnchor, Session};
pub use view::{ReaderView, RecordingFactory, ViewCommand, ViewFactory};
