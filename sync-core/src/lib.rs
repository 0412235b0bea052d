//! # sync-core
//!
//! Pure logic for reader-sync (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms behind an embedded
//! reader session without any channel, timer or UI access, enabling fast unit
//! tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! Time enters as an explicit `now` argument. The actual I/O (message
//! channel, timers, the rendering view) is performed by `sync-client`, which
//! interprets what these modules return.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod debounce;
pub mod keyboard;
pub mod lifecycle;
pub mod menu;
pub mod store;

pub use debounce::{Coalescer, StateDebouncer, DEFAULT_QUIET_WINDOW};
pub use keyboard::{
    dispatch, KeyContext, KeyDispatch, KeyEvent, Modifiers, Platform, ReaderCommand,
};
pub use lifecycle::{LifecycleEvent, LifecycleState};
pub use menu::{menu_action, CursorTool, MenuAction};
pub use store::{AnnotationStore, StoreAction, StoreError, StoreNotice};
