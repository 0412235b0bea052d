//! # sync-types
//!
//! Wire format types for the embedded reader sync protocol.
//!
//! This crate provides the foundational types shared by the reader-sync crates:
//! - [`SessionId`], [`AnnotationId`] - Identity types
//! - [`Annotation`], [`AnnotationPatch`] - Annotation records and partial updates
//! - [`ViewState`] - View snapshots reported to the host
//! - [`Envelope`] - Message wrapper addressed to one session
//! - [`InboundMessage`], [`OutboundMessage`] - Protocol actions in each direction
//! - [`SyncError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod annotation;
mod envelope;
mod error;
mod ids;
mod messages;
mod view;

pub use annotation::{Annotation, AnnotationPatch, AnnotationType, Tag};
pub use envelope::Envelope;
pub use error::SyncError;
pub use ids::{AnnotationId, SessionId};
pub use messages::{
    InboundAction, InboundMessage, Location, MenuCommand, Open, OutboundMessage, PopupCmd,
    PopupCommand,
};
pub use view::{
    Destination, Rotation, ScrollMode, SidebarView, SpreadMode, ViewState, Zoom,
    DEFAULT_SIDEBAR_WIDTH,
};
