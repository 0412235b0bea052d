//! Annotation store.
//!
//! Canonical in-memory annotation set for one session. Local edits and
//! host-pushed updates are applied in arrival order; each operation returns
//! the actions the caller must carry out:
//! - [`StoreAction::Render`] - hand the current list to the annotation UI
//! - [`StoreAction::Emit`] - send a notification to the host
//!
//! Host-originated operations (`apply_external_*`) never produce an `Emit`,
//! since the host already knows about them.

use reader_sync_types::{Annotation, AnnotationId, AnnotationPatch};
use thiserror::Error;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No annotation with this id.
    #[error("annotation not found: {id}")]
    NotFound {
        /// The missing id.
        id: AnnotationId,
    },
}

/// Notification for the host produced by a local edit.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreNotice {
    /// An annotation was created or updated; carries the full record.
    Set(Annotation),
    /// Annotations were deleted; carries only the ids actually removed.
    Deleted(Vec<AnnotationId>),
}

/// Instructions returned by store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// Re-render the annotation list.
    Render,
    /// Notify the host.
    Emit(StoreNotice),
}

/// Annotation set keyed by id, kept in insertion order.
#[derive(Debug, Default, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the host's initial annotations.
    ///
    /// Later duplicates of an id replace earlier ones.
    pub fn with_annotations(annotations: Vec<Annotation>) -> Self {
        let mut store = Self::new();
        for annotation in annotations {
            store.upsert(annotation);
        }
        store
    }

    /// Local creation. The id is preserved as given.
    pub fn add(&mut self, annotation: Annotation) -> Vec<StoreAction> {
        self.upsert(annotation.clone());
        vec![
            StoreAction::Render,
            StoreAction::Emit(StoreNotice::Set(annotation)),
        ]
    }

    /// Local partial update of an existing annotation.
    pub fn update(&mut self, patch: AnnotationPatch) -> Result<Vec<StoreAction>, StoreError> {
        let index = self.position(&patch.id).ok_or_else(|| StoreError::NotFound {
            id: patch.id.clone(),
        })?;
        let annotation = &mut self.annotations[index];
        annotation.apply(patch);
        let merged = annotation.clone();
        Ok(vec![
            StoreAction::Render,
            StoreAction::Emit(StoreNotice::Set(merged)),
        ])
    }

    /// Local deletion. Absent ids are ignored; removing nothing is silent.
    pub fn delete(&mut self, ids: &[AnnotationId]) -> Vec<StoreAction> {
        let removed = self.remove(ids);
        if removed.is_empty() {
            return Vec::new();
        }
        vec![
            StoreAction::Render,
            StoreAction::Emit(StoreNotice::Deleted(removed)),
        ]
    }

    /// Host-authoritative upsert. No notification is echoed back.
    pub fn apply_external_set(&mut self, annotations: Vec<Annotation>) -> Vec<StoreAction> {
        if annotations.is_empty() {
            return Vec::new();
        }
        for annotation in annotations {
            self.upsert(annotation);
        }
        vec![StoreAction::Render]
    }

    /// Host-authoritative removal. No notification is echoed back.
    pub fn apply_external_unset(&mut self, ids: &[AnnotationId]) -> Vec<StoreAction> {
        if self.remove(ids).is_empty() {
            return Vec::new();
        }
        vec![StoreAction::Render]
    }

    /// Look up an annotation.
    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.id == id)
    }

    /// Check whether an id is present.
    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.position(id).is_some()
    }

    /// All annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    fn position(&self, id: &AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| &a.id == id)
    }

    fn upsert(&mut self, annotation: Annotation) {
        match self.position(&annotation.id) {
            Some(index) => self.annotations[index] = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Remove the given ids, returning the ones that were present (deduplicated,
    /// in request order).
    fn remove(&mut self, ids: &[AnnotationId]) -> Vec<AnnotationId> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(index) = self.position(id) {
                self.annotations.remove(index);
                removed.push(id.clone());
            }
        }
        removed
    }
}
