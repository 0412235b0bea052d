//! Annotation records exchanged with the host.
//!
//! The core never validates annotation content. Geometry is kept opaque and
//! any field the host attaches beyond the ones named here is carried through
//! unchanged in [`Annotation::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AnnotationId;

/// Field names owned by [`Annotation`]; extra host fields never shadow them.
const RESERVED_FIELDS: &[&str] = &[
    "id",
    "type",
    "color",
    "position",
    "comment",
    "tags",
    "readOnly",
    "attachmentItemID",
];

/// Closed set of annotation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Highlighted text range
    Highlight,
    /// Sticky note
    Note,
    /// Image region
    Image,
    /// Freehand drawing
    Ink,
    /// Free text box
    Text,
    /// Underlined text range
    Underline,
}

/// A tag attached to an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag label
    pub name: String,
    /// Optional display color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One annotation as known to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Host-assigned identifier
    pub id: AnnotationId,
    /// Annotation kind
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    /// Display color (e.g. `#ffd400`)
    #[serde(default)]
    pub color: String,
    /// Page plus geometric region, opaque to this crate
    #[serde(default)]
    pub position: Value,
    /// Free-form comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Tag list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// Read-only annotations cannot be edited or deleted from the reader
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    /// Note item the annotation was added to, if any
    #[serde(
        rename = "attachmentItemID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment_item_id: Option<String>,
    /// Host fields not interpreted by the core
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Annotation {
    /// Create an annotation with the required attributes.
    pub fn new(
        id: impl Into<AnnotationId>,
        kind: AnnotationType,
        color: &str,
        position: Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            color: color.to_string(),
            position,
            comment: None,
            tags: Vec::new(),
            read_only: false,
            attachment_item_id: None,
            extra: Map::new(),
        }
    }

    /// Set the comment.
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Mark the annotation read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Merge a partial update into this record.
    ///
    /// Only fields present in the patch change. The id and kind never change.
    pub fn apply(&mut self, patch: AnnotationPatch) {
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(comment) = patch.comment {
            self.comment = Some(comment);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(read_only) = patch.read_only {
            self.read_only = read_only;
        }
        if let Some(item) = patch.attachment_item_id {
            self.attachment_item_id = Some(item);
        }
        for (key, value) in patch.extra {
            if !RESERVED_FIELDS.contains(&key.as_str()) {
                self.extra.insert(key, value);
            }
        }
    }
}

/// Partial annotation used by local updates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPatch {
    /// Target annotation
    pub id: AnnotationId,
    /// New color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
    /// New comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Replacement tag list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    /// New read-only flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    /// New note back-reference
    #[serde(
        rename = "attachmentItemID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment_item_id: Option<String>,
    /// Other host fields to merge
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationPatch {
    /// Start an empty patch for the given annotation.
    pub fn new(id: impl Into<AnnotationId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Change the color.
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Change the comment.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_host_record() {
        let raw = json!({
            "id": "ABCD1234",
            "type": "highlight",
            "color": "#ffd400",
            "position": { "pageIndex": 3, "rects": [[10, 10, 50, 20]] },
            "comment": "look here",
            "tags": [{ "name": "important", "color": "#ff0000" }],
            "readOnly": true,
            "sortIndex": "00003|000120|00100",
        });

        let annotation: Annotation = serde_json::from_value(raw).unwrap();

        assert_eq!(annotation.id, AnnotationId::new("ABCD1234"));
        assert_eq!(annotation.kind, AnnotationType::Highlight);
        assert!(annotation.read_only);
        assert_eq!(annotation.tags.len(), 1);
        assert_eq!(annotation.extra["sortIndex"], json!("00003|000120|00100"));
    }

    #[test]
    fn unknown_fields_survive_reencoding() {
        let raw = json!({
            "id": "a1",
            "type": "note",
            "color": "#2ea8e5",
            "position": { "pageIndex": 0 },
            "dateModified": "2020-01-01T00:00:00Z",
        });
        let annotation: Annotation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&annotation).unwrap(), raw);
    }

    #[test]
    fn rejects_unknown_kind() {
        let raw = json!({ "id": "a1", "type": "squiggle", "color": "" });
        assert!(serde_json::from_value::<Annotation>(raw).is_err());
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut annotation = Annotation::new("a1", AnnotationType::Ink, "#000000", json!({}))
            .with_comment("before");

        annotation.apply(AnnotationPatch::new("a1").color("#ff6666"));

        assert_eq!(annotation.color, "#ff6666");
        assert_eq!(annotation.comment.as_deref(), Some("before"));
        assert_eq!(annotation.kind, AnnotationType::Ink);
    }

    #[test]
    fn patch_extra_cannot_shadow_reserved_fields() {
        let mut annotation = Annotation::new("a1", AnnotationType::Text, "#000000", json!({}));
        let patch: AnnotationPatch = serde_json::from_value(json!({
            "id": "a1",
            "type": "ink",
            "pageLabel": "iv",
        }))
        .unwrap();

        annotation.apply(patch);

        assert_eq!(annotation.kind, AnnotationType::Text);
        assert!(!annotation.extra.contains_key("type"));
        assert_eq!(annotation.extra["pageLabel"], json!("iv"));
    }
}
