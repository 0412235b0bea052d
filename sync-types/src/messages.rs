//! Protocol messages for the reader sync protocol.
//!
//! These are the `message` payloads carried inside an [`Envelope`]. Every
//! message is a JSON object whose `action` field names the variant.
//!
//! [`Envelope`]: crate::Envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Annotation, AnnotationId, SyncError, ViewState};

/// Opaque navigation target (page, annotation, position, ...).
///
/// The core only forwards it to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(pub Value);

/// Discriminator for inbound actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundAction {
    /// Start a new session
    Open,
    /// Navigate to a location
    Navigate,
    /// Show or hide the import prompt
    ToggleImportPrompt,
    /// Enable or disable "add to note"
    EnableAddToNote,
    /// Host-authoritative upsert
    SetAnnotations,
    /// Host-authoritative removal
    UnsetAnnotations,
    /// Annotation popup command
    PopupCmd,
    /// Application menu command
    MenuCmd,
    /// Set sidebar width
    SetSidebarWidth,
    /// Open or close the sidebar
    SetSidebarOpen,
    /// Reserve space below the document
    SetBottomPlaceholderHeight,
    /// Reserve space beside the toolbar
    SetToolbarPlaceholderWidth,
    /// Host-side error to present
    Error,
}

impl InboundAction {
    /// Every inbound action, in table order.
    pub const ALL: [InboundAction; 13] = [
        InboundAction::Open,
        InboundAction::Navigate,
        InboundAction::ToggleImportPrompt,
        InboundAction::EnableAddToNote,
        InboundAction::SetAnnotations,
        InboundAction::UnsetAnnotations,
        InboundAction::PopupCmd,
        InboundAction::MenuCmd,
        InboundAction::SetSidebarWidth,
        InboundAction::SetSidebarOpen,
        InboundAction::SetBottomPlaceholderHeight,
        InboundAction::SetToolbarPlaceholderWidth,
        InboundAction::Error,
    ];

    /// Wire name of the action.
    pub fn name(self) -> &'static str {
        match self {
            InboundAction::Open => "open",
            InboundAction::Navigate => "navigate",
            InboundAction::ToggleImportPrompt => "toggleImportPrompt",
            InboundAction::EnableAddToNote => "enableAddToNote",
            InboundAction::SetAnnotations => "setAnnotations",
            InboundAction::UnsetAnnotations => "unsetAnnotations",
            InboundAction::PopupCmd => "popupCmd",
            InboundAction::MenuCmd => "menuCmd",
            InboundAction::SetSidebarWidth => "setSidebarWidth",
            InboundAction::SetSidebarOpen => "setSidebarOpen",
            InboundAction::SetBottomPlaceholderHeight => "setBottomPlaceholderHeight",
            InboundAction::SetToolbarPlaceholderWidth => "setToolbarPlaceholderWidth",
            InboundAction::Error => "error",
        }
    }

    /// Look up an action by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

/// Payload of the `open` action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Open {
    /// Document bytes handed to the renderer
    #[serde(default)]
    pub buf: Vec<u8>,
    /// View state saved from a previous session
    #[serde(default)]
    pub state: Option<ViewState>,
    /// Location to navigate to once ready
    #[serde(default)]
    pub location: Option<Location>,
    /// Initial annotation set
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Whether to show the import prompt
    #[serde(default)]
    pub prompt_import: bool,
    /// Initial sidebar width
    #[serde(default)]
    pub sidebar_width: Option<u32>,
    /// Initial sidebar visibility
    #[serde(default)]
    pub sidebar_open: Option<bool>,
    /// Initial space reserved below the document
    #[serde(default)]
    pub bottom_placeholder_height: Option<u32>,
}

/// Commands available from the annotation popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PopupCommand {
    /// Add the annotation to the current note
    AddToNote,
    /// Delete the annotation
    DeleteAnnotation,
    /// Change the annotation's color
    SetAnnotationColor,
    /// Change the active tool color
    SetColor,
    /// Anything else the host may send
    #[serde(other)]
    Unsupported,
}

/// Payload of the `popupCmd` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupCmd {
    /// Which command
    pub cmd: PopupCommand,
    /// Target annotation, when the command has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,
    /// Color argument, when the command has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Commands from the host application menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuCommand {
    /// Enter presentation mode
    #[serde(rename = "presentationmode")]
    PresentationMode,
    /// Print the document
    #[serde(rename = "print")]
    Print,
    /// Save a copy of the document
    #[serde(rename = "download")]
    Download,
    /// Go to the first page
    #[serde(rename = "firstpage")]
    FirstPage,
    /// Go to the last page
    #[serde(rename = "lastpage")]
    LastPage,
    /// Rotate pages clockwise
    #[serde(rename = "rotatecw")]
    RotateCw,
    /// Rotate pages counter-clockwise
    #[serde(rename = "rotateccw")]
    RotateCcw,
    /// Text selection cursor
    #[serde(rename = "switchcursortool_select")]
    CursorToolSelect,
    /// Hand (panning) cursor
    #[serde(rename = "switchcursortool_hand")]
    CursorToolHand,
    /// Vertical scrolling
    #[serde(rename = "switchscrollmode_vertical")]
    ScrollModeVertical,
    /// Horizontal scrolling
    #[serde(rename = "switchscrollmode_horizontal")]
    ScrollModeHorizontal,
    /// Wrapped scrolling
    #[serde(rename = "switchscrollmode_wrapped")]
    ScrollModeWrapped,
    /// No spreads
    #[serde(rename = "switchspreadmode_none")]
    SpreadModeNone,
    /// Odd spreads
    #[serde(rename = "switchspreadmode_odd")]
    SpreadModeOdd,
    /// Even spreads
    #[serde(rename = "switchspreadmode_even")]
    SpreadModeEven,
    /// Anything else the host may send
    #[serde(other)]
    Unsupported,
}

/// Messages from the host to the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Start a new session, replacing the current one
    Open(Open),
    /// Navigate to a location (guarded)
    Navigate {
        /// Target
        location: Location,
    },
    /// Show or hide the import prompt (guarded)
    ToggleImportPrompt {
        /// New visibility
        enable: bool,
    },
    /// Enable or disable "add to note" (guarded)
    EnableAddToNote {
        /// New availability
        enable: bool,
    },
    /// Upsert host-authoritative annotations
    SetAnnotations {
        /// Records to insert or replace
        annotations: Vec<Annotation>,
    },
    /// Remove annotations on the host's behalf
    UnsetAnnotations {
        /// Ids to remove
        ids: Vec<AnnotationId>,
    },
    /// Annotation popup command
    PopupCmd(PopupCmd),
    /// Application menu command
    MenuCmd {
        /// Which command
        cmd: MenuCommand,
    },
    /// Set sidebar width
    SetSidebarWidth {
        /// Width in pixels
        width: u32,
    },
    /// Open or close the sidebar
    SetSidebarOpen {
        /// New visibility
        open: bool,
    },
    /// Reserve space below the document
    SetBottomPlaceholderHeight {
        /// Height in pixels
        height: u32,
    },
    /// Reserve space beside the toolbar
    SetToolbarPlaceholderWidth {
        /// Width in pixels
        width: u32,
    },
    /// Error to show through the renderer's own error presentation
    Error {
        /// Headline
        message: String,
        /// Details, passed through uninterpreted
        #[serde(rename = "moreInfo", default)]
        more_info: Option<Value>,
    },
}

impl InboundMessage {
    /// The action discriminator of this message.
    pub fn action(&self) -> InboundAction {
        match self {
            InboundMessage::Open(_) => InboundAction::Open,
            InboundMessage::Navigate { .. } => InboundAction::Navigate,
            InboundMessage::ToggleImportPrompt { .. } => InboundAction::ToggleImportPrompt,
            InboundMessage::EnableAddToNote { .. } => InboundAction::EnableAddToNote,
            InboundMessage::SetAnnotations { .. } => InboundAction::SetAnnotations,
            InboundMessage::UnsetAnnotations { .. } => InboundAction::UnsetAnnotations,
            InboundMessage::PopupCmd(_) => InboundAction::PopupCmd,
            InboundMessage::MenuCmd { .. } => InboundAction::MenuCmd,
            InboundMessage::SetSidebarWidth { .. } => InboundAction::SetSidebarWidth,
            InboundMessage::SetSidebarOpen { .. } => InboundAction::SetSidebarOpen,
            InboundMessage::SetBottomPlaceholderHeight { .. } => {
                InboundAction::SetBottomPlaceholderHeight
            }
            InboundMessage::SetToolbarPlaceholderWidth { .. } => {
                InboundAction::SetToolbarPlaceholderWidth
            }
            InboundMessage::Error { .. } => InboundAction::Error,
        }
    }

    /// Decode a message object.
    ///
    /// Distinguishes an action outside the dispatch table
    /// ([`SyncError::UnknownAction`]) from a known action with a malformed
    /// payload ([`SyncError::InvalidData`]).
    pub fn from_value(value: Value) -> Result<Self, SyncError> {
        let name = action_name(&value)?;
        if InboundAction::from_name(&name).is_none() {
            return Err(SyncError::UnknownAction(name));
        }
        serde_json::from_value(value)
            .map_err(|e| SyncError::InvalidData(format!("{}: {}", name, e)))
    }

    /// Encode as a message object.
    pub fn to_value(&self) -> Result<Value, SyncError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Messages from the reader to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Session constructed
    Initialized,
    /// User accepted the import prompt
    Import,
    /// User dismissed the import prompt
    DismissImport,
    /// Add annotations to the current note
    AddToNote {
        /// Annotations to add
        annotations: Vec<Annotation>,
    },
    /// Annotation created or updated locally
    SetAnnotation {
        /// Full merged record
        annotation: Annotation,
    },
    /// Annotations deleted locally
    DeleteAnnotations {
        /// Ids actually removed
        ids: Vec<AnnotationId>,
    },
    /// Debounced view state
    SetState {
        /// Latest snapshot
        state: ViewState,
    },
    /// Open the tag editor at screen coordinates
    OpenTagsPopup {
        /// Annotation being tagged
        id: AnnotationId,
        /// Screen x
        x: f64,
        /// Screen y
        y: f64,
    },
    /// Open an external link
    #[serde(rename = "openURL")]
    OpenUrl {
        /// Target URL
        url: String,
    },
    /// Save the document
    Save,
    /// Sidebar resized by the user
    ChangeSidebarWidth {
        /// Width in pixels
        width: u32,
    },
    /// Sidebar toggled by the user
    ChangeSidebarOpen {
        /// New visibility
        open: bool,
    },
    /// Generic popup request: `{action: name, ...data}`
    #[serde(skip)]
    Popup {
        /// Popup action name
        name: String,
        /// Popup fields, passed through
        data: Map<String, Value>,
    },
}

impl OutboundMessage {
    /// Wire names of the fixed outbound actions.
    const FIXED_ACTIONS: [&'static str; 12] = [
        "initialized",
        "import",
        "dismissImport",
        "addToNote",
        "setAnnotation",
        "deleteAnnotations",
        "setState",
        "openTagsPopup",
        "openURL",
        "save",
        "changeSidebarWidth",
        "changeSidebarOpen",
    ];

    /// Encode as a message object.
    pub fn to_value(&self) -> Result<Value, SyncError> {
        match self {
            OutboundMessage::Popup { name, data } => {
                let mut object = data.clone();
                object.insert("action".to_string(), Value::String(name.clone()));
                Ok(Value::Object(object))
            }
            other => Ok(serde_json::to_value(other)?),
        }
    }

    /// Decode a message object. Unrecognized actions decode as [`OutboundMessage::Popup`].
    pub fn from_value(value: Value) -> Result<Self, SyncError> {
        let name = action_name(&value)?;
        if Self::FIXED_ACTIONS.contains(&name.as_str()) {
            return serde_json::from_value(value)
                .map_err(|e| SyncError::InvalidData(format!("{}: {}", name, e)));
        }
        let mut data = match value {
            Value::Object(object) => object,
            _ => return Err(SyncError::InvalidData("message is not an object".into())),
        };
        data.remove("action");
        Ok(OutboundMessage::Popup { name, data })
    }

    /// Wire name of the action.
    pub fn action_name(&self) -> String {
        match self {
            OutboundMessage::Popup { name, .. } => name.clone(),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|v| v.get("action").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default(),
        }
    }
}

fn action_name(value: &Value) -> Result<String, SyncError> {
    value
        .get("action")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SyncError::InvalidData("message has no action".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_action_name_resolves() {
        for action in InboundAction::ALL {
            assert_eq!(InboundAction::from_name(action.name()), Some(action));
        }
        assert_eq!(InboundAction::from_name("Navigate"), None);
    }

    #[test]
    fn decodes_open_with_defaults() {
        let msg = InboundMessage::from_value(json!({
            "action": "open",
            "annotations": [
                { "id": "a1", "type": "highlight", "color": "#ffd400", "position": {} }
            ],
            "promptImport": true,
            "location": { "pageIndex": 3 },
        }))
        .unwrap();

        match msg {
            InboundMessage::Open(open) => {
                assert_eq!(open.annotations.len(), 1);
                assert!(open.prompt_import);
                assert!(open.state.is_none());
                assert_eq!(open.location, Some(Location(json!({ "pageIndex": 3 }))));
                assert!(open.buf.is_empty());
            }
            other => panic!("expected open, got {:?}", other),
        }
    }

    #[test]
    fn unknown_action_is_distinguished_from_malformed() {
        let unknown = InboundMessage::from_value(json!({ "action": "selfDestruct" }));
        assert!(matches!(unknown, Err(SyncError::UnknownAction(name)) if name == "selfDestruct"));

        let malformed = InboundMessage::from_value(json!({ "action": "navigate" }));
        assert!(matches!(malformed, Err(SyncError::InvalidData(_))));

        let missing = InboundMessage::from_value(json!({ "location": 1 }));
        assert!(matches!(missing, Err(SyncError::InvalidData(_))));
    }

    #[test]
    fn popup_and_menu_commands_tolerate_unknown_values() {
        let msg = InboundMessage::from_value(json!({
            "action": "popupCmd",
            "cmd": "openInNewWindow",
            "id": "a1",
        }))
        .unwrap();
        assert!(matches!(
            msg,
            InboundMessage::PopupCmd(PopupCmd { cmd: PopupCommand::Unsupported, .. })
        ));

        let msg = InboundMessage::from_value(json!({ "action": "menuCmd", "cmd": "zoomauto" }))
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::MenuCmd {
                cmd: MenuCommand::Unsupported
            }
        );
    }

    #[test]
    fn decodes_menu_table_names() {
        let msg = InboundMessage::from_value(json!({
            "action": "menuCmd",
            "cmd": "switchspreadmode_even",
        }))
        .unwrap();
        assert_eq!(msg.action(), InboundAction::MenuCmd);
        assert_eq!(
            msg,
            InboundMessage::MenuCmd {
                cmd: MenuCommand::SpreadModeEven
            }
        );
    }

    #[test]
    fn error_passes_more_info_through() {
        let msg = InboundMessage::from_value(json!({
            "action": "error",
            "message": "Failed to save",
            "moreInfo": { "code": 412 },
        }))
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Error {
                message: "Failed to save".into(),
                more_info: Some(json!({ "code": 412 })),
            }
        );
    }

    #[test]
    fn outbound_uses_host_action_names() {
        let value = OutboundMessage::OpenUrl {
            url: "https://example.org".into(),
        }
        .to_value()
        .unwrap();
        assert_eq!(value, json!({ "action": "openURL", "url": "https://example.org" }));

        let value = OutboundMessage::Initialized.to_value().unwrap();
        assert_eq!(value, json!({ "action": "initialized" }));

        let value = OutboundMessage::DeleteAnnotations {
            ids: vec!["a1".into()],
        }
        .to_value()
        .unwrap();
        assert_eq!(value, json!({ "action": "deleteAnnotations", "ids": ["a1"] }));
    }

    #[test]
    fn popup_spreads_data_next_to_action() {
        let mut data = Map::new();
        data.insert("x".into(), json!(10));
        data.insert("annotation".into(), json!({ "id": "a1" }));
        let popup = OutboundMessage::Popup {
            name: "openAnnotationPopup".into(),
            data,
        };

        let value = popup.to_value().unwrap();
        assert_eq!(value["action"], json!("openAnnotationPopup"));
        assert_eq!(value["x"], json!(10));
        assert_eq!(popup.action_name(), "openAnnotationPopup");

        assert_eq!(OutboundMessage::from_value(value).unwrap(), popup);
    }

    #[test]
    fn fixed_outbound_actions_decode_typed() {
        let msg = OutboundMessage::from_value(json!({ "action": "changeSidebarOpen", "open": true }))
            .unwrap();
        assert_eq!(msg, OutboundMessage::ChangeSidebarOpen { open: true });
        assert_eq!(msg.action_name(), "changeSidebarOpen");
    }
}
