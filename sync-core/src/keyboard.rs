//! Key event dispatch.
//!
//! Stateless translation of raw key-down events into reader commands. The
//! logical "mod" key is control on Linux/Windows and command on macOS; alt and
//! shift are taken as reported.

use serde::{Deserialize, Serialize};

/// Host operating system, which decides the modifier conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// macOS: command is the primary modifier
    MacOs,
    /// Windows: control is the primary modifier
    Windows,
    /// Linux and other Unix desktops
    Linux,
}

impl Platform {
    /// Platform this crate was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Check for macOS.
    pub fn is_mac(self) -> bool {
        self == Platform::MacOs
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// A raw key-down event as reported by the UI toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Key value (`"f"`, `"["`, `"ArrowLeft"`, `"Escape"`, ...)
    pub key: String,
    /// Control held
    pub ctrl: bool,
    /// Meta (command / windows key) held
    pub meta: bool,
    /// Alt / option held
    pub alt: bool,
    /// Shift held
    pub shift: bool,
    /// Auto-repeat from a held key
    pub repeat: bool,
}

impl KeyEvent {
    /// Unmodified key press.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    /// With control held.
    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// With meta held.
    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// With alt held.
    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// With shift held.
    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Marked as auto-repeat.
    pub fn repeated(mut self) -> Self {
        self.repeat = true;
        self
    }
}

/// Modifier set normalized for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifiers {
    /// Control, as pressed
    pub ctrl: bool,
    /// Command; only ever set on macOS
    pub cmd: bool,
    /// Logical primary modifier (ctrl or cmd)
    pub primary: bool,
    /// Alt / option
    pub alt: bool,
    /// Shift
    pub shift: bool,
}

impl Modifiers {
    /// Normalize the modifiers of an event.
    pub fn normalize(event: &KeyEvent, platform: Platform) -> Self {
        let cmd = event.meta && platform.is_mac();
        Self {
            ctrl: event.ctrl,
            cmd,
            primary: event.ctrl || cmd,
            alt: event.alt,
            shift: event.shift,
        }
    }

    /// No modifier at all.
    pub fn is_empty(&self) -> bool {
        !(self.primary || self.alt || self.shift)
    }
}

/// Where keyboard focus is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// Inside a renderable content view; history navigation is available.
    View,
    /// Anywhere else (sidebar, toolbar, ...).
    General,
}

/// Commands produced by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderCommand {
    /// Go back in navigation history
    NavigateBack,
    /// Go forward in navigation history
    NavigateForward,
    /// Clear selection and overlays, abort printing, refocus the last view
    ClearSelection,
    /// Open the find popup
    ToggleFind,
    /// Print
    Print,
    /// Zoom in
    ZoomIn,
    /// Zoom out
    ZoomOut,
    /// Reset zoom
    ZoomReset,
    /// Delete the selected annotations
    DeleteSelected,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyDispatch {
    /// Commands to run, in order
    pub commands: Vec<ReaderCommand>,
    /// Suppress the default action of the event
    pub prevent_default: bool,
    /// Stop the event from propagating further
    pub stop_propagation: bool,
}

impl KeyDispatch {
    /// Nothing to do.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && !self.prevent_default && !self.stop_propagation
    }

    fn run(&mut self, command: ReaderCommand) {
        self.commands.push(command);
    }
}

/// Translate a key-down event.
pub fn dispatch(event: &KeyEvent, context: KeyContext, platform: Platform) -> KeyDispatch {
    let mut out = KeyDispatch::default();
    if event.repeat {
        return out;
    }

    let mods = Modifiers::normalize(event, platform);
    let key = event.key.as_str();

    match context {
        KeyContext::View => {
            if let Some(command) = history_command(key, &mods, platform) {
                out.run(command);
                out.prevent_default = true;
            }
        }
        KeyContext::General => {
            // Escape must be pressed alone so Option-Escape keeps its system meaning.
            if key == "Escape" && mods.is_empty() {
                out.run(ReaderCommand::ClearSelection);
            }
        }
    }

    if mods.primary {
        let command = match key {
            "f" => Some(ReaderCommand::ToggleFind),
            "p" => Some(ReaderCommand::Print),
            "=" => Some(ReaderCommand::ZoomIn),
            "-" => Some(ReaderCommand::ZoomOut),
            "0" => Some(ReaderCommand::ZoomReset),
            _ => None,
        };
        if let Some(command) = command {
            out.run(command);
            out.prevent_default = true;
            out.stop_propagation |= command == ReaderCommand::Print;
        }
    } else if matches!(key, "Delete" | "Backspace") && mods.is_empty() {
        out.run(ReaderCommand::DeleteSelected);
    }

    out
}

/// Back/forward bindings of the navigable view.
///
/// macOS: command with brackets or arrows. Elsewhere: control with brackets,
/// alt with arrows.
fn history_command(key: &str, mods: &Modifiers, platform: Platform) -> Option<ReaderCommand> {
    let bracket_mod = if platform.is_mac() { mods.cmd } else { mods.ctrl };
    let arrow_mod = if platform.is_mac() { mods.cmd } else { mods.alt };

    match key {
        "[" if bracket_mod => Some(ReaderCommand::NavigateBack),
        "]" if bracket_mod => Some(ReaderCommand::NavigateForward),
        "ArrowLeft" if arrow_mod => Some(ReaderCommand::NavigateBack),
        "ArrowRight" if arrow_mod => Some(ReaderCommand::NavigateForward),
        _ => None,
    }
}
