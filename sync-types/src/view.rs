//! View state snapshots reported to the host.

use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Sidebar width used when the renderer has not reported one yet.
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 200;

/// Page rotation in clockwise degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    /// Upright
    #[default]
    Deg0,
    /// Quarter turn clockwise
    Deg90,
    /// Upside down
    Deg180,
    /// Quarter turn counter-clockwise
    Deg270,
}

impl TryFrom<u16> for Rotation {
    type Error = SyncError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(SyncError::InvalidRotation(value)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

macro_rules! numbered_mode {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl TryFrom<u8> for $name {
            type Error = SyncError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(SyncError::InvalidMode { kind: $kind, value }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(mode: $name) -> Self {
                mode as u8
            }
        }
    };
}

numbered_mode! {
    /// Sidebar panel. `None` means the sidebar is closed.
    SidebarView, "sidebar" {
        /// Sidebar closed
        None = 0,
        /// Page thumbnails
        Thumbnails = 1,
        /// Document outline
        Outline = 2,
        /// Embedded attachments
        Attachments = 3,
        /// Optional content layers
        Layers = 4,
        /// Annotation list
        Annotations = 5,
    }
}

numbered_mode! {
    /// How pages are laid out along the scroll axis.
    ScrollMode, "scroll" {
        /// One column, vertical scrolling
        Vertical = 0,
        /// One row, horizontal scrolling
        Horizontal = 1,
        /// Pages wrap into rows
        Wrapped = 2,
    }
}

numbered_mode! {
    /// Two-page spread layout.
    SpreadMode, "spread" {
        /// Single pages
        None = 0,
        /// Spreads starting on odd pages
        Odd = 1,
        /// Spreads starting on even pages
        Even = 2,
    }
}

/// Zoom level: a percentage or a named renderer preset (`page-fit`, `auto`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Zoom {
    /// Percentage (100 = actual size)
    Percent(f64),
    /// Named preset
    Preset(String),
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom::Preset("auto".to_string())
    }
}

/// Snapshot of the reader's view, captured from one renderer event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Current page, 0-based
    pub page_index: u32,
    /// Zoom level
    pub scale: Zoom,
    /// Page rotation
    pub rotation: Rotation,
    /// Vertical offset within the page
    pub top: f64,
    /// Horizontal offset within the page
    pub left: f64,
    /// Active sidebar panel (`None` when closed)
    pub sidebar_view: SidebarView,
    /// Sidebar width in pixels
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u32,
    /// Scroll mode
    pub scroll_mode: ScrollMode,
    /// Spread mode
    pub spread_mode: SpreadMode,
}

fn default_sidebar_width() -> u32 {
    DEFAULT_SIDEBAR_WIDTH
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page_index: 0,
            scale: Zoom::default(),
            rotation: Rotation::Deg0,
            top: 0.0,
            left: 0.0,
            sidebar_view: SidebarView::None,
            sidebar_width: DEFAULT_SIDEBAR_WIDTH,
            scroll_mode: ScrollMode::Vertical,
            spread_mode: SpreadMode::None,
        }
    }
}

impl ViewState {
    /// Whether the sidebar is open.
    pub fn sidebar_open(&self) -> bool {
        self.sidebar_view != SidebarView::None
    }

    /// Renderer destination that scrolls back to this state.
    ///
    /// Numeric scales are stored in percent and the renderer expects a
    /// factor, so non-zero percentages are divided by 100.
    pub fn scroll_destination(&self) -> Destination {
        let zoom = match &self.scale {
            Zoom::Percent(percent) if *percent != 0.0 => Zoom::Percent(percent / 100.0),
            other => other.clone(),
        };
        Destination {
            page_number: self.page_index + 1,
            left: self.left,
            top: self.top,
            zoom,
        }
    }
}

/// An "XYZ" destination: page, offsets and zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    /// 1-based page number
    pub page_number: u32,
    /// Horizontal offset
    pub left: f64,
    /// Vertical offset
    pub top: f64,
    /// Zoom factor or preset
    pub zoom: Zoom,
}
