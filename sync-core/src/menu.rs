//! Host menu command table.
//!
//! Maps the menu command names the host sends onto renderer actions.

use reader_sync_types::{MenuCommand, ScrollMode, SpreadMode};

/// Cursor tool of the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTool {
    /// Text selection
    Select = 0,
    /// Panning
    Hand = 1,
}

/// Renderer action triggered from the host menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Enter presentation mode
    PresentationMode,
    /// Print
    Print,
    /// Save a copy
    Download,
    /// Go to the first page
    FirstPage,
    /// Go to the last page
    LastPage,
    /// Rotate by +90 degrees
    RotateClockwise,
    /// Rotate by -90 degrees
    RotateCounterClockwise,
    /// Switch cursor tool
    CursorTool(CursorTool),
    /// Switch scroll mode
    ScrollMode(ScrollMode),
    /// Switch spread mode
    SpreadMode(SpreadMode),
}

/// Look up the action for a menu command. `None` for unsupported commands.
pub fn menu_action(cmd: MenuCommand) -> Option<MenuAction> {
    let action = match cmd {
        MenuCommand::PresentationMode => MenuAction::PresentationMode,
        MenuCommand::Print => MenuAction::Print,
        MenuCommand::Download => MenuAction::Download,
        MenuCommand::FirstPage => MenuAction::FirstPage,
        MenuCommand::LastPage => MenuAction::LastPage,
        MenuCommand::RotateCw => MenuAction::RotateClockwise,
        MenuCommand::RotateCcw => MenuAction::RotateCounterClockwise,
        MenuCommand::CursorToolSelect => MenuAction::CursorTool(CursorTool::Select),
        MenuCommand::CursorToolHand => MenuAction::CursorTool(CursorTool::Hand),
        MenuCommand::ScrollModeVertical => MenuAction::ScrollMode(ScrollMode::Vertical),
        MenuCommand::ScrollModeHorizontal => MenuAction::ScrollMode(ScrollMode::Horizontal),
        MenuCommand::ScrollModeWrapped => MenuAction::ScrollMode(ScrollMode::Wrapped),
        MenuCommand::SpreadModeNone => MenuAction::SpreadMode(SpreadMode::None),
        MenuCommand::SpreadModeOdd => MenuAction::SpreadMode(SpreadMode::Odd),
        MenuCommand::SpreadModeEven => MenuAction::SpreadMode(SpreadMode::Even),
        MenuCommand::Unsupported => return None,
    };
    Some(action)
}
