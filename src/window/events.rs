//! Events the stack posts to windows.

use crate::geometry::Rect;
use crate::input::{Button, Buttons, KeySymbol, Locks, Modifiers};

/// Pointer position attached to pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerPos {
    /// Window-relative.
    pub x: i32,
    pub y: i32,
    /// Cursor position in stack coordinates.
    pub cx: i32,
    pub cy: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub symbol: KeySymbol,
    pub code: Option<u32>,
    pub id: Option<u32>,
    pub modifiers: Modifiers,
    pub locks: Locks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    GotFocus,
    LostFocus,
    Enter(PointerPos),
    Leave(PointerPos),
    Motion(PointerPos),
    ButtonDown {
        button: Button,
        buttons: Buttons,
        pos: PointerPos,
    },
    ButtonUp {
        button: Button,
        buttons: Buttons,
        pos: PointerPos,
    },
    Wheel {
        step: i32,
        pos: PointerPos,
    },
    KeyDown(KeyInfo),
    KeyUp(KeyInfo),
    PositionSize(Rect),
    /// The user asked for the window to be closed.
    Close,
    /// The window was forcibly withdrawn and removed from the stack.
    Destroyed,
}

impl WindowEvent {
    pub fn is_key(&self) -> bool {
        matches!(self, WindowEvent::KeyDown(_) | WindowEvent::KeyUp(_))
    }
}
