use std::collections::HashMap;
use std::fmt;

use super::{Button, Buttons, KeySymbol};
use crate::constants::MAX_IMPLICIT_KEY_GRABS;
use crate::window::WindowId;

/// Window-manager actions reachable while the hotkey trigger is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hotkey {
    CycleFocus,
    NextSibling,
    CloseHovered,
    RefreshHover,
    LowerToBottom,
    RaiseToTop,
    DestroyHovered,
    ReleasePointer,
    Screenshot,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Hotkey::CycleFocus => "Cycle focus",
            Hotkey::NextSibling => "Next window in layer",
            Hotkey::CloseHovered => "Close hovered window",
            Hotkey::RefreshHover => "Refresh hovered window",
            Hotkey::LowerToBottom => "Lower hovered window to bottom",
            Hotkey::RaiseToTop => "Raise hovered window to top",
            Hotkey::DestroyHovered => "Destroy hovered window",
            Hotkey::ReleasePointer => "Enable cursor and release pointer grab",
            Hotkey::Screenshot => "Screenshot",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct HotkeyBindings {
    map: HashMap<KeySymbol, Hotkey>,
}

impl HotkeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn add(&mut self, symbol: KeySymbol, hotkey: Hotkey) {
        self.map.insert(symbol.to_lower(), hotkey);
    }

    pub fn lookup(&self, symbol: KeySymbol) -> Option<Hotkey> {
        self.map.get(&symbol.to_lower()).copied()
    }

    /// Bindings sorted for display.
    pub fn entries(&self) -> Vec<(KeySymbol, Hotkey)> {
        let mut entries: Vec<_> = self.map.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(_, hotkey)| *hotkey as u8);
        entries
    }
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        use Hotkey::*;
        let mut kb = Self::new();
        kb.add(KeySymbol::Char('x'), CycleFocus);
        kb.add(KeySymbol::Char('s'), NextSibling);
        kb.add(KeySymbol::Char('c'), CloseHovered);
        kb.add(KeySymbol::Char('e'), RefreshHover);
        kb.add(KeySymbol::Char('a'), LowerToBottom);
        kb.add(KeySymbol::Char('w'), RaiseToTop);
        kb.add(KeySymbol::Char('d'), DestroyHovered);
        kb.add(KeySymbol::Char('p'), ReleasePointer);
        kb.add(KeySymbol::Print, Screenshot);
        kb
    }
}

/// What pointer motion does while the hotkey trigger is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    None,
    Move(WindowId),
    Resize(WindowId),
    Opacity(WindowId),
}

impl DragMode {
    pub fn target(self) -> Option<WindowId> {
        match self {
            DragMode::None => None,
            DragMode::Move(id) | DragMode::Resize(id) | DragMode::Opacity(id) => Some(id),
        }
    }

    /// The drag a trigger+button press starts on `window`.
    pub(crate) fn for_button(button: Button, window: WindowId) -> Self {
        match button {
            Button::Left => DragMode::Move(window),
            Button::Right => DragMode::Resize(window),
            Button::Middle => DragMode::Opacity(window),
        }
    }

    pub(crate) fn started_by(self, button: Button) -> bool {
        matches!(
            (self, button),
            (DragMode::Move(_), Button::Left)
                | (DragMode::Resize(_), Button::Right)
                | (DragMode::Opacity(_), Button::Middle)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct HotkeyState {
    trigger_held: bool,
    drag: DragMode,
    cycle: usize,
    /// Scan codes whose press was taken by a hotkey; their release is
    /// swallowed whenever it arrives.
    held_keys: Vec<u32>,
    /// Buttons whose press started (or tried to start) a drag.
    held_buttons: Buttons,
}

impl HotkeyState {
    pub fn active(&self) -> bool {
        self.trigger_held
    }

    pub fn drag(&self) -> DragMode {
        self.drag
    }

    pub(crate) fn press_trigger(&mut self) {
        self.trigger_held = true;
    }

    pub(crate) fn release_trigger(&mut self) {
        self.trigger_held = false;
        self.drag = DragMode::None;
    }

    pub(crate) fn set_drag(&mut self, drag: DragMode) {
        self.drag = drag;
    }

    /// Cancel a drag on `window`, e.g. because it went away.
    pub(crate) fn cancel_drag_of(&mut self, window: WindowId) {
        if self.drag.target() == Some(window) {
            self.drag = DragMode::None;
        }
    }

    /// Remember that the press of `code` was consumed by a hotkey.
    pub(crate) fn intercept_key(&mut self, code: u32) {
        if self.held_keys.contains(&code) {
            return;
        }
        if self.held_keys.len() >= MAX_IMPLICIT_KEY_GRABS {
            tracing::warn!(code, "too many intercepted keys held, forgetting the oldest");
            self.held_keys.remove(0);
        }
        self.held_keys.push(code);
    }

    /// Whether the release of `code` belongs to an intercepted press.
    /// Forgets the press either way.
    pub(crate) fn take_key(&mut self, code: u32) -> bool {
        let Some(pos) = self.held_keys.iter().position(|held| *held == code) else {
            return false;
        };
        self.held_keys.remove(pos);
        true
    }

    pub(crate) fn intercept_button(&mut self, button: Button) {
        self.held_buttons.insert(button.mask());
    }

    pub(crate) fn take_button(&mut self, button: Button) -> bool {
        let held = self.held_buttons.contains(button.mask());
        self.held_buttons.remove(button.mask());
        held
    }

    /// Advance the focus-cycle counter and return its new value (1-based).
    pub(crate) fn next_cycle(&mut self, count: usize) -> usize {
        if count == 0 {
            self.cycle = 0;
            return 0;
        }
        self.cycle = self.cycle % count + 1;
        self.cycle
    }
}
