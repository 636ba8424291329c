//! Normalized input events as delivered by the input drivers.

pub mod hotkeys;

mod router;

use bitflags::bitflags;

pub use hotkeys::{DragMode, Hotkey, HotkeyBindings, HotkeyState};

/// Key symbol after keymap translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Print,
    Shift,
    Control,
    Alt,
    Meta,
    Super,
    CapsLock,
    Other(u32),
}

impl KeySymbol {
    /// Lower-case form used for hotkey matching.
    pub fn to_lower(self) -> Self {
        match self {
            KeySymbol::Char(c) => KeySymbol::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const ALTGR = 1 << 3;
        const META = 1 << 4;
        const SUPER = 1 << 5;
        const HYPER = 1 << 6;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Locks: u8 {
        const SCROLL = 1 << 0;
        const NUM = 1 << 1;
        const CAPS = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Middle,
}

impl Button {
    pub fn mask(self) -> Buttons {
        match self {
            Button::Left => Buttons::LEFT,
            Button::Right => Buttons::RIGHT,
            Button::Middle => Buttons::MIDDLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    /// Wheel.
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMotion {
    Relative(i32),
    Absolute(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Key {
        press: Press,
        symbol: KeySymbol,
        /// Hardware scan code, absent for synthesized keys.
        code: Option<u32>,
        id: Option<u32>,
    },
    Button {
        press: Press,
        button: Button,
    },
    Axis {
        axis: Axis,
        motion: AxisMotion,
        /// More axis events of the same motion follow.
        follow: bool,
    },
}

/// A normalized input event plus the ambient device state the driver
/// reported with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub modifiers: Option<Modifiers>,
    pub locks: Option<Locks>,
    pub buttons: Option<Buttons>,
}

impl InputEvent {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            modifiers: None,
            locks: None,
            buttons: None,
        }
    }

    pub fn key_down(symbol: KeySymbol, code: Option<u32>) -> Self {
        Self::new(InputKind::Key {
            press: Press::Down,
            symbol,
            code,
            id: None,
        })
    }

    pub fn key_up(symbol: KeySymbol, code: Option<u32>) -> Self {
        Self::new(InputKind::Key {
            press: Press::Up,
            symbol,
            code,
            id: None,
        })
    }

    pub fn button_down(button: Button) -> Self {
        Self::new(InputKind::Button {
            press: Press::Down,
            button,
        })
    }

    pub fn button_up(button: Button) -> Self {
        Self::new(InputKind::Button {
            press: Press::Up,
            button,
        })
    }

    pub fn axis(axis: Axis, motion: AxisMotion) -> Self {
        Self::new(InputKind::Axis {
            axis,
            motion,
            follow: false,
        })
    }

    pub fn following(mut self) -> Self {
        if let InputKind::Axis { follow, .. } = &mut self.kind {
            *follow = true;
        }
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn with_locks(mut self, locks: Locks) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = Some(buttons);
        self
    }
}

/// Aggregated state of all input devices feeding one stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub buttons: Buttons,
    pub modifiers: Modifiers,
    pub locks: Locks,
}

impl DeviceState {
    pub(crate) fn absorb(&mut self, event: &InputEvent) {
        if let Some(modifiers) = event.modifiers {
            self.modifiers = modifiers;
        }
        if let Some(locks) = event.locks {
            self.locks = locks;
        }
        if let Some(buttons) = event.buttons {
            self.buttons = buttons;
        }
        if let InputKind::Button { press, button } = event.kind {
            self.buttons.set(button.mask(), press == Press::Down);
        }
    }
}
