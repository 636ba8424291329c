//! Terminal key events to normalized key presses.
//!
//! Terminals usually report presses only, so every press is followed by a
//! synthesized release. The hotkey trigger is the exception: it latches,
//! one press holds it down and the next one lets it go.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

use crate::input::{InputEvent, KeySymbol, Modifiers};

pub fn symbol_for(code: KeyCode) -> Option<KeySymbol> {
    let symbol = match code {
        KeyCode::Char(c) => KeySymbol::Char(c),
        KeyCode::Enter => KeySymbol::Enter,
        KeyCode::Esc => KeySymbol::Escape,
        KeyCode::Tab | KeyCode::BackTab => KeySymbol::Tab,
        KeyCode::Backspace => KeySymbol::Backspace,
        KeyCode::Delete => KeySymbol::Delete,
        KeyCode::Insert => KeySymbol::Insert,
        KeyCode::Left => KeySymbol::Left,
        KeyCode::Right => KeySymbol::Right,
        KeyCode::Up => KeySymbol::Up,
        KeyCode::Down => KeySymbol::Down,
        KeyCode::Home => KeySymbol::Home,
        KeyCode::End => KeySymbol::End,
        KeyCode::PageUp => KeySymbol::PageUp,
        KeyCode::PageDown => KeySymbol::PageDown,
        KeyCode::F(n) => KeySymbol::F(n),
        KeyCode::PrintScreen => KeySymbol::Print,
        KeyCode::CapsLock => KeySymbol::CapsLock,
        KeyCode::Modifier(m) => match m {
            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift => KeySymbol::Shift,
            ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => KeySymbol::Control,
            ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => KeySymbol::Alt,
            ModifierKeyCode::LeftMeta | ModifierKeyCode::RightMeta => KeySymbol::Meta,
            ModifierKeyCode::LeftSuper | ModifierKeyCode::RightSuper => KeySymbol::Super,
            _ => return None,
        },
        _ => return None,
    };
    Some(symbol)
}

pub fn modifiers_for(mods: KeyModifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::SHIFT, mods.contains(KeyModifiers::SHIFT));
    out.set(Modifiers::CONTROL, mods.contains(KeyModifiers::CONTROL));
    out.set(Modifiers::ALT, mods.contains(KeyModifiers::ALT));
    out.set(Modifiers::META, mods.contains(KeyModifiers::META));
    out.set(Modifiers::SUPER, mods.contains(KeyModifiers::SUPER));
    out.set(Modifiers::HYPER, mods.contains(KeyModifiers::HYPER));
    out
}

#[derive(Debug, Clone)]
pub struct KeyTranslator {
    trigger: KeySymbol,
    latched: bool,
}

impl KeyTranslator {
    pub fn new(trigger: KeySymbol) -> Self {
        Self {
            trigger,
            latched: false,
        }
    }

    pub fn latched(&self) -> bool {
        self.latched
    }

    pub fn translate(&mut self, key: KeyEvent) -> Vec<InputEvent> {
        let Some(symbol) = symbol_for(key.code) else {
            return Vec::new();
        };
        let modifiers = modifiers_for(key.modifiers);
        if symbol == self.trigger {
            if key.kind != KeyEventKind::Press {
                return Vec::new();
            }
            self.latched = !self.latched;
            let event = if self.latched {
                InputEvent::key_down(symbol, None)
            } else {
                InputEvent::key_up(symbol, None)
            };
            return vec![event.with_modifiers(modifiers)];
        }
        match key.kind {
            KeyEventKind::Press => vec![
                InputEvent::key_down(symbol, None).with_modifiers(modifiers),
                InputEvent::key_up(symbol, None).with_modifiers(modifiers),
            ],
            KeyEventKind::Repeat => {
                vec![InputEvent::key_down(symbol, None).with_modifiers(modifiers)]
            }
            // Already synthesized with the press.
            KeyEventKind::Release => Vec::new(),
        }
    }
}
