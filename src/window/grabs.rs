//! Exclusive input claims: pointer, keyboard, explicit key combinations and
//! the implicit per-scan-code bindings that keep press/release symmetric.

use crate::constants::MAX_IMPLICIT_KEY_GRABS;
use crate::error::{Result, StackError};
use crate::input::{KeySymbol, Modifiers};

use super::WindowId;

/// A scanned key that is currently held down and routed to `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplicitGrab {
    pub code: u32,
    pub symbol: KeySymbol,
    pub id: Option<u32>,
    pub owner: WindowId,
}

/// An explicit (symbol, modifiers) claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabbedKey {
    pub symbol: KeySymbol,
    pub modifiers: Modifiers,
    pub owner: WindowId,
}

#[derive(Debug, Default)]
pub struct GrabState {
    pointer: Option<WindowId>,
    keyboard: Option<WindowId>,
    implicit: Vec<ImplicitGrab>,
    keys: Vec<GrabbedKey>,
}

impl GrabState {
    pub fn pointer(&self) -> Option<WindowId> {
        self.pointer
    }

    pub fn keyboard(&self) -> Option<WindowId> {
        self.keyboard
    }

    pub fn implicit(&self) -> &[ImplicitGrab] {
        &self.implicit
    }

    pub fn keys(&self) -> &[GrabbedKey] {
        &self.keys
    }

    pub fn grab_pointer(&mut self, owner: WindowId) -> Result<()> {
        if self.pointer.is_some() {
            return Err(StackError::Locked { what: "pointer" });
        }
        self.pointer = Some(owner);
        Ok(())
    }

    pub fn ungrab_pointer(&mut self, owner: WindowId) -> Result<()> {
        if self.pointer != Some(owner) {
            return Err(StackError::not_found(format!(
                "pointer grab of window {}",
                owner.0
            )));
        }
        self.pointer = None;
        Ok(())
    }

    /// Drop the pointer grab whoever holds it.
    pub fn release_pointer(&mut self) -> Option<WindowId> {
        self.pointer.take()
    }

    pub fn grab_keyboard(&mut self, owner: WindowId) -> Result<()> {
        if self.keyboard.is_some() {
            return Err(StackError::Locked { what: "keyboard" });
        }
        self.keyboard = Some(owner);
        Ok(())
    }

    pub fn ungrab_keyboard(&mut self, owner: WindowId) -> Result<()> {
        if self.keyboard != Some(owner) {
            return Err(StackError::not_found(format!(
                "keyboard grab of window {}",
                owner.0
            )));
        }
        self.keyboard = None;
        Ok(())
    }

    /// Claim `symbol` + `modifiers` for `owner`.
    ///
    /// Any implicit binding currently tracking the same symbol is dropped so
    /// its release goes through the new claim.
    pub fn grab_key(
        &mut self,
        owner: WindowId,
        symbol: KeySymbol,
        modifiers: Modifiers,
    ) -> Result<()> {
        if let Some(existing) = self
            .keys
            .iter()
            .find(|key| key.symbol == symbol && key.modifiers == modifiers)
        {
            if existing.owner == owner {
                return Ok(());
            }
            return Err(StackError::Locked { what: "key" });
        }
        self.keys
            .try_reserve(1)
            .map_err(|e| StackError::ResourceExhaustion(e.to_string()))?;
        self.keys.push(GrabbedKey {
            symbol,
            modifiers,
            owner,
        });
        self.implicit.retain(|slot| slot.symbol != symbol);
        Ok(())
    }

    pub fn ungrab_key(
        &mut self,
        owner: WindowId,
        symbol: KeySymbol,
        modifiers: Modifiers,
    ) -> Result<()> {
        let Some(pos) = self.keys.iter().position(|key| {
            key.owner == owner && key.symbol == symbol && key.modifiers == modifiers
        }) else {
            return Err(StackError::not_found(format!(
                "key grab {symbol:?}+{modifiers:?} of window {}",
                owner.0
            )));
        };
        self.keys.remove(pos);
        Ok(())
    }

    pub fn key_owner(&self, symbol: KeySymbol, modifiers: Modifiers) -> Option<WindowId> {
        self.keys
            .iter()
            .find(|key| key.symbol == symbol && key.modifiers == modifiers)
            .map(|key| key.owner)
    }

    pub fn implicit_owner(&self, code: u32) -> Option<WindowId> {
        self.implicit
            .iter()
            .find(|slot| slot.code == code)
            .map(|slot| slot.owner)
    }

    /// Start tracking a pressed key. Returns `false` when every slot is taken.
    pub fn track_key(&mut self, grab: ImplicitGrab) -> bool {
        if self.implicit.len() >= MAX_IMPLICIT_KEY_GRABS {
            return false;
        }
        self.implicit.push(grab);
        true
    }

    /// Stop tracking a released key.
    pub fn release_key(&mut self, code: u32) -> Option<ImplicitGrab> {
        let pos = self.implicit.iter().position(|slot| slot.code == code)?;
        Some(self.implicit.remove(pos))
    }

    /// Clear pointer, keyboard and implicit key claims held by `owner`.
    ///
    /// Returns the implicit bindings that were dropped so the caller can
    /// balance them with key-up events.
    pub fn withdraw(&mut self, owner: WindowId) -> Vec<ImplicitGrab> {
        if self.pointer == Some(owner) {
            self.pointer = None;
        }
        if self.keyboard == Some(owner) {
            self.keyboard = None;
        }
        let (dropped, kept): (Vec<_>, Vec<_>) = self
            .implicit
            .drain(..)
            .partition(|slot| slot.owner == owner);
        self.implicit = kept;
        dropped
    }

    /// Remove every explicit key claim of `owner`.
    pub fn remove_keys_of(&mut self, owner: WindowId) {
        self.keys.retain(|key| key.owner != owner);
    }

    /// Whether any claim still names `owner`.
    pub fn references(&self, owner: WindowId) -> bool {
        self.pointer == Some(owner)
            || self.keyboard == Some(owner)
            || self.implicit.iter().any(|slot| slot.owner == owner)
            || self.keys.iter().any(|key| key.owner == owner)
    }
}
