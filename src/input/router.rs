//! Routing of normalized input to windows and the built-in hotkeys.

use crate::constants::{MIN_DRAG_SIZE, WHEEL_OPACITY_STEP};
use crate::drivers::Output;
use crate::window::grabs::ImplicitGrab;
use crate::window::{WindowEvent, WindowId, WindowOptions, WindowStack};

use super::hotkeys::{DragMode, Hotkey};
use super::{Axis, AxisMotion, Button, InputEvent, InputKind, KeySymbol, Press};

impl<O: Output> WindowStack<O> {
    /// Feed one normalized input event through the stack.
    pub fn handle_input(&mut self, event: &InputEvent) {
        self.device.absorb(event);
        match event.kind {
            InputKind::Key {
                press: Press::Down,
                symbol,
                code,
                id,
            } => self.key_press(symbol, code, id),
            InputKind::Key {
                press: Press::Up,
                symbol,
                code,
                id,
            } => self.key_release(symbol, code, id),
            InputKind::Button { press, button } => self.button(press, button),
            InputKind::Axis {
                axis,
                motion,
                follow,
            } => self.axis(axis, motion, follow),
        }
    }

    /// Move the cursor to an absolute position.
    pub fn warp_cursor(&mut self, x: i32, y: i32) {
        let (x, y) = self.clamp_to_output(x, y);
        let (dx, dy) = (x - self.cursor.x, y - self.cursor.y);
        self.cursor.x = x;
        self.cursor.y = y;
        if dx == 0 && dy == 0 {
            self.update_hover();
        } else {
            self.motion(dx, dy);
        }
    }

    /// Topmost window accepting input at `(x, y)`.
    ///
    /// With the cursor disabled this is simply the topmost interactive
    /// window. Shaped windows only hit where their surface is not
    /// transparent.
    pub fn window_at(&self, x: i32, y: i32) -> Option<WindowId> {
        let mut candidates = self
            .order
            .iter()
            .rev()
            .filter_map(|id| self.windows.get(id))
            .map(|data| &data.window)
            .filter(|window| window.is_interactive());

        if !self.cursor.enabled {
            return candidates.next().map(|window| window.id);
        }

        candidates
            .find(|window| {
                if !window.bounds.contains(x, y) {
                    return false;
                }
                let shaped = window.options.contains(WindowOptions::SHAPED)
                    && window
                        .options
                        .intersects(WindowOptions::ALPHACHANNEL | WindowOptions::COLORKEYING);
                let Some(surface) = window.surface.filter(|_| shaped) else {
                    return true;
                };
                let (wx, wy) = (x - window.bounds.x, y - window.bounds.y);
                if window.opaque_region.is_some_and(|r| r.contains(wx, wy)) {
                    return true;
                }
                let sx = (wx as i64 * surface.width as i64 / window.bounds.width as i64) as i32;
                let sy = (wy as i64 * surface.height as i64 / window.bounds.height as i64) as i32;
                let Some(raw) = self.output.read_pixel(surface.id, sx, sy) else {
                    return true;
                };
                if window.options.contains(WindowOptions::ALPHACHANNEL)
                    && surface.format.alpha(raw) != 0
                {
                    return true;
                }
                window.options.contains(WindowOptions::COLORKEYING)
                    && surface.format.color_bits(raw) != surface.format.color_bits(window.colorkey)
            })
            .map(|window| window.id)
    }

    fn clamp_to_output(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x.clamp(0, self.bounds.width - 1),
            y.clamp(0, self.bounds.height - 1),
        )
    }

    fn keyboard_target(&self) -> Option<WindowId> {
        self.grabs.keyboard().or(self.focused)
    }

    fn pointer_target(&self) -> Option<WindowId> {
        self.grabs.pointer().or(self.entered)
    }

    fn key_press(&mut self, symbol: KeySymbol, code: Option<u32>, id: Option<u32>) {
        if symbol == self.config.hotkey_trigger {
            self.hotkeys.press_trigger();
            return;
        }
        if self.hotkeys.active()
            && let Some(hotkey) = self.bindings.lookup(symbol)
        {
            if let Some(code) = code {
                self.hotkeys.intercept_key(code);
            }
            self.run_hotkey(hotkey);
            return;
        }

        let info = self.key_info(symbol, code, id);
        if let Some(owner) = self.grabs.key_owner(symbol, self.device.modifiers) {
            self.post(owner, WindowEvent::KeyDown(info));
            return;
        }
        let Some(code) = code else {
            if let Some(target) = self.keyboard_target() {
                self.post(target, WindowEvent::KeyDown(info));
            }
            return;
        };
        if let Some(owner) = self.grabs.implicit_owner(code) {
            // Auto-repeat of a key already bound to a window.
            self.post(owner, WindowEvent::KeyDown(info));
            return;
        }
        let Some(target) = self.keyboard_target() else {
            tracing::trace!(?symbol, "key press with no target");
            return;
        };
        let slot = ImplicitGrab {
            code,
            symbol,
            id,
            owner: target,
        };
        if !self.grabs.track_key(slot) {
            tracing::warn!(?symbol, code, "all implicit key slots in use, dropping press");
            return;
        }
        self.post(target, WindowEvent::KeyDown(info));
    }

    fn key_release(&mut self, symbol: KeySymbol, code: Option<u32>, id: Option<u32>) {
        if symbol == self.config.hotkey_trigger {
            self.hotkeys.release_trigger();
            return;
        }
        let info = self.key_info(symbol, code, id);

        // A scanned release follows its press, whatever the trigger did since.
        if let Some(code) = code {
            if self.hotkeys.take_key(code) {
                return;
            }
            if let Some(slot) = self.grabs.release_key(code) {
                if self.windows.contains_key(&slot.owner) {
                    self.post(slot.owner, WindowEvent::KeyUp(info));
                } else {
                    tracing::trace!(window_id = ?slot.owner, code, "release for vanished window");
                }
                return;
            }
        } else if self.hotkeys.active() && self.bindings.lookup(symbol).is_some() {
            return;
        }

        if let Some(owner) = self.grabs.key_owner(symbol, self.device.modifiers) {
            self.post(owner, WindowEvent::KeyUp(info));
            return;
        }
        match code {
            None => {
                if let Some(target) = self.keyboard_target() {
                    self.post(target, WindowEvent::KeyUp(info));
                }
            }
            Some(code) => tracing::trace!(?symbol, code, "release of untracked key dropped"),
        }
    }

    fn button(&mut self, press: Press, button: Button) {
        if !self.cursor.enabled {
            return;
        }
        match press {
            Press::Down if self.hotkeys.active() => {
                self.hotkeys.intercept_button(button);
                self.start_drag(button);
            }
            Press::Down => {
                let Some(target) = self.pointer_target() else {
                    return;
                };
                if self.grabs.pointer().is_none() && self.focused != Some(target) {
                    self.switch_focus(Some(target));
                }
                let pos = self.pointer_pos(target);
                let buttons = self.device.buttons;
                self.post(
                    target,
                    WindowEvent::ButtonDown {
                        button,
                        buttons,
                        pos,
                    },
                );
            }
            Press::Up => {
                // Releases of intercepted presses never reach a window.
                if self.hotkeys.take_button(button) {
                    if self.hotkeys.drag().started_by(button) {
                        self.hotkeys.set_drag(DragMode::None);
                    }
                    return;
                }
                let Some(target) = self.pointer_target() else {
                    return;
                };
                let pos = self.pointer_pos(target);
                let buttons = self.device.buttons;
                self.post(
                    target,
                    WindowEvent::ButtonUp {
                        button,
                        buttons,
                        pos,
                    },
                );
            }
        }
    }

    fn start_drag(&mut self, button: Button) {
        let Some(target) = self.entered else {
            return;
        };
        let Some(options) = self.window(target).map(|w| w.options) else {
            return;
        };
        if !options.contains(WindowOptions::KEEP_STACKING)
            && let Err(err) = self.raise_to_top(target)
        {
            tracing::warn!(window_id = ?target, %err, "failed to raise window");
        }
        let allowed = match button {
            Button::Left => !options.contains(WindowOptions::KEEP_POSITION),
            Button::Right => !options.contains(WindowOptions::KEEP_SIZE),
            Button::Middle => true,
        };
        if allowed {
            let drag = DragMode::for_button(button, target);
            tracing::debug!(?drag, "drag started");
            self.hotkeys.set_drag(drag);
        }
    }

    fn axis(&mut self, axis: Axis, motion: AxisMotion, follow: bool) {
        match (axis, motion) {
            (Axis::Z, AxisMotion::Relative(step)) => self.wheel(step),
            (Axis::Z, AxisMotion::Absolute(_)) => {}
            (Axis::X, AxisMotion::Relative(d)) => {
                self.pending.dx = self.pending.dx.saturating_add(self.config.accel.apply(d))
            }
            (Axis::Y, AxisMotion::Relative(d)) => {
                self.pending.dy = self.pending.dy.saturating_add(self.config.accel.apply(d))
            }
            (Axis::X, AxisMotion::Absolute(v)) => self.pending.x = Some(v),
            (Axis::Y, AxisMotion::Absolute(v)) => self.pending.y = Some(v),
        }
        if axis != Axis::Z && !follow {
            self.flush_motion();
        }
    }

    fn flush_motion(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let x = pending.x.unwrap_or(self.cursor.x).saturating_add(pending.dx);
        let y = pending.y.unwrap_or(self.cursor.y).saturating_add(pending.dy);
        let (x, y) = self.clamp_to_output(x, y);
        let (dx, dy) = (x - self.cursor.x, y - self.cursor.y);
        if dx == 0 && dy == 0 {
            return;
        }
        self.cursor.x = x;
        self.cursor.y = y;
        self.motion(dx, dy);
    }

    fn motion(&mut self, dx: i32, dy: i32) {
        let result = match self.hotkeys.drag() {
            DragMode::Move(id) => self.move_by(id, dx, dy),
            DragMode::Resize(id) => match self.window(id).map(|w| w.bounds) {
                Some(b) => self.resize(
                    id,
                    b.width.saturating_add(dx).max(MIN_DRAG_SIZE),
                    b.height.saturating_add(dy).max(MIN_DRAG_SIZE),
                ),
                None => Ok(()),
            },
            DragMode::Opacity(id) => match self.window(id).map(|w| w.opacity) {
                Some(opacity) => {
                    let next = (opacity as i32).saturating_sub(dy).clamp(1, 0xff);
                    self.set_opacity(id, next as u8)
                }
                None => Ok(()),
            },
            DragMode::None => {
                if let Some(grab) = self.grabs.pointer() {
                    let pos = self.pointer_pos(grab);
                    self.post(grab, WindowEvent::Motion(pos));
                } else {
                    self.update_hover();
                    if !self.hotkeys.active()
                        && let Some(entered) = self.entered
                    {
                        let pos = self.pointer_pos(entered);
                        self.post(entered, WindowEvent::Motion(pos));
                    }
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!(%err, "drag update failed");
        }
    }

    fn wheel(&mut self, step: i32) {
        if !self.cursor.enabled {
            return;
        }
        if self.hotkeys.active() {
            let Some(target) = self.entered else {
                return;
            };
            let Some(opacity) = self.window(target).map(|w| w.opacity as i32) else {
                return;
            };
            let next = opacity
                .saturating_sub(step.saturating_mul(WHEEL_OPACITY_STEP))
                .clamp(1, 0xff) as u8;
            if let Err(err) = self.set_opacity(target, next) {
                tracing::warn!(window_id = ?target, %err, "wheel opacity change failed");
            }
            return;
        }
        let Some(target) = self.pointer_target() else {
            return;
        };
        let pos = self.pointer_pos(target);
        self.post(target, WindowEvent::Wheel { step, pos });
    }

    fn run_hotkey(&mut self, hotkey: Hotkey) {
        tracing::debug!(%hotkey, "hotkey");
        let result = match hotkey {
            Hotkey::CycleFocus => {
                let candidates: Vec<WindowId> = self
                    .order
                    .iter()
                    .rev()
                    .copied()
                    .filter(|id| self.window(*id).is_some_and(|w| w.is_interactive()))
                    .collect();
                match self.hotkeys.next_cycle(candidates.len()) {
                    0 => Ok(()),
                    n => self.raise_and_focus(candidates[n - 1]),
                }
            }
            Hotkey::NextSibling => self.focus_next_sibling(),
            Hotkey::CloseHovered => {
                if let Some(target) = self.destructible_hovered() {
                    self.post(target, WindowEvent::Close);
                }
                Ok(())
            }
            Hotkey::RefreshHover => {
                self.update_hover();
                Ok(())
            }
            Hotkey::LowerToBottom => match self.restackable_hovered() {
                Some(target) => self.lower_to_bottom(target),
                None => Ok(()),
            },
            Hotkey::RaiseToTop => match self.restackable_hovered() {
                Some(target) => self.raise_to_top(target),
                None => Ok(()),
            },
            Hotkey::DestroyHovered => match self.destructible_hovered() {
                Some(target) => self.destroy_window(target),
                None => Ok(()),
            },
            Hotkey::ReleasePointer => {
                if let Some(owner) = self.grabs.release_pointer() {
                    tracing::debug!(window_id = ?owner, "pointer grab broken by hotkey");
                }
                self.cursor.enabled = true;
                self.update_hover();
                Ok(())
            }
            Hotkey::Screenshot => self.screenshot().map(|path| {
                tracing::info!(path = %path.display(), "screenshot written");
            }),
        };
        if let Err(err) = result {
            tracing::warn!(%hotkey, %err, "hotkey failed");
        }
    }

    fn hovered_without(&self, option: WindowOptions) -> Option<WindowId> {
        self.entered
            .filter(|id| self.window(*id).is_some_and(|w| !w.options.contains(option)))
    }

    fn restackable_hovered(&self) -> Option<WindowId> {
        self.hovered_without(WindowOptions::KEEP_STACKING)
    }

    fn destructible_hovered(&self) -> Option<WindowId> {
        self.hovered_without(WindowOptions::INDESTRUCTIBLE)
    }

    /// Raise and focus the lowest other interactive window of the focused
    /// window's class.
    fn focus_next_sibling(&mut self) -> crate::error::Result<()> {
        let Some(focused) = self.focused else {
            return Ok(());
        };
        let Some(class) = self.window(focused).map(|w| w.stacking) else {
            return Ok(());
        };
        let next = self.order.iter().copied().find(|id| {
            *id != focused
                && self
                    .window(*id)
                    .is_some_and(|w| w.is_interactive() && w.stacking == class)
        });
        match next {
            Some(next) => self.raise_and_focus(next),
            None => Ok(()),
        }
    }

    fn raise_and_focus(&mut self, id: WindowId) -> crate::error::Result<()> {
        if self
            .window(id)
            .is_some_and(|w| !w.options.contains(WindowOptions::KEEP_STACKING))
        {
            self.raise_to_top(id)?;
        }
        self.request_focus(id)
    }

    /// Forcibly hide and remove `id`, then tell its owner.
    fn destroy_window(&mut self, id: WindowId) -> crate::error::Result<()> {
        self.set_opacity(id, 0)?;
        self.remove_window(id)?;
        tracing::debug!(window_id = ?id, "window destroyed by hotkey");
        self.post(id, WindowEvent::Destroyed);
        Ok(())
    }
}
