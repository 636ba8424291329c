use std::collections::BTreeMap;
use std::ops::ControlFlow;

use crate::config::StackConfig;
use crate::drivers::{FlipFlags, Output};
use crate::error::{Result, StackError};
use crate::geometry::Rect;
use crate::input::hotkeys::HotkeyBindings;
use crate::input::{DeviceState, HotkeyState};
use crate::layout::{NodeId, RegionClass, RegionFlags, RegionTree};

use super::events::{KeyInfo, PointerPos, WindowEvent};
use super::grabs::GrabState;
use super::{LayerConfig, StackingClass, Window, WindowData, WindowId, WindowOptions, priority};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) enabled: bool,
}

/// Axis values collected while drivers announce more events of one motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PendingMotion {
    pub(crate) dx: i32,
    pub(crate) dy: i32,
    pub(crate) x: Option<i32>,
    pub(crate) y: Option<i32>,
}

/// The ordered set of windows on one output, plus the focus, hover, grab
/// and hotkey state that goes with them.
///
/// `order` runs bottom to top and mirrors the children of the root region.
/// Priorities never decrease along it.
pub struct WindowStack<O: Output> {
    pub(crate) config: StackConfig,
    pub(crate) bounds: Rect,
    pub(crate) output: O,
    pub(crate) tree: RegionTree,
    pub(crate) root: NodeId,
    pub(crate) windows: BTreeMap<WindowId, WindowData>,
    pub(crate) order: Vec<WindowId>,
    pub(crate) device: DeviceState,
    pub(crate) grabs: GrabState,
    pub(crate) focused: Option<WindowId>,
    pub(crate) entered: Option<WindowId>,
    pub(crate) hotkeys: HotkeyState,
    pub(crate) bindings: HotkeyBindings,
    pub(crate) cursor: Cursor,
    pub(crate) pending: PendingMotion,
}

impl<O: Output> WindowStack<O> {
    pub fn new(config: StackConfig, output: O) -> Result<Self> {
        config.validate()?;
        let bounds = Rect::sized(config.width, config.height);
        let mut tree = RegionTree::new(config.max_regions);
        let root = tree.create(
            RegionClass::Background,
            RegionFlags::ACTIVE | RegionFlags::OUTPUT | RegionFlags::INPUT,
            bounds,
            None,
        )?;
        let cursor = Cursor {
            x: bounds.width / 2,
            y: bounds.height / 2,
            enabled: config.cursor_enabled,
        };
        tracing::debug!(width = bounds.width, height = bounds.height, "window stack created");
        Ok(Self {
            config,
            bounds,
            output,
            tree,
            root,
            windows: BTreeMap::new(),
            order: Vec::new(),
            device: DeviceState::default(),
            grabs: GrabState::default(),
            focused: None,
            entered: None,
            hotkeys: HotkeyState::default(),
            bindings: HotkeyBindings::default(),
            cursor,
            pending: PendingMotion::default(),
        })
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn bindings_mut(&mut self) -> &mut HotkeyBindings {
        &mut self.bindings
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id).map(|data| &data.window)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Window ids bottom to top.
    pub fn order(&self) -> &[WindowId] {
        &self.order
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn entered(&self) -> Option<WindowId> {
        self.entered
    }

    pub fn grabs(&self) -> &GrabState {
        &self.grabs
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn hotkeys(&self) -> &HotkeyState {
        &self.hotkeys
    }

    pub fn cursor_position(&self) -> (i32, i32) {
        (self.cursor.x, self.cursor.y)
    }

    pub fn cursor_enabled(&self) -> bool {
        self.cursor.enabled
    }

    /// Visit windows top to bottom until `f` breaks.
    pub fn enum_windows<F>(&self, mut f: F)
    where
        F: FnMut(&Window) -> ControlFlow<()>,
    {
        for id in self.order.iter().rev() {
            if let Some(data) = self.windows.get(id)
                && f(&data.window).is_break()
            {
                break;
            }
        }
    }

    pub(crate) fn priority_of(&self, id: WindowId) -> i32 {
        self.windows.get(&id).map_or(0, |data| data.priority)
    }

    fn data(&self, id: WindowId) -> Result<&WindowData> {
        self.windows
            .get(&id)
            .ok_or_else(|| StackError::not_found(format!("window {}", id.0)))
    }

    fn data_mut(&mut self, id: WindowId) -> Result<&mut WindowData> {
        self.windows
            .get_mut(&id)
            .ok_or_else(|| StackError::not_found(format!("window {}", id.0)))
    }

    pub(crate) fn post(&mut self, id: WindowId, event: WindowEvent) {
        tracing::trace!(window_id = ?id, ?event, "post event");
        self.output.post_event(id, event);
    }

    pub(crate) fn pointer_pos(&self, id: WindowId) -> PointerPos {
        let (x, y) = self
            .window(id)
            .map_or((0, 0), |w| (w.bounds.x, w.bounds.y));
        PointerPos {
            x: self.cursor.x - x,
            y: self.cursor.y - y,
            cx: self.cursor.x,
            cy: self.cursor.y,
        }
    }

    pub(crate) fn key_info(
        &self,
        symbol: crate::input::KeySymbol,
        code: Option<u32>,
        id: Option<u32>,
    ) -> KeyInfo {
        KeyInfo {
            symbol,
            code,
            id,
            modifiers: self.device.modifiers,
            locks: self.device.locks,
        }
    }

    fn coerce_opacity(&self, opacity: u8) -> u8 {
        if !self.config.translucency && opacity > 0 {
            0xff
        } else {
            opacity
        }
    }

    fn region_flags(window: &Window) -> RegionFlags {
        let mut flags = RegionFlags::empty();
        flags.set(RegionFlags::INPUT, !window.is_ghost());
        flags.set(
            RegionFlags::OUTPUT,
            !window.is_input_only() && window.layer.is_none(),
        );
        flags.set(
            RegionFlags::SHAPED,
            window.options.contains(WindowOptions::SHAPED),
        );
        flags.set(RegionFlags::OPAQUE, window.is_opaque());
        flags.set(RegionFlags::ACTIVE, window.is_visible());
        flags
    }

    fn sync_region_flags(&mut self, id: WindowId) {
        let Some(data) = self.windows.get(&id) else {
            return;
        };
        let (node, wanted) = (data.region, Self::region_flags(&data.window));
        self.tree.set_flags(node, RegionFlags::all(), false);
        self.tree.set_flags(node, wanted, true);
    }

    /// Insert `window` at the top of its priority band.
    pub fn add_window(&mut self, mut window: Window) -> Result<()> {
        let id = window.id;
        if self.windows.contains_key(&id) {
            return Err(StackError::invalid(format!("window {} already added", id.0)));
        }
        if window.bounds.is_empty() {
            return Err(StackError::invalid(format!(
                "window {} has empty bounds {:?}",
                id.0, window.bounds
            )));
        }
        if window.surface.is_none() && !window.is_input_only() && window.layer.is_none() {
            return Err(StackError::invalid(format!(
                "window {} has neither a surface nor a layer",
                id.0
            )));
        }
        window.opacity = self.coerce_opacity(window.opacity);

        let node = self.tree.create(
            RegionClass::Window(id),
            Self::region_flags(&window),
            window.bounds,
            Some(self.root),
        )?;
        let data = WindowData::new(window, node);
        let index = self
            .order
            .iter()
            .position(|other| self.priority_of(*other) > data.priority)
            .unwrap_or(self.order.len());
        let visible = data.window.is_visible();
        let has_layer = data.window.layer.is_some();
        self.tree.restack(node, index);
        self.order.insert(index, id);
        self.windows.insert(id, data);
        tracing::debug!(window_id = ?id, index, "window added");

        if has_layer {
            self.push_layer_config(id);
        }
        if visible {
            self.update_window(id, None, FlipFlags::empty(), false, false);
            self.update_hover();
            self.ensure_focus();
        }
        Ok(())
    }

    /// Take `id` out of the stack. It must have been hidden first.
    pub fn remove_window(&mut self, id: WindowId) -> Result<()> {
        let opacity = self.data(id)?.window.opacity;
        if opacity != 0 {
            return Err(StackError::invalid(format!(
                "window {} is still visible (opacity {opacity})",
                id.0
            )));
        }
        self.withdraw(id);
        self.grabs.remove_keys_of(id);
        self.order.retain(|other| *other != id);
        if let Some(data) = self.windows.remove(&id) {
            self.tree.destroy(data.region);
        }
        tracing::debug!(window_id = ?id, "window removed");
        Ok(())
    }

    /// Drop every reference the stack's input state holds to `id`.
    ///
    /// Keys still held down for it get a synthesized release so the owner
    /// never sees a press without its matching release.
    pub(crate) fn withdraw(&mut self, id: WindowId) {
        for slot in self.grabs.withdraw(id) {
            let info = self.key_info(slot.symbol, Some(slot.code), slot.id);
            self.post(id, WindowEvent::KeyUp(info));
        }
        if self.entered == Some(id) {
            self.entered = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
            self.post(id, WindowEvent::LostFocus);
        }
        self.hotkeys.cancel_drag_of(id);
    }

    pub fn set_opacity(&mut self, id: WindowId, opacity: u8) -> Result<()> {
        let opacity = self.coerce_opacity(opacity);
        let data = self.data_mut(id)?;
        let old = data.window.opacity;
        if old == opacity {
            return Ok(());
        }
        data.window.opacity = opacity;
        let has_layer = data.window.layer.is_some();
        self.sync_region_flags(id);
        if has_layer {
            self.push_layer_config(id);
        }

        if old == 0 {
            tracing::debug!(window_id = ?id, opacity, "window shown");
            self.update_window(id, None, FlipFlags::empty(), false, false);
            self.update_hover();
            self.ensure_focus();
        } else if opacity == 0 {
            tracing::debug!(window_id = ?id, "window hidden");
            self.update_window(id, None, FlipFlags::empty(), true, true);
            self.withdraw(id);
            self.update_hover();
            self.ensure_focus();
        } else {
            self.update_window(id, None, FlipFlags::empty(), false, false);
        }
        Ok(())
    }

    /// Move `id` relative to `relative` (or to an end of its band).
    ///
    /// `relation` > 0 places it above, < 0 below and 0 at the relative
    /// window's index. Without a relative window a positive relation raises
    /// to the top and anything else lowers to the bottom. The final index is
    /// clamped into the band of `stacking`, which also becomes the window's
    /// class. The relative window must be another window of this stack.
    pub fn restack(
        &mut self,
        id: WindowId,
        relative: Option<WindowId>,
        relation: i32,
        stacking: StackingClass,
    ) -> Result<()> {
        self.data(id)?;
        if let Some(rel) = relative {
            if rel == id {
                return Err(StackError::invalid(format!(
                    "window {} cannot be restacked relative to itself",
                    id.0
                )));
            }
            self.data(rel)?;
        }
        self.restack_unchecked(id, relative, relation, stacking)
    }

    /// Apply `stacking` and move `id`; `relative` may be `id` itself to keep
    /// the current index as far as the band allows.
    fn restack_unchecked(
        &mut self,
        id: WindowId,
        relative: Option<WindowId>,
        relation: i32,
        stacking: StackingClass,
    ) -> Result<()> {
        let old = self
            .order
            .iter()
            .position(|other| *other == id)
            .ok_or_else(|| StackError::not_found(format!("window {} in order", id.0)))?;

        let data = self.data_mut(id)?;
        let class_changed = data.window.stacking != stacking;
        if class_changed {
            data.window.stacking = stacking;
            data.priority = priority(stacking, data.window.topmost);
        }
        self.reposition(id, old, relative, relation, class_changed)
    }

    fn reposition(
        &mut self,
        id: WindowId,
        old: usize,
        relative: Option<WindowId>,
        relation: i32,
        changed: bool,
    ) -> Result<()> {
        let prio = self.priority_of(id);
        let mut rest = self.order.clone();
        rest.remove(old);

        let raw = match relative {
            Some(rel) if rel == id => old,
            Some(rel) => {
                let rel_index = self
                    .order
                    .iter()
                    .position(|other| *other == rel)
                    .unwrap_or(old);
                let below_rel = usize::from(old < rel_index);
                let in_rest = rel_index - below_rel;
                match relation.signum() {
                    1 => in_rest + 1,
                    -1 => in_rest,
                    _ => in_rest + below_rel,
                }
            }
            None if relation > 0 => rest.len(),
            None => 0,
        };

        let mut index = raw.min(rest.len());
        while index > 0 && prio < self.priority_of(rest[index - 1]) {
            index -= 1;
        }
        while index < rest.len() && prio > self.priority_of(rest[index]) {
            index += 1;
        }

        if index == old {
            if changed {
                tracing::debug!(window_id = ?id, "priority changed in place");
            }
            return Ok(());
        }
        let node = self.data(id)?.region;
        self.order.remove(old);
        self.order.insert(index, id);
        self.tree.restack(node, index);
        tracing::debug!(window_id = ?id, from = old, to = index, "window restacked");

        self.update_window(id, None, FlipFlags::empty(), true, false);
        self.update_hover();
        Ok(())
    }

    fn current_stacking(&self, id: WindowId) -> Result<StackingClass> {
        Ok(self.data(id)?.window.stacking)
    }

    pub fn raise_to_top(&mut self, id: WindowId) -> Result<()> {
        let stacking = self.current_stacking(id)?;
        self.restack(id, None, 1, stacking)
    }

    pub fn lower_to_bottom(&mut self, id: WindowId) -> Result<()> {
        let stacking = self.current_stacking(id)?;
        self.restack(id, None, -1, stacking)
    }

    pub fn put_atop(&mut self, id: WindowId, lower: WindowId) -> Result<()> {
        let stacking = self.current_stacking(id)?;
        self.restack(id, Some(lower), 1, stacking)
    }

    pub fn put_below(&mut self, id: WindowId, upper: WindowId) -> Result<()> {
        let stacking = self.current_stacking(id)?;
        self.restack(id, Some(upper), -1, stacking)
    }

    /// Change the class while keeping the position as far as the new band
    /// allows.
    pub fn set_stacking(&mut self, id: WindowId, stacking: StackingClass) -> Result<()> {
        self.data(id)?;
        self.restack_unchecked(id, Some(id), 0, stacking)
    }

    pub fn set_topmost(&mut self, id: WindowId, topmost: bool) -> Result<()> {
        let data = self.data_mut(id)?;
        if data.window.topmost == topmost {
            return Ok(());
        }
        data.window.topmost = topmost;
        data.priority = priority(data.window.stacking, topmost);
        let old = self
            .order
            .iter()
            .position(|other| *other == id)
            .unwrap_or_default();
        self.reposition(id, old, Some(id), 0, true)
    }

    pub fn move_by(&mut self, id: WindowId, dx: i32, dy: i32) -> Result<()> {
        let bounds = self.data(id)?.window.bounds;
        self.set_bounds(id, bounds.translate(dx, dy))
    }

    pub fn move_to(&mut self, id: WindowId, x: i32, y: i32) -> Result<()> {
        let bounds = self.data(id)?.window.bounds;
        self.set_bounds(id, Rect::new(x, y, bounds.width, bounds.height))
    }

    pub fn resize(&mut self, id: WindowId, width: i32, height: i32) -> Result<()> {
        let bounds = self.data(id)?.window.bounds;
        self.set_bounds(id, Rect::new(bounds.x, bounds.y, width, height))
    }

    /// Change geometry, repainting the window and whatever it uncovered.
    pub fn set_bounds(&mut self, id: WindowId, bounds: Rect) -> Result<()> {
        if bounds.is_empty() {
            return Err(StackError::invalid(format!(
                "window {} resized to empty {bounds:?}",
                id.0
            )));
        }
        let data = self.data_mut(id)?;
        let old = data.window.bounds;
        if old == bounds {
            return Ok(());
        }
        data.window.bounds = bounds;
        let (node, visible, has_layer) = (
            data.region,
            data.window.is_visible(),
            data.window.layer.is_some(),
        );
        self.tree.move_to(node, bounds.x, bounds.y);
        self.tree.resize(node, bounds.width, bounds.height);
        tracing::trace!(window_id = ?id, ?old, new = ?bounds, "window geometry changed");
        self.post(id, WindowEvent::PositionSize(bounds));

        if has_layer {
            self.push_layer_config(id);
        } else if visible {
            self.update_window(id, None, FlipFlags::empty(), false, false);
            let exposed = old.subtract(&bounds);
            if !exposed.is_empty() {
                self.repaint(&exposed, FlipFlags::empty());
            }
        }
        if visible {
            self.update_hover();
        }
        Ok(())
    }

    pub fn set_options(&mut self, id: WindowId, options: WindowOptions) -> Result<()> {
        let data = self.data_mut(id)?;
        if data.window.options == options {
            return Ok(());
        }
        data.window.options = options;
        let (visible, ghost) = (data.window.is_visible(), data.window.is_ghost());
        self.sync_region_flags(id);
        if ghost && self.focused == Some(id) {
            self.focused = None;
            self.post(id, WindowEvent::LostFocus);
        }
        if visible {
            self.update_window(id, None, FlipFlags::empty(), true, false);
            self.update_hover();
            self.ensure_focus();
        }
        Ok(())
    }

    pub fn set_colorkey(&mut self, id: WindowId, colorkey: u32) -> Result<()> {
        let data = self.data_mut(id)?;
        if data.window.colorkey == colorkey {
            return Ok(());
        }
        data.window.colorkey = colorkey;
        if data.window.is_visible() && data.window.options.contains(WindowOptions::COLORKEYING) {
            self.update_window(id, None, FlipFlags::empty(), true, false);
        }
        Ok(())
    }

    /// Window-relative area that always hits for shaped windows.
    pub fn set_opaque_region(&mut self, id: WindowId, region: Option<Rect>) -> Result<()> {
        self.data_mut(id)?.window.opaque_region = region;
        Ok(())
    }

    /// Push the window's geometry and opacity to its hardware layer.
    pub(crate) fn push_layer_config(&mut self, id: WindowId) {
        let Some(data) = self.windows.get_mut(&id) else {
            return;
        };
        let Some(layer) = data.window.layer else {
            return;
        };
        let config = LayerConfig {
            bounds: data.window.bounds,
            opacity: data.window.opacity,
        };
        if data.layer_config == Some(config) {
            return;
        }
        match self.output.configure_layer(layer, config) {
            Ok(()) => data.layer_config = Some(config),
            Err(err) => {
                tracing::warn!(window_id = ?id, ?layer, %err, "failed to configure layer");
            }
        }
    }

    pub fn grab_pointer(&mut self, id: WindowId) -> Result<()> {
        self.data(id)?;
        self.grabs.grab_pointer(id)?;
        tracing::debug!(window_id = ?id, "pointer grabbed");
        Ok(())
    }

    pub fn ungrab_pointer(&mut self, id: WindowId) -> Result<()> {
        self.grabs.ungrab_pointer(id)?;
        tracing::debug!(window_id = ?id, "pointer released");
        self.update_hover();
        Ok(())
    }

    pub fn grab_keyboard(&mut self, id: WindowId) -> Result<()> {
        self.data(id)?;
        self.grabs.grab_keyboard(id)?;
        tracing::debug!(window_id = ?id, "keyboard grabbed");
        Ok(())
    }

    pub fn ungrab_keyboard(&mut self, id: WindowId) -> Result<()> {
        self.grabs.ungrab_keyboard(id)?;
        tracing::debug!(window_id = ?id, "keyboard released");
        Ok(())
    }

    pub fn grab_key(
        &mut self,
        id: WindowId,
        symbol: crate::input::KeySymbol,
        modifiers: crate::input::Modifiers,
    ) -> Result<()> {
        self.data(id)?;
        self.grabs.grab_key(id, symbol, modifiers)
    }

    pub fn ungrab_key(
        &mut self,
        id: WindowId,
        symbol: crate::input::KeySymbol,
        modifiers: crate::input::Modifiers,
    ) -> Result<()> {
        self.grabs.ungrab_key(id, symbol, modifiers)
    }

    /// Focus `id`; the hovered window gets a leave if it is another one.
    pub fn request_focus(&mut self, id: WindowId) -> Result<()> {
        let window = &self.data(id)?.window;
        if window.is_ghost() {
            return Err(StackError::invalid(format!("ghost window {} cannot take focus", id.0)));
        }
        if !window.is_visible() {
            return Err(StackError::invalid(format!("hidden window {} cannot take focus", id.0)));
        }
        self.switch_focus(Some(id));
        if let Some(entered) = self.entered
            && entered != id
        {
            let pos = self.pointer_pos(entered);
            self.post(entered, WindowEvent::Leave(pos));
            self.entered = None;
        }
        Ok(())
    }

    pub(crate) fn switch_focus(&mut self, to: Option<WindowId>) {
        let from = self.focused;
        if from == to {
            return;
        }
        if let Some(from) = from {
            self.post(from, WindowEvent::LostFocus);
        }
        self.focused = to;
        if let Some(to) = to {
            self.post(to, WindowEvent::GotFocus);
        }
        tracing::debug!(?from, ?to, "focus changed");
    }

    /// Give focus to the topmost interactive window if nothing has it.
    pub fn ensure_focus(&mut self) {
        if self.focused.is_some() {
            return;
        }
        let top = self.order.iter().rev().copied().find(|id| {
            self.windows
                .get(id)
                .is_some_and(|data| data.window.is_interactive())
        });
        if top.is_some() {
            self.switch_focus(top);
        }
    }

    /// Re-resolve which window is under the cursor, posting leave/enter.
    ///
    /// Skipped while the pointer is grabbed.
    pub fn update_hover(&mut self) {
        if self.grabs.pointer().is_some() {
            return;
        }
        let before = self.entered;
        let after = self.window_at(self.cursor.x, self.cursor.y);
        if before == after {
            return;
        }
        if let Some(before) = before {
            let pos = self.pointer_pos(before);
            self.post(before, WindowEvent::Leave(pos));
        }
        self.entered = after;
        if let Some(after) = after {
            let pos = self.pointer_pos(after);
            self.post(after, WindowEvent::Enter(pos));
        }
    }

    pub fn set_cursor_enabled(&mut self, enabled: bool) {
        if self.cursor.enabled == enabled {
            return;
        }
        self.cursor.enabled = enabled;
        self.update_hover();
    }

    /// Hide and remove every window, top first.
    pub fn drain(&mut self) {
        let ids: Vec<WindowId> = self.order.iter().rev().copied().collect();
        for id in ids {
            if let Some(data) = self.windows.get_mut(&id) {
                data.window.opacity = 0;
                let node = data.region;
                self.tree.disable(node, RegionFlags::ACTIVE);
            }
            if let Err(err) = self.remove_window(id) {
                tracing::warn!(window_id = ?id, %err, "failed to remove window during teardown");
            }
        }
    }

    /// Tear the stack down and hand back the output.
    pub fn close(mut self) -> O {
        self.drain();
        self.tree.destroy(self.root);
        tracing::debug!("window stack closed");
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::recorder::RecordingOutput;
    use crate::window::{PixelFormat, SurfaceDesc, SurfaceId};

    fn stack() -> WindowStack<RecordingOutput> {
        WindowStack::new(
            StackConfig::default().with_size(100, 100),
            RecordingOutput::new(),
        )
        .unwrap()
    }

    fn win(id: u32, class: StackingClass) -> Window {
        Window::new(WindowId(id), Rect::new(0, 0, 10, 10))
            .with_stacking(class)
            .with_surface(SurfaceDesc::new(SurfaceId(id), 10, 10, PixelFormat::Rgb32))
    }

    #[test]
    fn add_places_on_top_of_own_band() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Upper)).unwrap();
        s.add_window(win(2, StackingClass::Lower)).unwrap();
        s.add_window(win(3, StackingClass::Middle)).unwrap();
        s.add_window(win(4, StackingClass::Middle)).unwrap();
        assert_eq!(
            s.order(),
            &[WindowId(2), WindowId(3), WindowId(4), WindowId(1)]
        );
    }

    #[test]
    fn duplicate_and_empty_windows_are_rejected() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Middle)).unwrap();
        assert!(matches!(
            s.add_window(win(1, StackingClass::Middle)),
            Err(StackError::InvalidArgument(_))
        ));
        let empty = Window::new(WindowId(2), Rect::new(0, 0, 0, 5));
        assert!(s.add_window(empty).is_err());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn restack_clamps_into_band() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Lower)).unwrap();
        s.add_window(win(2, StackingClass::Middle)).unwrap();
        s.add_window(win(3, StackingClass::Upper)).unwrap();
        // Asking the lower window to sit above the upper one keeps it in its band.
        s.put_atop(WindowId(1), WindowId(3)).unwrap();
        assert_eq!(s.order(), &[WindowId(1), WindowId(2), WindowId(3)]);
        s.set_stacking(WindowId(1), StackingClass::Upper).unwrap();
        assert_eq!(s.order(), &[WindowId(2), WindowId(1), WindowId(3)]);
        s.raise_to_top(WindowId(1)).unwrap();
        assert_eq!(s.order(), &[WindowId(2), WindowId(3), WindowId(1)]);
    }

    #[test]
    fn relation_zero_takes_relative_index() {
        let mut s = stack();
        for id in 1..=4 {
            s.add_window(win(id, StackingClass::Middle)).unwrap();
        }
        s.restack(WindowId(1), Some(WindowId(3)), 0, StackingClass::Middle)
            .unwrap();
        assert_eq!(
            s.order(),
            &[WindowId(2), WindowId(3), WindowId(1), WindowId(4)]
        );
        s.put_below(WindowId(4), WindowId(2)).unwrap();
        assert_eq!(
            s.order(),
            &[WindowId(4), WindowId(2), WindowId(3), WindowId(1)]
        );
    }

    #[test]
    fn restack_relative_to_itself_is_rejected() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Middle)).unwrap();
        s.add_window(win(2, StackingClass::Middle)).unwrap();
        assert!(matches!(
            s.restack(WindowId(1), Some(WindowId(1)), 1, StackingClass::Upper),
            Err(StackError::InvalidArgument(_))
        ));
        assert_eq!(s.window(WindowId(1)).unwrap().stacking, StackingClass::Middle);
        assert_eq!(s.order(), &[WindowId(1), WindowId(2)]);
        // Class changes still keep the position where the band allows it.
        s.set_stacking(WindowId(2), StackingClass::Lower).unwrap();
        assert_eq!(s.order(), &[WindowId(2), WindowId(1)]);
        s.set_stacking(WindowId(2), StackingClass::Lower).unwrap();
        assert_eq!(s.order(), &[WindowId(2), WindowId(1)]);
    }

    #[test]
    fn topmost_beats_upper() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Lower)).unwrap();
        s.add_window(win(2, StackingClass::Upper)).unwrap();
        s.set_topmost(WindowId(1), true).unwrap();
        assert_eq!(s.order(), &[WindowId(2), WindowId(1)]);
    }

    #[test]
    fn remove_requires_hidden_window() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Middle).with_opacity(0xff))
            .unwrap();
        assert!(matches!(
            s.remove_window(WindowId(1)),
            Err(StackError::InvalidArgument(_))
        ));
        s.set_opacity(WindowId(1), 0).unwrap();
        s.remove_window(WindowId(1)).unwrap();
        assert!(s.is_empty());
        assert!(matches!(
            s.remove_window(WindowId(1)),
            Err(StackError::NotFound(_))
        ));
    }

    #[test]
    fn enum_windows_stops_on_break() {
        let mut s = stack();
        for id in 1..=3 {
            s.add_window(win(id, StackingClass::Middle)).unwrap();
        }
        let mut seen = Vec::new();
        s.enum_windows(|w| {
            seen.push(w.id);
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, vec![WindowId(3), WindowId(2)]);
    }

    #[test]
    fn close_returns_output_after_draining() {
        let mut s = stack();
        s.add_window(win(1, StackingClass::Middle).with_opacity(0xff))
            .unwrap();
        s.grab_keyboard(WindowId(1)).unwrap();
        let out = s.close();
        assert!(
            out.events()
                .iter()
                .any(|(id, ev)| *id == WindowId(1) && *ev == WindowEvent::LostFocus)
        );
    }
}
