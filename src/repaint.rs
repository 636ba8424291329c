//! Software composition of the window stack onto its output.
//!
//! Every repaint walks the region tree back to front for each dirty
//! rectangle and ends with a single flip of the bounding box.

use std::path::PathBuf;

use crate::config::BackgroundMode;
use crate::constants::MAX_UPDATE_RECTS;
use crate::drivers::{BlitFlags, Composer, FlipFlags, Output};
use crate::error::{Result, StackError};
use crate::geometry::{Rect, bounding_box};
use crate::layout::RegionClass;
use crate::window::{SurfaceDesc, Window, WindowId, WindowOptions, WindowStack};

impl<O: Output> WindowStack<O> {
    /// Recomposite `rect` of the output from the background up.
    pub fn update_stack(&mut self, rect: Rect) {
        self.repaint(&[rect], FlipFlags::empty());
    }

    /// Recomposite everything.
    pub fn repaint_all(&mut self) {
        self.update_stack(self.bounds);
    }

    /// Repaint the part of window `id` inside `rect` (window coordinates,
    /// whole window when `None`).
    ///
    /// Hidden windows are skipped unless `force_invisible` is set. Unless
    /// `force_complete` is set only the parts not covered by opaque windows
    /// above are recomposited.
    pub fn update_window(
        &mut self,
        id: WindowId,
        rect: Option<Rect>,
        flags: FlipFlags,
        force_complete: bool,
        force_invisible: bool,
    ) {
        let Some(data) = self.windows.get(&id) else {
            return;
        };
        let window = &data.window;
        if !force_invisible && !window.is_visible() {
            return;
        }
        if window.layer.is_some() {
            self.push_layer_config(id);
            return;
        }
        let local = rect.unwrap_or(Rect::sized(window.bounds.width, window.bounds.height));
        let Some(area) = local
            .translate(window.bounds.x, window.bounds.y)
            .intersection(&window.bounds)
            .and_then(|r| r.intersection(&self.bounds))
        else {
            return;
        };

        let rects = if force_complete || self.tree.fully_visible(data.region, area) {
            vec![area]
        } else {
            self.tree
                .visible(data.region, area, MAX_UPDATE_RECTS)
                .unwrap_or_else(|| vec![area])
        };
        if !rects.is_empty() {
            self.repaint(&rects, flags);
        }
    }

    pub(crate) fn repaint(&mut self, rects: &[Rect], flags: FlipFlags) {
        let bounds = self.bounds;
        let dirty: Vec<Rect> = rects
            .iter()
            .filter_map(|r| r.intersection(&bounds))
            .collect();
        let Some(flip) = bounding_box(&dirty) else {
            return;
        };

        let Self {
            tree,
            windows,
            output,
            config,
            root,
            ..
        } = self;
        for rect in &dirty {
            tree.update(*root, *rect, &mut |node, clip| match node.class {
                RegionClass::Background => {
                    paint_background(&mut *output, &config.background, bounds, clip)
                }
                RegionClass::Window(id) => {
                    if let Some(data) = windows.get(&id) {
                        paint_window(&mut *output, &data.window, clip);
                    }
                }
            });
        }
        tracing::trace!(rects = dirty.len(), ?flip, "flip");
        output.flip(config.layer, flip, flags);
    }

    /// Ask the output for a screenshot in the configured directory.
    pub fn screenshot(&mut self) -> Result<PathBuf> {
        let Some(dir) = self.config.screenshot_dir.clone() else {
            return Err(StackError::Unsupported("screenshot directory not configured"));
        };
        self.output.screenshot(&dir)
    }
}

fn paint_background<C: Composer + ?Sized>(
    out: &mut C,
    mode: &BackgroundMode,
    bounds: Rect,
    clip: Rect,
) {
    out.set_clip(clip);
    out.set_blit_flags(BlitFlags::empty());
    match mode {
        BackgroundMode::Color(color) => {
            out.set_color(*color);
            out.fill_rect(clip);
        }
        BackgroundMode::Image(surface) => out.stretch_blit(surface, surface.rect(), bounds),
        BackgroundMode::Tile(surface) => out.tile_blit(surface, surface.rect(), bounds),
    }
}

pub(crate) fn blit_flags(window: &Window, surface: &SurfaceDesc) -> BlitFlags {
    let mut flags = BlitFlags::empty();
    if window.options.contains(WindowOptions::ALPHACHANNEL) && surface.format.has_alpha() {
        flags |= BlitFlags::BLEND_ALPHACHANNEL;
    }
    if window.opacity < 0xff {
        flags |= BlitFlags::BLEND_COLORALPHA;
    }
    if window.options.contains(WindowOptions::COLORKEYING) {
        flags |= BlitFlags::SRC_COLORKEY;
    }
    if surface.interlaced {
        flags |= BlitFlags::DEINTERLACE;
    }
    flags
}

fn paint_window<C: Composer + ?Sized>(out: &mut C, window: &Window, clip: Rect) {
    let Some(surface) = window.surface.as_ref() else {
        return;
    };
    let flags = blit_flags(window, surface);
    out.set_clip(clip);
    out.set_blit_flags(flags);
    if flags.contains(BlitFlags::BLEND_COLORALPHA) {
        out.set_opacity(window.opacity);
    }
    if flags.contains(BlitFlags::SRC_COLORKEY) {
        out.set_src_colorkey(window.colorkey);
    }
    let bounds = window.bounds;
    if surface.width == bounds.width && surface.height == bounds.height {
        out.blit(surface, surface.rect(), bounds.x, bounds.y);
    } else {
        out.stretch_blit(surface, surface.rect(), bounds);
    }
}
