//! An [`Output`](super::Output) that records everything it is asked to do.
//!
//! Used by the test suites and handy for headless runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{BlitFlags, Color, Composer, EventSink, FlipFlags, LayerControl, SurfaceReader};
use crate::error::Result;
use crate::geometry::Rect;
use crate::window::{LayerConfig, LayerId, SurfaceDesc, SurfaceId, WindowEvent, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
    SetClip(Rect),
    SetColor(Color),
    SetBlitFlags(BlitFlags),
    SetColorkey(u32),
    SetOpacity(u8),
    Fill(Rect),
    Blit {
        surface: SurfaceId,
        src: Rect,
        x: i32,
        y: i32,
    },
    StretchBlit {
        surface: SurfaceId,
        src: Rect,
        dst: Rect,
    },
    TileBlit {
        surface: SurfaceId,
        src: Rect,
        dst: Rect,
    },
    Flip {
        layer: LayerId,
        region: Rect,
        flags: FlipFlags,
    },
}

/// What a drawing call put on screen, reduced to its clipped area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill(Rect),
    Surface(SurfaceId, Rect),
}

#[derive(Debug, Default)]
pub struct RecordingOutput {
    ops: Vec<DrawOp>,
    events: Vec<(WindowId, WindowEvent)>,
    layers: Vec<(LayerId, LayerConfig)>,
    pixels: HashMap<(SurfaceId, i32, i32), u32>,
    screenshots: usize,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn events(&self) -> &[(WindowId, WindowEvent)] {
        &self.events
    }

    pub fn layer_configs(&self) -> &[(LayerId, LayerConfig)] {
        &self.layers
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.events.clear();
    }

    pub fn take_events(&mut self) -> Vec<(WindowId, WindowEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn events_for(&self, window: WindowId) -> Vec<WindowEvent> {
        self.events
            .iter()
            .filter(|(id, _)| *id == window)
            .map(|(_, ev)| *ev)
            .collect()
    }

    /// Make `read_pixel` return `raw` at `(x, y)` of `surface`.
    pub fn set_pixel(&mut self, surface: SurfaceId, x: i32, y: i32, raw: u32) {
        self.pixels.insert((surface, x, y), raw);
    }

    pub fn flips(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Flip { region, .. } => Some(*region),
                _ => None,
            })
            .collect()
    }

    /// Drawing calls reduced to the areas they covered, in call order.
    pub fn paints(&self) -> Vec<Paint> {
        let mut clip = None;
        let mut paints = Vec::new();
        for op in &self.ops {
            let current: Option<Rect> = clip;
            let covered = move |area: Rect| current.and_then(|c| c.intersection(&area));
            match *op {
                DrawOp::SetClip(rect) => clip = Some(rect),
                DrawOp::Fill(rect) => paints.extend(covered(rect).map(Paint::Fill)),
                DrawOp::Blit { surface, src, x, y } => paints.extend(
                    covered(Rect::new(x, y, src.width, src.height))
                        .map(|r| Paint::Surface(surface, r)),
                ),
                DrawOp::StretchBlit { surface, dst, .. } | DrawOp::TileBlit { surface, dst, .. } => {
                    paints.extend(covered(dst).map(|r| Paint::Surface(surface, r)))
                }
                _ => {}
            }
        }
        paints
    }
}

impl Composer for RecordingOutput {
    fn set_clip(&mut self, clip: Rect) {
        self.ops.push(DrawOp::SetClip(clip));
    }

    fn set_color(&mut self, color: Color) {
        self.ops.push(DrawOp::SetColor(color));
    }

    fn set_blit_flags(&mut self, flags: BlitFlags) {
        self.ops.push(DrawOp::SetBlitFlags(flags));
    }

    fn set_src_colorkey(&mut self, key: u32) {
        self.ops.push(DrawOp::SetColorkey(key));
    }

    fn set_opacity(&mut self, opacity: u8) {
        self.ops.push(DrawOp::SetOpacity(opacity));
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Fill(rect));
    }

    fn blit(&mut self, surface: &SurfaceDesc, src: Rect, dx: i32, dy: i32) {
        self.ops.push(DrawOp::Blit {
            surface: surface.id,
            src,
            x: dx,
            y: dy,
        });
    }

    fn stretch_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect) {
        self.ops.push(DrawOp::StretchBlit {
            surface: surface.id,
            src,
            dst,
        });
    }

    fn tile_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect) {
        self.ops.push(DrawOp::TileBlit {
            surface: surface.id,
            src,
            dst,
        });
    }

    fn flip(&mut self, layer: LayerId, region: Rect, flags: FlipFlags) {
        self.ops.push(DrawOp::Flip {
            layer,
            region,
            flags,
        });
    }

    /// Writes the recorded operation log.
    fn screenshot(&mut self, dir: &Path) -> Result<PathBuf> {
        self.screenshots += 1;
        let path = dir.join(format!("recording-{:04}.txt", self.screenshots));
        let mut log = String::new();
        for op in &self.ops {
            log.push_str(&format!("{op:?}\n"));
        }
        fs::write(&path, log)?;
        Ok(path)
    }
}

impl LayerControl for RecordingOutput {
    fn configure_layer(&mut self, layer: LayerId, config: LayerConfig) -> Result<()> {
        self.layers.push((layer, config));
        Ok(())
    }
}

impl SurfaceReader for RecordingOutput {
    fn read_pixel(&self, surface: SurfaceId, x: i32, y: i32) -> Option<u32> {
        self.pixels.get(&(surface, x, y)).copied()
    }
}

impl EventSink for RecordingOutput {
    fn post_event(&mut self, window: WindowId, event: WindowEvent) {
        self.events.push((window, event));
    }
}
