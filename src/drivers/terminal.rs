//! Software composition into a terminal cell grid.
//!
//! Each cell is one pixel: its background carries the composited color and
//! surfaces may put a title glyph into their top row. Composition happens
//! in a back buffer; [`Composer::flip`] copies the dirty area to the front
//! buffer that the console output draws.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use ratatui::buffer::Buffer;
use ratatui::style::Color as CellColor;

use super::{BlitFlags, Color, Composer, EventSink, FlipFlags, LayerControl, SurfaceReader};
use crate::error::Result;
use crate::geometry::Rect;
use crate::window::{LayerId, SurfaceDesc, SurfaceId, WindowEvent, WindowId};

/// ARGB8888 pixels plus an optional title drawn along the top row.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
    title: Option<String>,
}

impl TerminalSurface {
    pub fn solid(width: i32, height: i32, argb: u32) -> Self {
        Self::from_fn(width, height, |_, _| argb)
    }

    pub fn from_fn(width: i32, height: i32, f: impl Fn(i32, i32) -> u32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    fn glyph(&self, x: i32, y: i32) -> Option<char> {
        if y != 0 || x < 1 {
            return None;
        }
        self.title.as_deref()?.chars().nth((x - 1) as usize)
    }
}

#[derive(Debug, Clone, Copy)]
struct DrawState {
    clip: Rect,
    color: Color,
    flags: BlitFlags,
    colorkey: u32,
    opacity: u8,
}

pub struct TerminalOutput {
    area: Rect,
    back: Buffer,
    front: Buffer,
    surfaces: HashMap<SurfaceId, TerminalSurface>,
    state: DrawState,
    events: VecDeque<(WindowId, WindowEvent)>,
    screenshots: usize,
}

fn to_cell(color: Color) -> CellColor {
    CellColor::Rgb(color.r, color.g, color.b)
}

fn from_cell(color: CellColor) -> Color {
    match color {
        CellColor::Rgb(r, g, b) => Color::rgb(r, g, b),
        _ => Color::BLACK,
    }
}

impl TerminalOutput {
    pub fn new(width: u16, height: u16) -> Self {
        let rect = ratatui::layout::Rect::new(0, 0, width, height);
        let area = Rect::sized(width as i32, height as i32);
        Self {
            area,
            back: Buffer::empty(rect),
            front: Buffer::empty(rect),
            surfaces: HashMap::new(),
            state: DrawState {
                clip: area,
                color: Color::BLACK,
                flags: BlitFlags::empty(),
                colorkey: 0,
                opacity: 0xff,
            },
            events: VecDeque::new(),
            screenshots: 0,
        }
    }

    pub fn add_surface(&mut self, id: SurfaceId, surface: TerminalSurface) {
        self.surfaces.insert(id, surface);
    }

    pub fn remove_surface(&mut self, id: SurfaceId) -> Option<TerminalSurface> {
        self.surfaces.remove(&id)
    }

    /// What is currently visible.
    pub fn front(&self) -> &Buffer {
        &self.front
    }

    pub fn take_events(&mut self) -> Vec<(WindowId, WindowEvent)> {
        self.events.drain(..).collect()
    }

    fn clipped(&self, rect: Rect) -> Option<Rect> {
        rect.intersection(&self.state.clip)?.intersection(&self.area)
    }

    /// Blend one source pixel into the back buffer at `(x, y)`.
    fn put(&mut self, x: i32, y: i32, raw: u32, glyph: Option<char>) {
        let state = self.state;
        if state.flags.contains(BlitFlags::SRC_COLORKEY)
            && raw & 0x00ff_ffff == state.colorkey & 0x00ff_ffff
        {
            return;
        }
        let src = Color::from_argb(raw);
        let mut alpha = 0xffu32;
        if state.flags.contains(BlitFlags::BLEND_ALPHACHANNEL) {
            alpha = src.a as u32;
        }
        if state.flags.contains(BlitFlags::BLEND_COLORALPHA) {
            alpha = alpha * state.opacity as u32 / 0xff;
        }
        let Some(cell) = self.back.cell_mut((x as u16, y as u16)) else {
            return;
        };
        let mixed = src.over(from_cell(cell.bg), alpha as u8);
        cell.set_bg(to_cell(mixed));
        if alpha >= 0x80 {
            match glyph {
                Some(c) => {
                    cell.set_char(c).set_fg(CellColor::White);
                }
                None => {
                    cell.set_char(' ');
                }
            }
        }
    }

    /// Draw `dst` (clipped) by mapping each destination cell to a source
    /// pixel of `surface`.
    fn draw_mapped(
        &mut self,
        surface: &SurfaceDesc,
        dst: Rect,
        map: impl Fn(i32, i32) -> (i32, i32),
    ) {
        let Some(area) = self.clipped(dst) else {
            return;
        };
        let Some(source) = self.surfaces.remove(&surface.id) else {
            tracing::trace!(surface = ?surface.id, "blit from unknown surface");
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let (sx, sy) = map(x, y);
                if let Some(raw) = source.pixel(sx, sy) {
                    self.put(x, y, raw, source.glyph(sx, sy));
                }
            }
        }
        self.surfaces.insert(surface.id, source);
    }
}

impl Composer for TerminalOutput {
    fn set_clip(&mut self, clip: Rect) {
        self.state.clip = clip;
    }

    fn set_color(&mut self, color: Color) {
        self.state.color = color;
    }

    fn set_blit_flags(&mut self, flags: BlitFlags) {
        self.state.flags = flags;
    }

    fn set_src_colorkey(&mut self, key: u32) {
        self.state.colorkey = key;
    }

    fn set_opacity(&mut self, opacity: u8) {
        self.state.opacity = opacity;
    }

    fn fill_rect(&mut self, rect: Rect) {
        let Some(area) = self.clipped(rect) else {
            return;
        };
        let bg = to_cell(self.state.color);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                if let Some(cell) = self.back.cell_mut((x as u16, y as u16)) {
                    cell.set_char(' ').set_bg(bg);
                }
            }
        }
    }

    fn blit(&mut self, surface: &SurfaceDesc, src: Rect, dx: i32, dy: i32) {
        let dst = Rect::new(dx, dy, src.width, src.height);
        self.draw_mapped(surface, dst, |x, y| (src.x + x - dx, src.y + y - dy));
    }

    fn stretch_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect) {
        if dst.is_empty() {
            return;
        }
        self.draw_mapped(surface, dst, |x, y| {
            (
                src.x + (x - dst.x) * src.width / dst.width,
                src.y + (y - dst.y) * src.height / dst.height,
            )
        });
    }

    fn tile_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect) {
        if src.is_empty() {
            return;
        }
        self.draw_mapped(surface, dst, |x, y| {
            (
                src.x + (x - dst.x).rem_euclid(src.width),
                src.y + (y - dst.y).rem_euclid(src.height),
            )
        });
    }

    fn flip(&mut self, _layer: LayerId, region: Rect, _flags: FlipFlags) {
        let Some(area) = region.intersection(&self.area) else {
            return;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let pos = (x as u16, y as u16);
                if let Some(cell) = self.back.cell(pos).cloned()
                    && let Some(target) = self.front.cell_mut(pos)
                {
                    *target = cell;
                }
            }
        }
    }

    /// Writes the front buffer as a plain PPM image.
    fn screenshot(&mut self, dir: &Path) -> Result<PathBuf> {
        self.screenshots += 1;
        let path = dir.join(format!("winstack-{:04}.ppm", self.screenshots));
        let mut out = format!("P3\n{} {}\n255\n", self.area.width, self.area.height);
        for y in 0..self.area.height {
            for x in 0..self.area.width {
                let color = self
                    .front
                    .cell((x as u16, y as u16))
                    .map_or(Color::BLACK, |cell| from_cell(cell.bg));
                out.push_str(&format!("{} {} {}\n", color.r, color.g, color.b));
            }
        }
        fs::write(&path, out)?;
        Ok(path)
    }
}

impl LayerControl for TerminalOutput {}

impl SurfaceReader for TerminalOutput {
    fn read_pixel(&self, surface: SurfaceId, x: i32, y: i32) -> Option<u32> {
        self.surfaces.get(&surface)?.pixel(x, y)
    }
}

impl EventSink for TerminalOutput {
    fn post_event(&mut self, window: WindowId, event: WindowEvent) {
        self.events.push_back((window, event));
    }
}
