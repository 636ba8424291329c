//! Collaborators the stack talks to: the composition engine, hardware
//! layers, surface memory and the window event queue. The core only sees
//! the traits below; concrete drivers live in the submodules.

pub mod console;
pub mod keyboard;
pub mod mouse;
pub mod recorder;
pub mod terminal;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bitflags::bitflags;

use crate::error::{Result, StackError};
use crate::geometry::Rect;
use crate::window::{LayerConfig, LayerId, SurfaceDesc, SurfaceId, WindowEvent, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn from_argb(raw: u32) -> Self {
        Self {
            a: (raw >> 24) as u8,
            r: (raw >> 16) as u8,
            g: (raw >> 8) as u8,
            b: raw as u8,
        }
    }

    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Blend `self` over `below` with the given coverage.
    pub fn over(self, below: Color, alpha: u8) -> Color {
        let mix = |top: u8, bottom: u8| -> u8 {
            let a = alpha as u32;
            ((top as u32 * a + bottom as u32 * (255 - a)) / 255) as u8
        };
        Color::rgb(mix(self.r, below.r), mix(self.g, below.g), mix(self.b, below.b))
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlitFlags: u8 {
        const BLEND_ALPHACHANNEL = 1 << 0;
        const BLEND_COLORALPHA = 1 << 1;
        const SRC_COLORKEY = 1 << 2;
        const DEINTERLACE = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlipFlags: u8 {
        const WAIT = 1 << 0;
        const ONSYNC = 1 << 1;
    }
}

/// Accelerated 2D composition into the output's back buffer.
///
/// State setters persist until changed; drawing honours the current clip.
pub trait Composer {
    fn set_clip(&mut self, clip: Rect);
    fn set_color(&mut self, color: Color);
    fn set_blit_flags(&mut self, flags: BlitFlags);
    fn set_src_colorkey(&mut self, key: u32);
    /// Global alpha used with [`BlitFlags::BLEND_COLORALPHA`].
    fn set_opacity(&mut self, opacity: u8);
    fn fill_rect(&mut self, rect: Rect);
    fn blit(&mut self, surface: &SurfaceDesc, src: Rect, dx: i32, dy: i32);
    fn stretch_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect);
    /// Repeat `src` across `dst`, tiles anchored at `dst`'s origin.
    fn tile_blit(&mut self, surface: &SurfaceDesc, src: Rect, dst: Rect);
    /// Make `region` of the back buffer visible on `layer`.
    fn flip(&mut self, layer: LayerId, region: Rect, flags: FlipFlags);

    /// Dump the visible output into `dir`, returning the written file.
    fn screenshot(&mut self, _dir: &Path) -> Result<PathBuf> {
        Err(StackError::Unsupported("screenshot"))
    }
}

/// Configuration of dedicated hardware layers.
pub trait LayerControl {
    fn configure_layer(&mut self, _layer: LayerId, _config: LayerConfig) -> Result<()> {
        Ok(())
    }
}

/// Read access to window surfaces, used by shaped hit testing.
pub trait SurfaceReader {
    /// Raw pixel in the surface's own format. `None` when the surface cannot
    /// be read, which hit testing treats as a hit.
    fn read_pixel(&self, _surface: SurfaceId, _x: i32, _y: i32) -> Option<u32> {
        None
    }
}

/// Queue of events for window owners. Delivery is asynchronous: posting
/// never calls back into the stack.
pub trait EventSink {
    fn post_event(&mut self, window: WindowId, event: WindowEvent);
}

/// Everything one output provides to its window stack.
pub trait Output: Composer + LayerControl + SurfaceReader + EventSink {}

impl<T: Composer + LayerControl + SurfaceReader + EventSink> Output for T {}

/// Source of raw terminal events feeding the console normalizer.
pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<crossterm::event::Event>;
    fn set_mouse_capture(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<crossterm::event::Event> {
        (**self).read()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        (**self).set_mouse_capture(enabled)
    }
}
