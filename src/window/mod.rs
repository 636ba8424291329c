pub mod events;
pub mod grabs;

mod stack;

use bitflags::bitflags;

use crate::geometry::Rect;
use crate::layout::NodeId;

pub use events::{KeyInfo, PointerPos, WindowEvent};
pub use stack::WindowStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// Coarse z-order tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StackingClass {
    Lower,
    #[default]
    Middle,
    Upper,
}

impl StackingClass {
    fn rank(self) -> i32 {
        match self {
            StackingClass::Lower => -1,
            StackingClass::Middle => 0,
            StackingClass::Upper => 1,
        }
    }
}

/// Topmost windows get this added to their class rank, which puts every
/// topmost window above every other one while keeping class order among them.
const TOPMOST_BOOST: i32 = 3;

pub(crate) fn priority(stacking: StackingClass, topmost: bool) -> i32 {
    stacking.rank() + if topmost { TOPMOST_BOOST } else { 0 }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowOptions: u16 {
        /// Never receives input focus and is invisible to hit testing.
        const GHOST = 1 << 0;
        /// Hit testing follows the surface's alpha/colorkey shape.
        const SHAPED = 1 << 1;
        /// WM hotkeys may not restack the window.
        const KEEP_STACKING = 1 << 2;
        /// WM drags may not move the window.
        const KEEP_POSITION = 1 << 3;
        /// WM drags may not resize the window.
        const KEEP_SIZE = 1 << 4;
        /// Blend with the surface's per-pixel alpha.
        const ALPHACHANNEL = 1 << 5;
        /// Pixels matching the window colorkey are transparent.
        const COLORKEYING = 1 << 6;
        /// WM hotkeys may not close or destroy the window.
        const INDESTRUCTIBLE = 1 << 7;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowCaps: u8 {
        /// The window has no visual content.
        const INPUT_ONLY = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Argb8888,
    Argb1555,
    Argb4444,
    Rgb32,
    Rgb24,
    Rgb16,
    A8,
}

impl PixelFormat {
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::Argb8888 | PixelFormat::Argb1555 | PixelFormat::Argb4444 | PixelFormat::A8
        )
    }

    /// Alpha of a raw pixel, 255 for formats without alpha.
    pub fn alpha(self, raw: u32) -> u8 {
        match self {
            PixelFormat::Argb8888 => (raw >> 24) as u8,
            PixelFormat::Argb1555 => {
                if raw & 0x8000 != 0 {
                    0xff
                } else {
                    0
                }
            }
            PixelFormat::Argb4444 => {
                let a = ((raw >> 12) & 0xf) as u8;
                (a << 4) | a
            }
            PixelFormat::A8 => raw as u8,
            PixelFormat::Rgb32 | PixelFormat::Rgb24 | PixelFormat::Rgb16 => 0xff,
        }
    }

    /// The color bits of a raw pixel, alpha masked off.
    pub fn color_bits(self, raw: u32) -> u32 {
        match self {
            PixelFormat::Argb8888 | PixelFormat::Rgb32 | PixelFormat::Rgb24 => raw & 0x00ff_ffff,
            PixelFormat::Argb1555 => raw & 0x7fff,
            PixelFormat::Argb4444 => raw & 0x0fff,
            PixelFormat::Rgb16 => raw & 0xffff,
            PixelFormat::A8 => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub id: SurfaceId,
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
    pub interlaced: bool,
}

impl SurfaceDesc {
    pub fn new(id: SurfaceId, width: i32, height: i32, format: PixelFormat) -> Self {
        Self {
            id,
            width,
            height,
            format,
            interlaced: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }
}

/// The stack's view of an externally owned window.
///
/// Window objects are created and destroyed elsewhere; the stack keeps this
/// snapshot of the properties it needs and updates it through its mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: WindowId,
    pub bounds: Rect,
    pub stacking: StackingClass,
    pub topmost: bool,
    pub opacity: u8,
    pub options: WindowOptions,
    pub caps: WindowCaps,
    pub colorkey: u32,
    /// Window-relative area that always counts as a hit for shaped windows.
    pub opaque_region: Option<Rect>,
    pub surface: Option<SurfaceDesc>,
    /// Dedicated hardware layer; such windows are never software composited.
    pub layer: Option<LayerId>,
}

impl Window {
    pub fn new(id: WindowId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            stacking: StackingClass::Middle,
            topmost: false,
            opacity: 0,
            options: WindowOptions::empty(),
            caps: WindowCaps::empty(),
            colorkey: 0,
            opaque_region: None,
            surface: None,
            layer: None,
        }
    }

    pub fn with_stacking(mut self, stacking: StackingClass) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_topmost(mut self, topmost: bool) -> Self {
        self.topmost = topmost;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_options(mut self, options: WindowOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_caps(mut self, caps: WindowCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_colorkey(mut self, colorkey: u32) -> Self {
        self.colorkey = colorkey;
        self
    }

    pub fn with_opaque_region(mut self, region: Rect) -> Self {
        self.opaque_region = Some(region);
        self
    }

    pub fn with_surface(mut self, surface: SurfaceDesc) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0
    }

    pub fn is_ghost(&self) -> bool {
        self.options.contains(WindowOptions::GHOST)
    }

    pub fn is_input_only(&self) -> bool {
        self.caps.contains(WindowCaps::INPUT_ONLY)
    }

    /// Visible and able to take part in hit testing and focus.
    pub(crate) fn is_interactive(&self) -> bool {
        self.is_visible() && !self.is_ghost()
    }

    /// Nothing below shows through this window.
    pub(crate) fn is_opaque(&self) -> bool {
        self.opacity == 0xff
            && !self
                .options
                .intersects(WindowOptions::ALPHACHANNEL | WindowOptions::COLORKEYING)
    }
}

/// Geometry and opacity pushed to a dedicated hardware layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerConfig {
    pub bounds: Rect,
    pub opacity: u8,
}

/// Per-window stack bookkeeping, 1:1 with a [`Window`] in the stack.
#[derive(Debug, Clone)]
pub(crate) struct WindowData {
    pub(crate) window: Window,
    pub(crate) priority: i32,
    pub(crate) region: NodeId,
    pub(crate) layer_config: Option<LayerConfig>,
}

impl WindowData {
    pub(crate) fn new(window: Window, region: NodeId) -> Self {
        let priority = priority(window.stacking, window.topmost);
        Self {
            window,
            priority,
            region,
            layer_config: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topmost_outranks_every_class() {
        let top_lower = priority(StackingClass::Lower, true);
        for class in [
            StackingClass::Lower,
            StackingClass::Middle,
            StackingClass::Upper,
        ] {
            assert!(top_lower > priority(class, false));
        }
        assert!(priority(StackingClass::Upper, true) > top_lower);
        assert!(priority(StackingClass::Upper, false) > priority(StackingClass::Middle, false));
    }

    #[test]
    fn pixel_format_alpha_extraction() {
        assert_eq!(PixelFormat::Argb8888.alpha(0x80ff_0000), 0x80);
        assert_eq!(PixelFormat::Argb1555.alpha(0x8000), 0xff);
        assert_eq!(PixelFormat::Argb1555.alpha(0x7fff), 0);
        assert_eq!(PixelFormat::Argb4444.alpha(0xa000), 0xaa);
        assert_eq!(PixelFormat::Rgb16.alpha(0), 0xff);
        assert_eq!(PixelFormat::Argb8888.color_bits(0x12ab_cdef), 0x00ab_cdef);
    }

    #[test]
    fn opaque_requires_full_opacity_and_no_keying() {
        let w = Window::new(WindowId(1), Rect::sized(1, 1)).with_opacity(0xff);
        assert!(w.is_opaque());
        assert!(!w.clone().with_opacity(0x80).is_opaque());
        assert!(
            !w.with_options(WindowOptions::COLORKEYING)
                .is_opaque()
        );
    }
}
