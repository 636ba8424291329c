//! Per-output stack configuration.

use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ACCEL_DENOMINATOR, DEFAULT_ACCEL_NUMERATOR, DEFAULT_ACCEL_THRESHOLD,
    DEFAULT_MAX_REGIONS,
};
use crate::drivers::Color;
use crate::error::{Result, StackError};
use crate::input::KeySymbol;
use crate::window::{LayerId, SurfaceDesc};

/// How the desktop behind all windows is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    Color(Color),
    /// One image stretched over the whole output.
    Image(SurfaceDesc),
    /// One image repeated from the output origin.
    Tile(SurfaceDesc),
}

impl Default for BackgroundMode {
    fn default() -> Self {
        BackgroundMode::Color(Color::rgb(0x20, 0x30, 0x50))
    }
}

/// Relative pointer acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerAccel {
    pub threshold: i32,
    pub numerator: i32,
    pub denominator: i32,
}

impl Default for PointerAccel {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ACCEL_THRESHOLD,
            numerator: DEFAULT_ACCEL_NUMERATOR,
            denominator: DEFAULT_ACCEL_DENOMINATOR,
        }
    }
}

impl PointerAccel {
    /// No acceleration at all.
    pub fn linear() -> Self {
        Self {
            threshold: i32::MAX,
            numerator: 1,
            denominator: 1,
        }
    }

    /// Scale `delta` when its magnitude exceeds the threshold. Saturates
    /// instead of overflowing.
    pub fn apply(&self, delta: i32) -> i32 {
        if self.denominator == 0 || delta.unsigned_abs() <= self.threshold.max(0).unsigned_abs() {
            return delta;
        }
        let scaled = delta as i64 * self.numerator as i64 / self.denominator as i64;
        scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

#[derive(Debug, Clone)]
pub struct StackConfig {
    pub width: i32,
    pub height: i32,
    /// Layer the software composite is flipped on.
    pub layer: LayerId,
    /// When off, any nonzero opacity is treated as fully opaque.
    pub translucency: bool,
    pub cursor_enabled: bool,
    pub background: BackgroundMode,
    pub accel: PointerAccel,
    /// Key that arms the window-manager hotkeys while held.
    pub hotkey_trigger: KeySymbol,
    pub screenshot_dir: Option<PathBuf>,
    pub max_regions: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            layer: LayerId(0),
            translucency: true,
            cursor_enabled: true,
            background: BackgroundMode::default(),
            accel: PointerAccel::default(),
            hotkey_trigger: KeySymbol::Meta,
            screenshot_dir: None,
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

impl StackConfig {
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(StackError::invalid(format!(
                "output size {}x{}",
                self.width, self.height
            )));
        }
        if self.accel.denominator == 0 {
            return Err(StackError::invalid("acceleration denominator is zero"));
        }
        if self.max_regions < 1 {
            return Err(StackError::invalid("region limit must allow the root"));
        }
        Ok(())
    }
}
