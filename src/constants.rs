//! Shared crate-wide constants.

/// Number of scanned keys that can be held down at the same time while
/// still being routed symmetrically.
///
/// Each press of a key carrying a hardware scan code claims one slot that
/// remembers which window received the press, so the release can follow it
/// even after focus moved. A press arriving while every slot is taken is
/// dropped.
pub const MAX_IMPLICIT_KEY_GRABS: usize = 8;

/// Upper bound on the number of disjoint rectangles a partially covered
/// window update is split into. Past this the update falls back to a single
/// rectangle, which is cheaper than many tiny blits.
pub const MAX_UPDATE_RECTS: usize = 32;

/// Opacity change applied per wheel step while the WM hotkey trigger is held.
pub const WHEEL_OPACITY_STEP: i32 = 8;

/// Default relative-motion magnitude above which pointer acceleration kicks in.
///
/// Units: pointer pixels per event.
pub const DEFAULT_ACCEL_THRESHOLD: i32 = 4;

/// Default acceleration ratio, applied as `delta * numerator / denominator`.
pub const DEFAULT_ACCEL_NUMERATOR: i32 = 2;
pub const DEFAULT_ACCEL_DENOMINATOR: i32 = 1;

/// Default cap on live region nodes (root included).
pub const DEFAULT_MAX_REGIONS: usize = 1024;

/// Smallest size a window can be shrunk to with the resize drag.
pub const MIN_DRAG_SIZE: i32 = 1;
