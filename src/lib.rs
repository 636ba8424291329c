//! Per-output window stack for a display server.
//!
//! A [`WindowStack`] keeps windows in priority-banded z-order, routes
//! pointer and keyboard input to them (focus, hover, grabs, WM hotkeys) and
//! recomposites exactly the damaged parts of the output through an
//! [`Output`] collaborator.

pub mod config;
pub mod constants;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod repaint;
pub mod tracing_sub;
pub mod window;

pub use config::{BackgroundMode, PointerAccel, StackConfig};
pub use drivers::Output;
pub use error::{Result, StackError};
pub use geometry::Rect;
pub use window::{Window, WindowEvent, WindowId, WindowStack};
