#![allow(dead_code)]

use winstack::config::StackConfig;
use winstack::drivers::recorder::RecordingOutput;
use winstack::geometry::Rect;
use winstack::input::{Axis, AxisMotion, InputEvent};
use winstack::window::{PixelFormat, SurfaceDesc, SurfaceId, Window, WindowId, WindowStack};

pub type TestStack = WindowStack<RecordingOutput>;

pub fn stack(width: i32, height: i32) -> TestStack {
    stack_with(StackConfig::default().with_size(width, height))
}

pub fn stack_with(config: StackConfig) -> TestStack {
    WindowStack::new(config, RecordingOutput::new()).unwrap()
}

/// A visible, opaque window whose surface matches its bounds.
pub fn window(id: u32, bounds: Rect) -> Window {
    Window::new(WindowId(id), bounds)
        .with_surface(SurfaceDesc::new(
            SurfaceId(id),
            bounds.width,
            bounds.height,
            PixelFormat::Rgb32,
        ))
        .with_opacity(0xff)
}

pub fn move_pointer(stack: &mut TestStack, x: i32, y: i32) {
    stack.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Absolute(x)).following());
    stack.handle_input(&InputEvent::axis(Axis::Y, AxisMotion::Absolute(y)));
}
