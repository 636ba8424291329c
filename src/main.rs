use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use crossterm::event::{Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use indoc::formatdoc;

use winstack::config::{BackgroundMode, PointerAccel, StackConfig};
use winstack::drivers::InputDriver;
use winstack::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver, EventNormalizer};
use winstack::drivers::terminal::{TerminalOutput, TerminalSurface};
use winstack::event_loop::{ControlFlow, EventLoop, LoopEvent};
use winstack::input::{HotkeyBindings, KeySymbol};
use winstack::tracing_sub;
use winstack::window::{
    PixelFormat, SurfaceDesc, SurfaceId, Window, WindowEvent, WindowId, WindowOptions,
    WindowStack,
};
use winstack::{Rect, drivers::Color};

const BACKGROUND_TILE: SurfaceId = SurfaceId(0);
const MAX_WINDOWS: usize = 8;
const KEY_COLOR: u32 = 0x00ff00ff;

const PALETTE: [u32; MAX_WINDOWS] = [
    0xffc0392b, 0xff2980b9, 0xff27ae60, 0xff8e44ad, 0xffd35400, 0xff16a085, 0xff7f8c8d,
    0xfff1c40f,
];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Background {
    Color,
    Tile,
}

#[derive(Parser, Debug)]
#[command(
    name = "winstack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Window stack running in the terminal, one cell per pixel",
    after_help = hotkey_help()
)]
struct Cli {
    /// Output width in cells. Defaults to the terminal width.
    #[arg(long, value_name = "CELLS")]
    width: Option<u16>,

    /// Output height in cells. Defaults to the terminal height minus the status line.
    #[arg(long, value_name = "CELLS")]
    height: Option<u16>,

    /// Number of demo windows to open.
    #[arg(short = 'n', long, default_value_t = 4)]
    windows: usize,

    /// Treat every visible window as fully opaque.
    #[arg(long)]
    no_translucency: bool,

    /// Start with the pointer disabled.
    #[arg(long)]
    no_cursor: bool,

    #[arg(long, value_enum, default_value_t = Background::Color)]
    background: Background,

    /// Relative motion above this many cells per event is accelerated.
    #[arg(long, value_name = "CELLS")]
    accel_threshold: Option<i32>,

    /// Hotkey trigger. Latches: press once to hold, again to release.
    #[arg(long, default_value = "f12", value_parser = parse_trigger)]
    trigger: KeySymbol,

    #[arg(long, value_name = "DIR")]
    screenshot_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn hotkey_help() -> String {
    let bindings = HotkeyBindings::default()
        .entries()
        .into_iter()
        .map(|(key, hotkey)| format!("  {key:?}: {hotkey}"))
        .collect::<Vec<_>>()
        .join("\n");
    formatdoc! {"
        While the trigger is held:
          left drag: move, right drag: resize, middle drag: opacity
        {bindings}
        Ctrl+Q quits."
    }
}

fn parse_trigger(value: &str) -> Result<KeySymbol, String> {
    let lower = value.to_ascii_lowercase();
    let symbol = match lower.as_str() {
        "meta" => KeySymbol::Meta,
        "super" => KeySymbol::Super,
        "alt" => KeySymbol::Alt,
        "tab" => KeySymbol::Tab,
        "esc" | "escape" => KeySymbol::Escape,
        "insert" => KeySymbol::Insert,
        f if f.starts_with('f') && f.len() > 1 => f[1..]
            .parse::<u8>()
            .map(KeySymbol::F)
            .map_err(|_| format!("unknown function key `{value}`"))?,
        c if c.chars().count() == 1 => KeySymbol::Char(c.chars().next().unwrap_or(' ')),
        _ => return Err(format!("unknown trigger key `{value}`")),
    };
    Ok(symbol)
}

struct DemoConfig {
    stack: StackConfig,
    windows: usize,
    tiled: bool,
}

impl TryFrom<&Cli> for DemoConfig {
    type Error = String;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let (cols, rows) = terminal::size().unwrap_or((80, 24));
        let width = cli.width.unwrap_or(cols);
        let height = cli.height.unwrap_or(rows.saturating_sub(1));
        if width < 8 || height < 4 {
            return Err(format!("output {width}x{height} is too small"));
        }
        if cli.windows > MAX_WINDOWS {
            return Err(format!("at most {MAX_WINDOWS} windows"));
        }
        let tiled = matches!(cli.background, Background::Tile);
        let background = if tiled {
            BackgroundMode::Tile(SurfaceDesc::new(BACKGROUND_TILE, 4, 2, PixelFormat::Argb8888))
        } else {
            BackgroundMode::Color(Color::rgb(0x1c, 0x26, 0x36))
        };
        let mut accel = PointerAccel::default();
        if let Some(threshold) = cli.accel_threshold {
            if threshold < 0 {
                return Err("acceleration threshold must not be negative".to_string());
            }
            accel.threshold = threshold;
        }
        let stack = StackConfig {
            width: width as i32,
            height: height as i32,
            translucency: !cli.no_translucency,
            cursor_enabled: !cli.no_cursor,
            background,
            accel,
            hotkey_trigger: cli.trigger,
            screenshot_dir: cli.screenshot_dir.clone(),
            ..StackConfig::default()
        };
        stack.validate().map_err(|err| err.to_string())?;
        Ok(Self {
            stack,
            windows: cli.windows,
            tiled,
        })
    }
}

/// Staggered demo windows. The last one is shaped with a colorkeyed hole,
/// the first one is translucent.
fn open_windows(stack: &mut WindowStack<TerminalOutput>, count: usize) -> winstack::Result<()> {
    let bounds = stack.bounds();
    let (w, h) = ((bounds.width / 3).max(6), (bounds.height / 3).max(3));
    for i in 0..count {
        let id = i as u32 + 1;
        let color = PALETTE[i % PALETTE.len()];
        let shaped = count > 1 && i == count - 1;
        let surface = if shaped {
            TerminalSurface::from_fn(w, h, |x, y| {
                let hole = x > w / 3 && x < 2 * w / 3 && y > h / 3 && y < 2 * h / 3;
                if hole { KEY_COLOR } else { color }
            })
        } else {
            TerminalSurface::solid(w, h, color)
        };
        stack
            .output_mut()
            .add_surface(SurfaceId(id), surface.with_title(format!("window {id}")));

        let offset = i as i32 * 3;
        let mut window = Window::new(
            WindowId(id),
            Rect::new(2 + offset * 2, 1 + offset, w, h),
        )
        .with_surface(SurfaceDesc::new(SurfaceId(id), w, h, PixelFormat::Argb8888))
        .with_opacity(if i == 0 { 0xb0 } else { 0xff });
        if shaped {
            window = window
                .with_options(WindowOptions::SHAPED | WindowOptions::COLORKEYING)
                .with_colorkey(KEY_COLOR);
        }
        stack.add_window(window)?;
    }
    Ok(())
}

/// React to events the stack posted to window owners.
fn dispatch_events(stack: &mut WindowStack<TerminalOutput>) {
    for (id, event) in stack.output_mut().take_events() {
        match event {
            WindowEvent::Close => {
                let removed = stack
                    .set_opacity(id, 0)
                    .and_then(|()| stack.remove_window(id));
                if let Err(err) = removed {
                    tracing::warn!(window_id = ?id, %err, "close failed");
                    continue;
                }
                stack.output_mut().remove_surface(SurfaceId(id.0));
            }
            WindowEvent::Destroyed => {
                stack.output_mut().remove_surface(SurfaceId(id.0));
            }
            _ => {}
        }
    }
}

fn status_line(stack: &WindowStack<TerminalOutput>, normalizer: &EventNormalizer) -> String {
    let (x, y) = stack.cursor_position();
    format!(
        " focus {:?} | hover {:?} | cursor {x},{y} | trigger {} | {} windows | Ctrl+Q quits",
        stack.focused().map(|id| id.0),
        stack.entered().map(|id| id.0),
        if normalizer.trigger_latched() { "HELD" } else { "off" },
        stack.len(),
    )
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let demo = DemoConfig::try_from(&cli)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;
    tracing_sub::init_default(cli.log_file.as_deref())?;

    let mut output = TerminalOutput::new(demo.stack.width as u16, demo.stack.height as u16);
    if demo.tiled {
        output.add_surface(
            BACKGROUND_TILE,
            TerminalSurface::from_fn(4, 2, |x, y| {
                if (x / 2 + y) % 2 == 0 { 0xff22_2b3a } else { 0xff1a_2230 }
            }),
        );
    }
    let trigger = demo.stack.hotkey_trigger;
    let mut stack = WindowStack::new(demo.stack, output).map_err(io::Error::other)?;
    open_windows(&mut stack, demo.windows).map_err(io::Error::other)?;
    stack.repaint_all();

    let mut console = ConsoleOutputDriver::new()?;
    console.enter()?;
    let mut driver = ConsoleInputDriver::new();
    driver.set_mouse_capture(true)?;
    let mut normalizer = EventNormalizer::new(trigger);

    let result = EventLoop::new(driver, Duration::from_millis(16)).run(|_, event| match event {
        LoopEvent::Tick => {
            let status = status_line(&stack, &normalizer);
            console.draw(stack.output().front(), &status)?;
            Ok(ControlFlow::Continue)
        }
        LoopEvent::Input(Event::Key(key))
            if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Ok(ControlFlow::Quit)
        }
        LoopEvent::Input(event) => {
            for input in normalizer.normalize(event) {
                stack.handle_input(&input);
            }
            dispatch_events(&mut stack);
            Ok(ControlFlow::Continue)
        }
    });

    console.exit()?;
    drop(stack.close());
    result
}
