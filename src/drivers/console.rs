use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;

use super::InputDriver;
use super::keyboard::KeyTranslator;
use super::mouse;
use crate::input::{InputEvent, KeySymbol};

/// Raw terminal events, with a small queue in front for replays and tests.
pub struct ConsoleInputDriver {
    event_queue: VecDeque<Event>,
}

impl Default for ConsoleInputDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self {
            event_queue: VecDeque::new(),
        }
    }

    pub fn push_event(&mut self, event: Event) {
        self.event_queue.push_back(event);
    }
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.event_queue.is_empty() {
            return Ok(true);
        }
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        if let Some(evt) = self.event_queue.pop_front() {
            return Ok(evt);
        }
        crossterm::event::read()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        if enabled {
            execute!(io::stdout(), EnableMouseCapture)
        } else {
            execute!(io::stdout(), DisableMouseCapture)
        }
    }
}

/// Turns terminal events into the stack's normalized input events.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    keys: KeyTranslator,
}

impl EventNormalizer {
    pub fn new(trigger: KeySymbol) -> Self {
        Self {
            keys: KeyTranslator::new(trigger),
        }
    }

    pub fn trigger_latched(&self) -> bool {
        self.keys.latched()
    }

    pub fn normalize(&mut self, event: Event) -> Vec<InputEvent> {
        match event {
            Event::Key(key) => self.keys.translate(key),
            Event::Mouse(m) => mouse::translate(m),
            _ => Vec::new(),
        }
    }
}

/// Full-screen terminal that shows a composited cell buffer plus one
/// status line.
pub struct ConsoleOutputDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    entered: bool,
}

impl ConsoleOutputDriver {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            entered: false,
        })
    }

    pub fn enter(&mut self) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        self.terminal.hide_cursor()?;
        self.entered = true;
        Ok(())
    }

    pub fn exit(&mut self) -> io::Result<()> {
        if !self.entered {
            return Ok(());
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        self.entered = false;
        Ok(())
    }

    pub fn draw(&mut self, composite: &Buffer, status: &str) -> io::Result<()> {
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                let buf = frame.buffer_mut();
                let height = area.height.saturating_sub(1);
                for y in 0..height.min(composite.area.height) {
                    for x in 0..area.width.min(composite.area.width) {
                        if let Some(src) = composite.cell((x, y))
                            && let Some(dst) = buf.cell_mut((area.x + x, area.y + y))
                        {
                            *dst = src.clone();
                        }
                    }
                }
                let status_area = Rect::new(area.x, area.y + height, area.width, 1);
                frame.render_widget(Line::raw(status), status_area);
            })
            .map(|_| ())
            .map_err(|err| io::Error::other(err.to_string()))
    }
}

impl Drop for ConsoleOutputDriver {
    fn drop(&mut self) {
        let _ = self.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

    #[test]
    fn poll_and_read_from_queue() {
        let mut d = ConsoleInputDriver::new();
        d.push_event(Event::Key(KeyEvent::new(
            KeyCode::Char('z'),
            KeyModifiers::NONE,
        )));
        assert!(d.poll(Duration::from_millis(0)).unwrap());
        let ev = d.read().unwrap();
        if let Event::Key(k) = ev {
            assert_eq!(k.code, KeyCode::Char('z'));
        } else {
            panic!("expected key");
        }
    }

    #[test]
    fn normalizer_handles_keys_mouse_and_ignores_resize() {
        let mut n = EventNormalizer::new(KeySymbol::F(12));
        let keys = n.normalize(Event::Key(KeyEvent::new(
            KeyCode::F(12),
            KeyModifiers::NONE,
        )));
        assert_eq!(keys.len(), 1);
        assert!(n.trigger_latched());
        let mouse = n.normalize(Event::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column: 1,
            row: 2,
            modifiers: KeyModifiers::NONE,
        }));
        assert_eq!(mouse.len(), 2);
        assert!(n.normalize(Event::Resize(10, 20)).is_empty());
    }
}
