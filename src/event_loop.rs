use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::InputDriver;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// What the loop hands to its handler.
pub enum LoopEvent {
    /// The poll interval passed; a good moment to redraw.
    Tick,
    Input(Event),
}

/// Single-threaded pump feeding terminal input to a window stack.
///
/// Every pass first delivers a [`LoopEvent::Tick`], then drains whatever
/// input is pending (at most `max_burst` events) before ticking again.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
    max_burst: usize,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
            max_burst: 256,
        }
    }

    pub fn with_max_burst(mut self, max_burst: usize) -> Self {
        self.max_burst = max_burst.max(1);
        self
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(&mut D, LoopEvent) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Tick)? {
                return Ok(());
            }
            if !self.driver.poll(self.poll_interval)? {
                continue;
            }
            // Bursts (drags, wheel) are drained together so drawing does not
            // fall behind the input stream.
            for _ in 0..self.max_burst {
                let event = self.driver.read()?;
                if let ControlFlow::Quit = handler(&mut self.driver, LoopEvent::Input(event))? {
                    return Ok(());
                }
                if !self.driver.poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::console::ConsoleInputDriver;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn queued_input_is_delivered_between_ticks() {
        let mut driver = ConsoleInputDriver::new();
        for c in ['a', 'b'] {
            driver.push_event(Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)));
        }
        let mut seen = Vec::new();
        let mut ticks = 0;
        EventLoop::new(driver, Duration::ZERO)
            .run(|_, event| {
                match event {
                    LoopEvent::Tick => ticks += 1,
                    LoopEvent::Input(Event::Key(k)) => seen.push(k.code),
                    LoopEvent::Input(_) => {}
                }
                Ok(if seen.len() == 2 {
                    ControlFlow::Quit
                } else {
                    ControlFlow::Continue
                })
            })
            .unwrap();
        assert_eq!(seen, vec![KeyCode::Char('a'), KeyCode::Char('b')]);
        assert_eq!(ticks, 1);
    }
}
