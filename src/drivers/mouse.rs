use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use super::keyboard::modifiers_for;
use crate::input::{Axis, AxisMotion, Button, InputEvent};

fn button_for(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
        MouseButton::Middle => Button::Middle,
    }
}

/// Terminal mouse reports carry absolute cell positions; each becomes an
/// X/Y axis pair followed by the button or wheel event, if any.
pub fn translate(mouse: MouseEvent) -> Vec<InputEvent> {
    let modifiers = modifiers_for(mouse.modifiers);
    let mut out = vec![
        InputEvent::axis(Axis::X, AxisMotion::Absolute(mouse.column as i32))
            .following()
            .with_modifiers(modifiers),
        InputEvent::axis(Axis::Y, AxisMotion::Absolute(mouse.row as i32))
            .with_modifiers(modifiers),
    ];
    match mouse.kind {
        MouseEventKind::Down(button) => out.push(InputEvent::button_down(button_for(button))),
        MouseEventKind::Up(button) => out.push(InputEvent::button_up(button_for(button))),
        MouseEventKind::ScrollDown => {
            out.push(InputEvent::axis(Axis::Z, AxisMotion::Relative(1)))
        }
        MouseEventKind::ScrollUp => {
            out.push(InputEvent::axis(Axis::Z, AxisMotion::Relative(-1)))
        }
        MouseEventKind::Moved
        | MouseEventKind::Drag(_)
        | MouseEventKind::ScrollLeft
        | MouseEventKind::ScrollRight => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputKind, Press};
    use crossterm::event::KeyModifiers;

    #[test]
    fn click_moves_then_presses() {
        let out = translate(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            column: 5,
            row: 7,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(out.len(), 3);
        assert!(matches!(
            out[0].kind,
            InputKind::Axis {
                axis: Axis::X,
                motion: AxisMotion::Absolute(5),
                follow: true
            }
        ));
        assert!(matches!(
            out[1].kind,
            InputKind::Axis {
                axis: Axis::Y,
                follow: false,
                ..
            }
        ));
        assert_eq!(
            out[2].kind,
            InputKind::Button {
                press: Press::Down,
                button: Button::Right
            }
        );
    }
}
