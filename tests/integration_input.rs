mod common;

use common::{move_pointer, stack, stack_with, window};
use winstack::config::StackConfig;
use winstack::constants::MAX_IMPLICIT_KEY_GRABS;
use winstack::error::StackError;
use winstack::geometry::Rect;
use winstack::input::{Axis, AxisMotion, Button, DragMode, InputEvent, KeySymbol, Modifiers};
use winstack::window::{
    PixelFormat, PointerPos, SurfaceDesc, SurfaceId, WindowEvent, WindowId, WindowOptions,
};

const A: WindowId = WindowId(1);
const B: WindowId = WindowId(2);

fn key_downs(events: &[WindowEvent]) -> usize {
    events
        .iter()
        .filter(|ev| matches!(ev, WindowEvent::KeyDown(_)))
        .count()
}

#[test]
fn release_follows_press_across_focus_change() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();
    assert_eq!(s.focused(), Some(A));

    s.handle_input(&InputEvent::key_down(KeySymbol::Char('a'), Some(30)));
    s.request_focus(B).unwrap();
    s.output_mut().clear();
    s.handle_input(&InputEvent::key_up(KeySymbol::Char('a'), Some(30)));

    let events = s.output().events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, A);
    assert!(matches!(events[0].1, WindowEvent::KeyUp(info) if info.code == Some(30)));
}

#[test]
fn release_for_removed_window_is_dropped() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('b'), Some(48)));
    s.set_opacity(A, 0).unwrap();
    s.remove_window(A).unwrap();
    s.output_mut().clear();

    s.handle_input(&InputEvent::key_up(KeySymbol::Char('b'), Some(48)));
    assert!(s.output().events().is_empty());
}

#[test]
fn second_grabs_are_locked() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();

    s.grab_pointer(A).unwrap();
    assert!(s.grab_pointer(B).unwrap_err().is_locked());
    assert_eq!(s.grabs().pointer(), Some(A));

    s.grab_keyboard(B).unwrap();
    assert!(s.grab_keyboard(A).unwrap_err().is_locked());
    assert_eq!(s.grabs().keyboard(), Some(B));

    assert!(matches!(s.ungrab_pointer(B), Err(StackError::NotFound(_))));
    s.ungrab_pointer(A).unwrap();
    s.grab_pointer(B).unwrap();
}

#[test]
fn keyboard_grab_beats_focus() {
    let mut s = stack(100, 100);
    let (v, w) = (A, B);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();
    assert_eq!(s.focused(), Some(v));
    s.grab_keyboard(w).unwrap();
    s.output_mut().clear();

    s.handle_input(&InputEvent::key_down(KeySymbol::Char('x'), None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('y'), Some(21)));

    assert_eq!(key_downs(&s.output().events_for(w)), 2);
    assert_eq!(key_downs(&s.output().events_for(v)), 0);
}

#[test]
fn explicit_key_grab_routes_matching_modifiers_only() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();
    s.grab_key(B, KeySymbol::Char('s'), Modifiers::CONTROL).unwrap();
    s.output_mut().clear();

    let ctrl_s = InputEvent::key_down(KeySymbol::Char('s'), Some(31)).with_modifiers(Modifiers::CONTROL);
    s.handle_input(&ctrl_s);
    let plain_s = InputEvent::key_down(KeySymbol::Char('s'), Some(32)).with_modifiers(Modifiers::empty());
    s.handle_input(&plain_s);

    assert_eq!(key_downs(&s.output().events_for(B)), 1);
    assert_eq!(key_downs(&s.output().events_for(A)), 1);
}

#[test]
fn pointer_grab_gets_motion_without_crossing_events() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(0, 0, 50, 50))).unwrap();
    s.add_window(window(2, Rect::new(100, 100, 50, 50))).unwrap();
    assert_eq!(s.entered(), Some(B));
    s.grab_pointer(A).unwrap();
    s.output_mut().clear();

    move_pointer(&mut s, 120, 130);

    assert_eq!(
        s.output().events(),
        &[(
            A,
            WindowEvent::Motion(PointerPos {
                x: 120,
                y: 130,
                cx: 120,
                cy: 130
            })
        )]
    );
    assert_eq!(s.entered(), Some(B));
}

#[test]
fn ninth_simultaneous_key_is_dropped() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.output_mut().clear();
    for code in 1..=9 {
        s.handle_input(&InputEvent::key_down(KeySymbol::Other(code), Some(code)));
    }
    assert_eq!(key_downs(&s.output().events_for(A)), MAX_IMPLICIT_KEY_GRABS);
    assert_eq!(s.grabs().implicit().len(), MAX_IMPLICIT_KEY_GRABS);
    assert_eq!(s.grabs().implicit_owner(9), None);
}

#[test]
fn hover_follows_pointer_with_enter_and_leave() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(0, 0, 50, 50))).unwrap();
    s.add_window(window(2, Rect::new(100, 100, 50, 50))).unwrap();
    s.output_mut().clear();

    move_pointer(&mut s, 10, 10);
    assert_eq!(s.entered(), Some(A));
    let events = s.output().events();
    assert!(matches!(events[0], (id, WindowEvent::Leave(_)) if id == B));
    assert!(matches!(events[1], (id, WindowEvent::Enter(p)) if id == A && p.x == 10));
    assert!(matches!(events[2], (id, WindowEvent::Motion(_)) if id == A));
}

#[test]
fn relative_motion_is_accelerated_and_clamped() {
    let mut s = stack(100, 100);
    assert_eq!(s.cursor_position(), (50, 50));
    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Relative(3)));
    assert_eq!(s.cursor_position(), (53, 50));
    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Relative(10)));
    assert_eq!(s.cursor_position(), (73, 50));
    s.handle_input(&InputEvent::axis(Axis::Y, AxisMotion::Relative(-500)));
    assert_eq!(s.cursor_position(), (73, 0));
}

#[test]
fn click_focuses_and_forwards_button() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(0, 0, 50, 50))).unwrap();
    s.add_window(window(2, Rect::new(100, 100, 50, 50))).unwrap();
    assert_eq!(s.focused(), Some(A));
    s.output_mut().clear();

    s.handle_input(&InputEvent::button_down(Button::Left));
    assert_eq!(s.focused(), Some(B));
    let b_events = s.output().events_for(B);
    assert_eq!(b_events[0], WindowEvent::GotFocus);
    assert!(matches!(
        b_events[1],
        WindowEvent::ButtonDown { button: Button::Left, buttons, .. } if buttons.contains(Button::Left.mask())
    ));
}

#[test]
fn ghost_windows_are_not_hit_or_focused() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 100, 100))).unwrap();
    s.add_window(window(2, Rect::new(0, 0, 100, 100)).with_options(WindowOptions::GHOST))
        .unwrap();
    assert_eq!(s.window_at(5, 5), Some(A));
    assert!(matches!(
        s.request_focus(B),
        Err(StackError::InvalidArgument(_))
    ));
}

#[test]
fn shaped_windows_hit_only_where_not_transparent() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    let shaped = window(2, Rect::new(0, 0, 10, 10))
        .with_surface(SurfaceDesc::new(SurfaceId(2), 5, 5, PixelFormat::Argb8888))
        .with_options(WindowOptions::SHAPED | WindowOptions::ALPHACHANNEL);
    s.add_window(shaped).unwrap();
    // Window pixel (4,4) samples surface pixel (2,2).
    s.output_mut().set_pixel(SurfaceId(2), 2, 2, 0x00ff_ffff);
    s.output_mut().set_pixel(SurfaceId(2), 3, 3, 0x80ff_ffff);

    assert_eq!(s.window_at(4, 4), Some(A));
    assert_eq!(s.window_at(6, 6), Some(B));
    // Unreadable pixels count as hits.
    assert_eq!(s.window_at(0, 0), Some(B));

    s.set_opaque_region(B, Some(Rect::new(4, 4, 1, 1))).unwrap();
    assert_eq!(s.window_at(4, 4), Some(B));
}

#[test]
fn colorkeyed_shape_is_transparent_at_key() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    let keyed = window(2, Rect::new(0, 0, 10, 10))
        .with_options(WindowOptions::SHAPED | WindowOptions::COLORKEYING)
        .with_colorkey(0x00ff00);
    s.add_window(keyed).unwrap();
    s.output_mut().set_pixel(SurfaceId(2), 1, 1, 0x00ff00);
    s.output_mut().set_pixel(SurfaceId(2), 2, 2, 0x0000ff);
    assert_eq!(s.window_at(1, 1), Some(A));
    assert_eq!(s.window_at(2, 2), Some(B));
}

#[test]
fn disabled_cursor_targets_topmost_and_ignores_buttons() {
    let mut s = stack_with(StackConfig {
        cursor_enabled: false,
        ..StackConfig::default().with_size(100, 100)
    });
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(80, 80, 10, 10))).unwrap();
    assert_eq!(s.window_at(5, 5), Some(B));
    s.output_mut().clear();
    s.handle_input(&InputEvent::button_down(Button::Left));
    assert!(s.output().events().is_empty());
}

#[test]
fn trigger_drag_moves_hovered_window() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50))).unwrap();
    s.add_window(window(2, Rect::new(0, 0, 10, 10))).unwrap();
    assert_eq!(s.entered(), Some(A));
    s.output_mut().clear();

    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::button_down(Button::Left));
    assert_eq!(s.hotkeys().drag(), DragMode::Move(A));
    assert_eq!(s.order().last(), Some(&A));

    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Relative(3)));
    assert_eq!(s.window(A).unwrap().bounds, Rect::new(83, 80, 50, 50));

    s.handle_input(&InputEvent::button_up(Button::Left));
    assert_eq!(s.hotkeys().drag(), DragMode::None);
    s.handle_input(&InputEvent::key_up(KeySymbol::Meta, None));

    let a_events = s.output().events_for(A);
    assert!(a_events.contains(&WindowEvent::PositionSize(Rect::new(83, 80, 50, 50))));
    assert!(
        !a_events
            .iter()
            .any(|ev| matches!(ev, WindowEvent::ButtonDown { .. } | WindowEvent::ButtonUp { .. }))
    );
}

#[test]
fn trigger_drag_respects_keep_size() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50)).with_options(WindowOptions::KEEP_SIZE))
        .unwrap();
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::button_down(Button::Right));
    assert_eq!(s.hotkeys().drag(), DragMode::None);
    s.handle_input(&InputEvent::button_down(Button::Middle));
    assert_eq!(s.hotkeys().drag(), DragMode::Opacity(A));
    s.handle_input(&InputEvent::axis(Axis::Y, AxisMotion::Relative(2)));
    assert_eq!(s.window(A).unwrap().opacity, 0xfd);
}

#[test]
fn close_and_destroy_hotkeys() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50))).unwrap();
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('c'), None));
    assert_eq!(s.output().events_for(A).last(), Some(&WindowEvent::Close));

    s.handle_input(&InputEvent::key_down(KeySymbol::Char('d'), None));
    assert!(s.window(A).is_none());
    assert_eq!(s.output().events_for(A).last(), Some(&WindowEvent::Destroyed));
    assert_eq!(s.entered(), None);
}

#[test]
fn indestructible_windows_ignore_close_hotkeys() {
    let mut s = stack(200, 200);
    s.add_window(
        window(1, Rect::new(80, 80, 50, 50)).with_options(WindowOptions::INDESTRUCTIBLE),
    )
    .unwrap();
    s.output_mut().clear();
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('c'), None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('d'), None));
    assert!(s.window(A).is_some());
    assert!(s.output().events().is_empty());
}

#[test]
fn cycle_hotkey_walks_windows_top_down() {
    let mut s = stack(200, 200);
    for id in 1..=3 {
        s.add_window(window(id, Rect::new(id as i32 * 20, 0, 10, 10)))
            .unwrap();
    }
    assert_eq!(s.focused(), Some(A));
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    let mut seen = Vec::new();
    for _ in 0..3 {
        s.handle_input(&InputEvent::key_down(KeySymbol::Char('x'), None));
        s.handle_input(&InputEvent::key_up(KeySymbol::Char('x'), None));
        seen.push(s.focused().unwrap());
    }
    assert_eq!(seen, vec![WindowId(3), WindowId(2), WindowId(1)]);
    assert_eq!(s.order().last(), Some(&A));
}

#[test]
fn hotkeys_are_not_forwarded_but_other_keys_are() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.output_mut().clear();
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, Some(125)));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('e'), Some(18)));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('j'), Some(36)));
    let events = s.output().events_for(A);
    assert_eq!(key_downs(&events), 1);
    assert!(matches!(events[0], WindowEvent::KeyDown(info) if info.symbol == KeySymbol::Char('j')));
}

#[test]
fn release_pointer_hotkey_breaks_grab_and_enables_cursor() {
    let mut s = stack_with(StackConfig {
        cursor_enabled: false,
        ..StackConfig::default().with_size(100, 100)
    });
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.grab_pointer(A).unwrap();
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('p'), None));
    assert!(s.cursor_enabled());
    assert_eq!(s.grabs().pointer(), None);
}

#[test]
fn wheel_with_trigger_changes_opacity() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50))).unwrap();
    s.handle_input(&InputEvent::axis(Axis::Z, AxisMotion::Relative(2)));
    assert!(matches!(
        s.output().events_for(A).last(),
        Some(WindowEvent::Wheel { step: 2, .. })
    ));
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::axis(Axis::Z, AxisMotion::Relative(2)));
    assert_eq!(s.window(A).unwrap().opacity, 0xff - 16);
}

#[test]
fn warp_cursor_updates_hover() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(0, 0, 50, 50))).unwrap();
    s.warp_cursor(10, 10);
    assert_eq!(s.entered(), Some(A));
    s.warp_cursor(500, -3);
    assert_eq!(s.cursor_position(), (199, 0));
    assert_eq!(s.entered(), None);
}

#[test]
fn key_released_under_trigger_still_frees_its_slot() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.add_window(window(2, Rect::new(20, 0, 10, 10))).unwrap();
    assert_eq!(s.focused(), Some(A));

    // `x` is a hotkey symbol, but this press happened before the trigger.
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('x'), Some(45)));
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_up(KeySymbol::Char('x'), Some(45)));
    s.handle_input(&InputEvent::key_up(KeySymbol::Meta, None));

    assert!(s.grabs().implicit().is_empty());
    assert!(matches!(
        s.output().events_for(A).last(),
        Some(WindowEvent::KeyUp(info)) if info.code == Some(45)
    ));

    s.request_focus(B).unwrap();
    s.output_mut().clear();
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('x'), Some(45)));
    assert_eq!(key_downs(&s.output().events_for(B)), 1);
    assert_eq!(key_downs(&s.output().events_for(A)), 0);
    assert_eq!(s.grabs().implicit_owner(45), Some(B));
}

#[test]
fn hotkey_release_after_trigger_is_swallowed() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    s.output_mut().clear();

    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_down(KeySymbol::Char('a'), Some(30)));
    s.handle_input(&InputEvent::key_up(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::key_up(KeySymbol::Char('a'), Some(30)));
    assert!(s.output().events().iter().all(|(_, ev)| !ev.is_key()));

    s.handle_input(&InputEvent::key_down(KeySymbol::Char('a'), Some(30)));
    assert_eq!(key_downs(&s.output().events_for(A)), 1);
    assert_eq!(s.grabs().implicit_owner(30), Some(A));
}

#[test]
fn repeated_trigger_sequences_do_not_exhaust_slots() {
    let mut s = stack(100, 100);
    s.add_window(window(1, Rect::new(0, 0, 10, 10))).unwrap();
    for code in 40..(40 + 2 * MAX_IMPLICIT_KEY_GRABS as u32) {
        s.handle_input(&InputEvent::key_down(KeySymbol::Char('w'), Some(code)));
        s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
        s.handle_input(&InputEvent::key_up(KeySymbol::Char('w'), Some(code)));
        s.handle_input(&InputEvent::key_up(KeySymbol::Meta, None));
    }
    assert!(s.grabs().implicit().is_empty());
}

#[test]
fn extreme_relative_motion_saturates() {
    let mut s = stack(100, 100);
    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Relative(i32::MIN)));
    assert_eq!(s.cursor_position(), (0, 50));
    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Relative(i32::MAX)));
    assert_eq!(s.cursor_position(), (99, 50));

    s.handle_input(&InputEvent::axis(Axis::Y, AxisMotion::Relative(i32::MAX)).following());
    s.handle_input(&InputEvent::axis(Axis::Y, AxisMotion::Relative(i32::MAX)).following());
    s.handle_input(&InputEvent::axis(Axis::X, AxisMotion::Absolute(10)));
    assert_eq!(s.cursor_position(), (10, 99));
}

#[test]
fn extreme_wheel_steps_clamp_opacity() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50))).unwrap();
    s.handle_input(&InputEvent::axis(Axis::Z, AxisMotion::Relative(i32::MIN)));
    assert!(matches!(
        s.output().events_for(A).last(),
        Some(WindowEvent::Wheel { step: i32::MIN, .. })
    ));

    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::axis(Axis::Z, AxisMotion::Relative(i32::MAX)));
    assert_eq!(s.window(A).unwrap().opacity, 1);
    s.handle_input(&InputEvent::axis(Axis::Z, AxisMotion::Relative(i32::MIN)));
    assert_eq!(s.window(A).unwrap().opacity, 0xff);
}

#[test]
fn button_release_follows_its_press_across_trigger_changes() {
    let mut s = stack(200, 200);
    s.add_window(window(1, Rect::new(80, 80, 50, 50))).unwrap();
    s.output_mut().clear();

    // Drag press under the trigger, release after it: never forwarded.
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::button_down(Button::Left));
    assert_eq!(s.hotkeys().drag(), DragMode::Move(A));
    s.handle_input(&InputEvent::key_up(KeySymbol::Meta, None));
    assert_eq!(s.hotkeys().drag(), DragMode::None);
    s.handle_input(&InputEvent::button_up(Button::Left));
    assert!(
        !s.output()
            .events_for(A)
            .iter()
            .any(|ev| matches!(ev, WindowEvent::ButtonDown { .. } | WindowEvent::ButtonUp { .. }))
    );

    // Plain press, release under the trigger: forwarded.
    s.handle_input(&InputEvent::button_down(Button::Left));
    s.handle_input(&InputEvent::key_down(KeySymbol::Meta, None));
    s.handle_input(&InputEvent::button_up(Button::Left));
    let a_events = s.output().events_for(A);
    assert!(matches!(
        a_events[a_events.len() - 2],
        WindowEvent::ButtonDown { button: Button::Left, .. }
    ));
    assert!(matches!(
        a_events.last(),
        Some(WindowEvent::ButtonUp { button: Button::Left, .. })
    ));
}
