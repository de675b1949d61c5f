//! Inject processors: input forwarded as Android events over the control
//! socket. This is the default path, available without USB and without the
//! device-side UHID support.

use std::sync::Arc;

use control::Controller;
use input_events::*;
use wire::{android, ControlMsg, Sequence};

use crate::{KeyProcessor, MouseProcessor};

fn metastate_from_mods(mods: Mods) -> u32 {
    let mut metastate = 0;
    if mods.shift() {
        metastate |= android::META_SHIFT_ON;
    }
    if mods.ctrl() {
        metastate |= android::META_CTRL_ON;
    }
    if mods.alt() {
        metastate |= android::META_ALT_ON;
    }
    if mods.intersects(Mods::LSUPER | Mods::RSUPER) {
        metastate |= android::META_META_ON;
    }
    if mods.contains(Mods::CAPS) {
        metastate |= android::META_CAPS_LOCK_ON;
    }
    if mods.contains(Mods::NUM) {
        metastate |= android::META_NUM_LOCK_ON;
    }
    metastate
}

fn android_keycode(keycode: Keycode) -> Option<u32> {
    use Keycode::*;
    let code = match keycode {
        A => android::KEYCODE_A,
        B => android::KEYCODE_A + 1,
        C => android::KEYCODE_A + 2,
        D => android::KEYCODE_A + 3,
        E => android::KEYCODE_A + 4,
        F => android::KEYCODE_A + 5,
        G => android::KEYCODE_A + 6,
        H => android::KEYCODE_A + 7,
        I => android::KEYCODE_A + 8,
        J => android::KEYCODE_A + 9,
        K => android::KEYCODE_A + 10,
        L => android::KEYCODE_A + 11,
        M => android::KEYCODE_A + 12,
        N => android::KEYCODE_A + 13,
        O => android::KEYCODE_A + 14,
        P => android::KEYCODE_A + 15,
        Q => android::KEYCODE_A + 16,
        R => android::KEYCODE_A + 17,
        S => android::KEYCODE_A + 18,
        T => android::KEYCODE_A + 19,
        U => android::KEYCODE_A + 20,
        V => android::KEYCODE_A + 21,
        W => android::KEYCODE_A + 22,
        X => android::KEYCODE_A + 23,
        Y => android::KEYCODE_A + 24,
        Z => android::KEYCODE_A + 25,
        Num0 => android::KEYCODE_0,
        Num1 => android::KEYCODE_0 + 1,
        Num2 => android::KEYCODE_0 + 2,
        Num3 => android::KEYCODE_0 + 3,
        Num4 => android::KEYCODE_0 + 4,
        Num5 => android::KEYCODE_0 + 5,
        Num6 => android::KEYCODE_0 + 6,
        Num7 => android::KEYCODE_0 + 7,
        Num8 => android::KEYCODE_0 + 8,
        Num9 => android::KEYCODE_0 + 9,
        Return => android::KEYCODE_ENTER,
        Escape => android::KEYCODE_ESCAPE,
        Backspace => android::KEYCODE_DEL,
        Tab => android::KEYCODE_TAB,
        Space => android::KEYCODE_SPACE,
        Up => android::KEYCODE_DPAD_UP,
        Down => android::KEYCODE_DPAD_DOWN,
        Left => android::KEYCODE_DPAD_LEFT,
        Right => android::KEYCODE_DPAD_RIGHT,
        Home => android::KEYCODE_MOVE_HOME,
        End => android::KEYCODE_MOVE_END,
        PageUp => android::KEYCODE_PAGE_UP,
        PageDown => android::KEYCODE_PAGE_DOWN,
        Insert => android::KEYCODE_INSERT,
        Delete => android::KEYCODE_FORWARD_DEL,
        LCtrl => android::KEYCODE_CTRL_LEFT,
        RCtrl => android::KEYCODE_CTRL_RIGHT,
        LShift => android::KEYCODE_SHIFT_LEFT,
        RShift => android::KEYCODE_SHIFT_RIGHT,
        LAlt => android::KEYCODE_ALT_LEFT,
        RAlt => android::KEYCODE_ALT_RIGHT,
        LSuper => android::KEYCODE_META_LEFT,
        RSuper => android::KEYCODE_META_RIGHT,
        Unknown => return None,
    };
    Some(code)
}

/// Letter, digit and space keys normally reach the device as text events,
/// which respect the host keyboard layout. They are only injected as
/// keycodes when a non-text modifier is involved.
fn is_char_key(keycode: Keycode) -> bool {
    use Keycode::*;
    matches!(
        keycode,
        A | B | C | D | E | F | G | H | I | J | K | L | M | N | O | P | Q | R | S | T | U | V
            | W | X | Y | Z | Num0 | Num1 | Num2 | Num3 | Num4 | Num5 | Num6 | Num7 | Num8
            | Num9 | Space
    )
}

pub struct KeyboardInject {
    controller: Arc<Controller>,
}

impl KeyboardInject {
    pub fn new(controller: Arc<Controller>) -> KeyboardInject {
        KeyboardInject { controller }
    }
}

impl KeyProcessor for KeyboardInject {
    fn process_key(&mut self, event: &KeyEvent, _ack_to_wait: Option<Sequence>) {
        // The inject path has no ack to wait for: SetClipboard and the key
        // event travel the same socket in order.
        let ctrl_or_meta = event.mods.ctrl() || event.mods.intersects(Mods::LSUPER | Mods::RSUPER);
        if is_char_key(event.keycode) && !ctrl_or_meta {
            // Covered by the corresponding text event.
            return;
        }
        let Some(keycode) = android_keycode(event.keycode) else {
            return;
        };
        let msg = ControlMsg::InjectKeycode {
            action: match event.action {
                Action::Down => android::KEY_EVENT_ACTION_DOWN,
                Action::Up => android::KEY_EVENT_ACTION_UP,
            },
            keycode,
            repeat: event.repeat as u32,
            metastate: metastate_from_mods(event.mods),
        };
        if !self.controller.push_msg(msg) {
            log::warn!("could not inject key event");
        }
    }

    fn process_text(&mut self, event: &TextEvent) {
        if event.text.is_empty() {
            return;
        }
        let msg = ControlMsg::InjectText { text: event.text.clone() };
        if !self.controller.push_msg(msg) {
            log::warn!("could not inject text");
        }
    }
}

pub struct MouseInject {
    controller: Arc<Controller>,
}

impl MouseInject {
    pub fn new(controller: Arc<Controller>) -> MouseInject {
        MouseInject { controller }
    }

    fn push(&self, msg: ControlMsg, name: &str) {
        if !self.controller.push_msg(msg) {
            log::warn!("could not inject {name}");
        }
    }
}

fn android_buttons(buttons: MouseButtons) -> u32 {
    let mut out = 0;
    for (mask, android_button) in [
        (MouseButtons::LEFT, android::MOTION_EVENT_BUTTON_PRIMARY),
        (MouseButtons::RIGHT, android::MOTION_EVENT_BUTTON_SECONDARY),
        (MouseButtons::MIDDLE, android::MOTION_EVENT_BUTTON_TERTIARY),
        (MouseButtons::X1, android::MOTION_EVENT_BUTTON_BACK),
        (MouseButtons::X2, android::MOTION_EVENT_BUTTON_FORWARD),
    ] {
        if buttons.contains(mask) {
            out |= android_button;
        }
    }
    out
}

fn android_button(button: MouseButton) -> u32 {
    android_buttons(button.mask())
}

impl MouseProcessor for MouseInject {
    fn process_mouse_motion(&mut self, event: &MouseMotionEvent) {
        let msg = ControlMsg::InjectTouch {
            action: android::MOTION_EVENT_ACTION_MOVE,
            pointer_id: event.pointer_id,
            position: event.position,
            pressure: if event.buttons.is_empty() { 0.0 } else { 1.0 },
            action_button: 0,
            buttons: android_buttons(event.buttons),
        };
        self.push(msg, "mouse motion");
    }

    fn process_mouse_click(&mut self, event: &MouseClickEvent) {
        let down = event.action == Action::Down;
        let msg = ControlMsg::InjectTouch {
            action: if down {
                android::MOTION_EVENT_ACTION_DOWN
            } else {
                android::MOTION_EVENT_ACTION_UP
            },
            pointer_id: event.pointer_id,
            position: event.position,
            pressure: if down { 1.0 } else { 0.0 },
            action_button: android_button(event.button),
            buttons: android_buttons(event.buttons),
        };
        self.push(msg, "mouse click");
    }

    fn process_mouse_scroll(&mut self, event: &MouseScrollEvent) {
        let msg = ControlMsg::InjectScroll {
            position: event.position,
            hscroll: event.hscroll.clamp(-1.0, 1.0),
            vscroll: event.vscroll.clamp(-1.0, 1.0),
            buttons: android_buttons(event.buttons),
        };
        self.push(msg, "mouse scroll");
    }

    fn process_touch(&mut self, event: &TouchEvent) {
        let msg = ControlMsg::InjectTouch {
            action: match event.action {
                TouchAction::Down => android::MOTION_EVENT_ACTION_DOWN,
                TouchAction::Up => android::MOTION_EVENT_ACTION_UP,
                TouchAction::Move => android::MOTION_EVENT_ACTION_MOVE,
            },
            pointer_id: event.pointer_id,
            position: event.position,
            pressure: event.pressure,
            action_button: 0,
            buttons: 0,
        };
        self.push(msg, "touch event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_keys_defer_to_text_events() {
        assert!(is_char_key(Keycode::A));
        assert!(!is_char_key(Keycode::Return));
        assert!(!is_char_key(Keycode::LCtrl));
    }

    #[test]
    fn metastate_mapping() {
        let mods = Mods::LCTRL | Mods::RSHIFT | Mods::CAPS;
        let meta = metastate_from_mods(mods);
        assert_ne!(meta & android::META_CTRL_ON, 0);
        assert_ne!(meta & android::META_SHIFT_ON, 0);
        assert_ne!(meta & android::META_CAPS_LOCK_ON, 0);
        assert_eq!(meta & android::META_ALT_ON, 0);
    }

    #[test]
    fn keycode_table_covers_navigation() {
        assert_eq!(android_keycode(Keycode::Z), Some(android::KEYCODE_A + 25));
        assert_eq!(android_keycode(Keycode::Num9), Some(android::KEYCODE_9));
        assert_eq!(android_keycode(Keycode::Delete), Some(android::KEYCODE_FORWARD_DEL));
        assert_eq!(android_keycode(Keycode::Unknown), None);
    }

    #[test]
    fn button_masks_map() {
        assert_eq!(android_button(MouseButton::Left), android::MOTION_EVENT_BUTTON_PRIMARY);
        let both = MouseButtons::LEFT | MouseButtons::MIDDLE;
        assert_eq!(
            android_buttons(both),
            android::MOTION_EVENT_BUTTON_PRIMARY | android::MOTION_EVENT_BUTTON_TERTIARY
        );
    }
}
