//! AOA-backed processors: HID reports over USB, for a device that accepts
//! the computer as a USB accessory. Positions are meaningless here, the
//! mouse is relative.

use std::sync::Arc;

use aoa::Aoa;
use hid::{HidGamepad, HidKeyboard, HidMouse};
use input_events::*;
use wire::Sequence;

use crate::{GamepadProcessor, KeyProcessor, MouseProcessor};

pub struct KeyboardAoa {
    aoa: Arc<Aoa>,
    hid: HidKeyboard,
    mod_lock_synchronized: bool,
}

impl KeyboardAoa {
    pub fn new(aoa: Arc<Aoa>) -> KeyboardAoa {
        // A session without a working keyboard is not worth keeping alive.
        if !aoa.push_open(HidKeyboard::generate_open(), true) {
            log::warn!("could not push AOA HID open (keyboard)");
        }
        KeyboardAoa { aoa, hid: HidKeyboard::new(), mod_lock_synchronized: false }
    }

    fn push_mod_lock_state(&mut self, mods: Mods) -> bool {
        let Some(input) = HidKeyboard::generate_input_from_mods(mods) else {
            return true; // nothing to synchronize
        };
        if !self.aoa.push_input(input) {
            log::warn!("could not push AOA HID input (mod lock state)");
            return false;
        }
        log::debug!("HID keyboard state synchronized");
        true
    }
}

impl KeyProcessor for KeyboardAoa {
    fn async_paste(&self) -> bool {
        // Clipboard synchronization runs over the control socket while the
        // keystroke goes over USB: the paste must wait for the ack.
        true
    }

    fn is_hid(&self) -> bool {
        true
    }

    fn process_key(&mut self, event: &KeyEvent, ack_to_wait: Option<Sequence>) {
        if event.repeat > 0 {
            // In the HID protocol, key repeat is handled by the host side
            // (Android), so repeats are not forwarded.
            return;
        }

        let Some(input) = self.hid.generate_input_from_key(event) else {
            return; // unsupported key
        };

        if !self.mod_lock_synchronized {
            // Inject CapsLock/NumLock if necessary so the device lock state
            // mirrors the host before the first real report.
            if self.push_mod_lock_state(event.mods) {
                self.mod_lock_synchronized = true;
            }
        }

        if !self.aoa.push_input_with_ack(input, ack_to_wait) {
            log::warn!("could not push AOA HID input (key)");
        }
    }
}

pub struct MouseAoa {
    aoa: Arc<Aoa>,
}

impl MouseAoa {
    pub fn new(aoa: Arc<Aoa>) -> MouseAoa {
        if !aoa.push_open(HidMouse::generate_open(), true) {
            log::warn!("could not push AOA HID open (mouse)");
        }
        MouseAoa { aoa }
    }
}

impl MouseProcessor for MouseAoa {
    fn relative_mode(&self) -> bool {
        true
    }

    fn process_mouse_motion(&mut self, event: &MouseMotionEvent) {
        if !self.aoa.push_input(HidMouse::generate_input_from_motion(event)) {
            log::warn!("could not push AOA HID input (mouse motion)");
        }
    }

    fn process_mouse_click(&mut self, event: &MouseClickEvent) {
        if !self.aoa.push_input(HidMouse::generate_input_from_click(event)) {
            log::warn!("could not push AOA HID input (mouse click)");
        }
    }

    fn process_mouse_scroll(&mut self, event: &MouseScrollEvent) {
        if !self.aoa.push_input(HidMouse::generate_input_from_scroll(event)) {
            log::warn!("could not push AOA HID input (mouse scroll)");
        }
    }

    // Touch events are not supported: coordinates are not relative.
}

pub struct GamepadAoa {
    aoa: Arc<Aoa>,
    hid: HidGamepad,
}

impl GamepadAoa {
    pub fn new(aoa: Arc<Aoa>) -> GamepadAoa {
        GamepadAoa { aoa, hid: HidGamepad::new() }
    }
}

impl GamepadProcessor for GamepadAoa {
    fn process_gamepad_device(&mut self, event: &GamepadDeviceEvent) {
        match event.action {
            GamepadDeviceAction::Added => {
                let Some(open) = self.hid.generate_open(event.gamepad_id) else {
                    return;
                };
                // A gamepad that fails to open must not kill the session.
                if !self.aoa.push_open(open, false) {
                    log::warn!("could not push AOA HID open (gamepad)");
                }
            }
            GamepadDeviceAction::Removed => {
                let Some(close) = self.hid.generate_close(event.gamepad_id) else {
                    return;
                };
                if !self.aoa.push_close(close) {
                    log::warn!("could not push AOA HID close (gamepad)");
                }
            }
        }
    }

    fn process_gamepad_axis(&mut self, event: &GamepadAxisEvent) {
        let Some(input) = self.hid.generate_input_from_axis(event) else {
            return;
        };
        if !self.aoa.push_input(input) {
            log::warn!("could not push AOA HID input (gamepad axis)");
        }
    }

    fn process_gamepad_button(&mut self, event: &GamepadButtonEvent) {
        let Some(input) = self.hid.generate_input_from_button(event) else {
            return;
        };
        if !self.aoa.push_input(input) {
            log::warn!("could not push AOA HID input (gamepad button)");
        }
    }
}
