//! HID keyboard reports.
//!
//! A keyboard input report is 8 bytes:
//!
//!  - byte 0: modifiers (1 flag per modifier key)
//!  - byte 1: reserved (always 0)
//!  - bytes 2 to 7: pressed keys (6 at most)
//!
//! If fewer than 6 keys are pressed the remaining slots are 0. Pressing more
//! than 6 keys reports the phantom state: all six slots set to the 0x01
//! roll-over error code, modifiers preserved.

use input_events::{Action, KeyEvent, Mods, Scancode};

use crate::{HidClose, HidInput, HidOpen, HID_ID_KEYBOARD};

/// Keys tracked by scancode; HID usage ids 0..=101 cover every key on a
/// boot-protocol keyboard.
pub const KEYBOARD_KEYS: usize = 102;

const MAX_KEYS: usize = 6;
const INDEX_MODS: usize = 0;
const INDEX_KEYS: usize = 2;
const INPUT_SIZE: usize = INDEX_KEYS + MAX_KEYS;
const ERROR_ROLL_OVER: u8 = 0x01;

bitflags::bitflags! {
    struct HidMods: u8 {
        const LEFT_CONTROL = 1 << 0;
        const LEFT_SHIFT = 1 << 1;
        const LEFT_ALT = 1 << 2;
        const LEFT_GUI = 1 << 3;
        const RIGHT_CONTROL = 1 << 4;
        const RIGHT_SHIFT = 1 << 5;
        const RIGHT_ALT = 1 << 6;
        const RIGHT_GUI = 1 << 7;
    }
}

fn hid_mods_from_mods(mods: Mods) -> HidMods {
    let mut out = HidMods::empty();
    for (host, hid) in [
        (Mods::LCTRL, HidMods::LEFT_CONTROL),
        (Mods::LSHIFT, HidMods::LEFT_SHIFT),
        (Mods::LALT, HidMods::LEFT_ALT),
        (Mods::LSUPER, HidMods::LEFT_GUI),
        (Mods::RCTRL, HidMods::RIGHT_CONTROL),
        (Mods::RSHIFT, HidMods::RIGHT_SHIFT),
        (Mods::RALT, HidMods::RIGHT_ALT),
        (Mods::RSUPER, HidMods::RIGHT_GUI),
    ] {
        if mods.contains(host) {
            out |= hid;
        }
    }
    out
}

/// Boot-protocol keyboard report descriptor (modifier byte, reserved byte,
/// LED output report, 6-slot key array).
static KEYBOARD_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x07, // Usage Page (Key Codes)
    0x19, 0xE0, // Usage Minimum (224)
    0x29, 0xE7, // Usage Maximum (231)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x75, 0x01, // Report Size (1)
    0x95, 0x08, // Report Count (8)
    0x81, 0x02, // Input (Data, Variable, Absolute): modifier byte
    0x75, 0x08, // Report Size (8)
    0x95, 0x01, // Report Count (1)
    0x81, 0x01, // Input (Constant): reserved byte
    0x05, 0x08, // Usage Page (LEDs)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x05, // Usage Maximum (5)
    0x75, 0x01, // Report Size (1)
    0x95, 0x05, // Report Count (5)
    0x91, 0x02, // Output (Data, Variable, Absolute): LED report
    0x75, 0x03, // Report Size (3)
    0x95, 0x01, // Report Count (1)
    0x91, 0x01, // Output (Constant): LED padding
    0x05, 0x07, // Usage Page (Key Codes)
    0x19, 0x00, // Usage Minimum (0)
    0x29, KEYBOARD_KEYS as u8 - 1, // Usage Maximum (101)
    0x15, 0x00, // Logical Minimum (0)
    0x25, KEYBOARD_KEYS as u8 - 1, // Logical Maximum (101)
    0x75, 0x08, // Report Size (8)
    0x95, MAX_KEYS as u8, // Report Count (6)
    0x81, 0x00, // Input (Data, Array): keys
    0xC0, // End Collection
];

#[derive(Debug)]
pub struct HidKeyboard {
    keys: [bool; KEYBOARD_KEYS],
}

impl Default for HidKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl HidKeyboard {
    pub fn new() -> HidKeyboard {
        HidKeyboard { keys: [false; KEYBOARD_KEYS] }
    }

    pub fn generate_open() -> HidOpen {
        HidOpen { hid_id: HID_ID_KEYBOARD, name: "keyboard", report_desc: KEYBOARD_REPORT_DESC }
    }

    pub fn generate_close() -> HidClose {
        HidClose { hid_id: HID_ID_KEYBOARD }
    }

    fn input_init() -> HidInput {
        let mut input = HidInput::new(HID_ID_KEYBOARD);
        input.size = INPUT_SIZE;
        input
    }

    /// Build the report reflecting the key set after applying `event`.
    ///
    /// Modifier-only events still produce a report: a modifier pressed after
    /// a letter must reach the device even though the key array is
    /// unchanged. Scancodes beyond the tracked range that are not modifiers
    /// are ignored and produce no report.
    pub fn generate_input_from_key(&mut self, event: &KeyEvent) -> Option<HidInput> {
        let scancode = event.scancode;
        if scancode.0 as usize >= KEYBOARD_KEYS && !scancode.is_modifier() {
            return None;
        }

        if (scancode.0 as usize) < KEYBOARD_KEYS {
            self.keys[scancode.0 as usize] = event.action == Action::Down;
            log::trace!("keys[{:#04x}] = {}", scancode.0, self.keys[scancode.0 as usize]);
        }

        let mut input = Self::input_init();
        input.data[INDEX_MODS] = hid_mods_from_mods(event.mods).bits();

        // Re-derive the key array from the full state on every event.
        let mut pressed = 0;
        for (code, down) in self.keys.iter().enumerate() {
            if !down {
                continue;
            }
            if pressed >= MAX_KEYS {
                // Phantom state: modifiers, reserved, then roll-over codes.
                for slot in &mut input.data[INDEX_KEYS..INDEX_KEYS + MAX_KEYS] {
                    *slot = ERROR_ROLL_OVER;
                }
                break;
            }
            input.data[INDEX_KEYS + pressed] = code as u8;
            pressed += 1;
        }

        Some(input)
    }

    /// One-shot report pressing CapsLock/NumLock so the device's lock state
    /// mirrors the host's. Returns `None` when no lock is active.
    pub fn generate_input_from_mods(mods: Mods) -> Option<HidInput> {
        let capslock = mods.contains(Mods::CAPS);
        let numlock = mods.contains(Mods::NUM);
        if !capslock && !numlock {
            return None;
        }

        let mut input = Self::input_init();
        let mut i = INDEX_KEYS;
        if capslock {
            input.data[i] = Scancode::CAPSLOCK.0 as u8;
            i += 1;
        }
        if numlock {
            input.data[i] = Scancode::NUMLOCK.0 as u8;
        }
        Some(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_events::Keycode;

    fn key(scancode: u16, action: Action) -> KeyEvent {
        KeyEvent {
            action,
            keycode: Keycode::Unknown,
            scancode: Scancode(scancode),
            repeat: 0,
            mods: Mods::empty(),
        }
    }

    fn key_set(input: &HidInput) -> Vec<u8> {
        input.data[INDEX_KEYS..INDEX_KEYS + MAX_KEYS]
            .iter()
            .copied()
            .filter(|&k| k != 0)
            .collect()
    }

    #[test]
    fn report_tracks_pressed_set() {
        let mut kb = HidKeyboard::new();
        let r1 = kb.generate_input_from_key(&key(0x04, Action::Down)).unwrap();
        assert_eq!(r1.size, 8);
        assert_eq!(key_set(&r1), [0x04]);

        let r2 = kb.generate_input_from_key(&key(0x1A, Action::Down)).unwrap();
        assert_eq!(key_set(&r2), [0x04, 0x1A]);

        let r3 = kb.generate_input_from_key(&key(0x04, Action::Up)).unwrap();
        assert_eq!(key_set(&r3), [0x1A]);
    }

    #[test]
    fn phantom_rollover_beyond_six_keys() {
        let mut kb = HidKeyboard::new();
        for code in 4..10 {
            kb.generate_input_from_key(&key(code, Action::Down)).unwrap();
        }
        let report = kb.generate_input_from_key(&key(10, Action::Down)).unwrap();
        assert_eq!(&report.data[INDEX_KEYS..INDEX_KEYS + MAX_KEYS], &[0x01; 6]);
        // Reserved byte stays zero.
        assert_eq!(report.data[1], 0);

        // Releasing one key leaves six pressed, still a valid (full) report.
        let report = kb.generate_input_from_key(&key(10, Action::Up)).unwrap();
        assert_eq!(key_set(&report), [4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn modifier_only_event_reports() {
        let mut kb = HidKeyboard::new();
        let mut ev = key(Scancode::LCTRL.0, Action::Down);
        ev.mods = Mods::LCTRL;
        let report = kb.generate_input_from_key(&ev).unwrap();
        assert_eq!(report.data[INDEX_MODS], 0x01);
        assert_eq!(key_set(&report), [] as [u8; 0]);
    }

    #[test]
    fn unknown_scancode_is_ignored() {
        let mut kb = HidKeyboard::new();
        assert!(kb.generate_input_from_key(&key(0x200, Action::Down)).is_none());
    }

    #[test]
    fn mod_lock_sync_report() {
        assert!(HidKeyboard::generate_input_from_mods(Mods::empty()).is_none());
        let report = HidKeyboard::generate_input_from_mods(Mods::CAPS | Mods::NUM).unwrap();
        assert_eq!(report.data[INDEX_KEYS], Scancode::CAPSLOCK.0 as u8);
        assert_eq!(report.data[INDEX_KEYS + 1], Scancode::NUMLOCK.0 as u8);
        let report = HidKeyboard::generate_input_from_mods(Mods::NUM).unwrap();
        assert_eq!(report.data[INDEX_KEYS], Scancode::NUMLOCK.0 as u8);
        assert_eq!(report.data[INDEX_KEYS + 1], 0);
    }
}
