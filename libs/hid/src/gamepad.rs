//! HID gamepad reports.
//!
//! Up to eight gamepads, each mapped to its own accessory id. A slot is
//! allocated when the host reports the device and freed on removal; events
//! for unknown ids are rejected (the host can race removal against queued
//! events).
//!
//! The 16-byte input report is little-endian per HID convention:
//!
//! ```text
//! [buttons u32][lx u16][ly u16][rx u16][ry u16][lt u16][rt u16]
//! ```
//!
//! Stick axes are the host's i16 biased into the unsigned 16-bit range;
//! triggers arrive in 0..=0x7FFF and are widened to the full range.

use input_events::{
    Action, GamepadAxis, GamepadAxisEvent, GamepadButton, GamepadButtonEvent, GAMEPAD_ID_INVALID,
};

use crate::{HidClose, HidInput, HidOpen, HID_ID_GAMEPAD_FIRST, MAX_GAMEPADS};

const AXIS_CENTER: u16 = 0x8000;

static GAMEPAD_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x09, // Usage Page (Buttons)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x20, // Usage Maximum (32)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x75, 0x01, // Report Size (1)
    0x95, 0x20, // Report Count (32)
    0x81, 0x02, // Input (Data, Variable, Absolute): button bitmap
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x30, // Usage (X)
    0x09, 0x31, // Usage (Y)
    0x09, 0x32, // Usage (Z)
    0x09, 0x35, // Usage (Rz)
    0x15, 0x00, // Logical Minimum (0)
    0x27, 0xFF, 0xFF, 0x00, 0x00, // Logical Maximum (65535)
    0x75, 0x10, // Report Size (16)
    0x95, 0x04, // Report Count (4)
    0x81, 0x02, // Input (Data, Variable, Absolute): stick axes
    0x05, 0x02, // Usage Page (Simulation Controls)
    0x09, 0xC5, // Usage (Brake)
    0x09, 0xC4, // Usage (Accelerator)
    0x15, 0x00, // Logical Minimum (0)
    0x27, 0xFF, 0xFF, 0x00, 0x00, // Logical Maximum (65535)
    0x75, 0x10, // Report Size (16)
    0x95, 0x02, // Report Count (2)
    0x81, 0x02, // Input (Data, Variable, Absolute): triggers
    0xC0, // End Collection
];

#[derive(Debug, Copy, Clone)]
struct Slot {
    gamepad_id: u32,
    buttons: u32,
    axis_left_x: u16,
    axis_left_y: u16,
    axis_right_x: u16,
    axis_right_y: u16,
    axis_left_trigger: u16,
    axis_right_trigger: u16,
}

impl Slot {
    fn free() -> Slot {
        Slot {
            gamepad_id: GAMEPAD_ID_INVALID,
            buttons: 0,
            axis_left_x: AXIS_CENTER,
            axis_left_y: AXIS_CENTER,
            axis_right_x: AXIS_CENTER,
            axis_right_y: AXIS_CENTER,
            axis_left_trigger: 0,
            axis_right_trigger: 0,
        }
    }
}

fn button_bit(button: GamepadButton) -> u32 {
    1 << match button {
        GamepadButton::South => 0,
        GamepadButton::East => 1,
        GamepadButton::West => 2,
        GamepadButton::North => 3,
        GamepadButton::Back => 4,
        GamepadButton::Guide => 5,
        GamepadButton::Start => 6,
        GamepadButton::LeftStick => 7,
        GamepadButton::RightStick => 8,
        GamepadButton::LeftShoulder => 9,
        GamepadButton::RightShoulder => 10,
        GamepadButton::DpadUp => 11,
        GamepadButton::DpadDown => 12,
        GamepadButton::DpadLeft => 13,
        GamepadButton::DpadRight => 14,
    }
}

fn stick_to_u16(value: i16) -> u16 {
    (value as i32 + AXIS_CENTER as i32) as u16
}

fn trigger_to_u16(value: i16) -> u16 {
    ((value.max(0) as u32 * 2).min(0xFFFF)) as u16
}

#[derive(Debug)]
pub struct HidGamepad {
    slots: [Slot; MAX_GAMEPADS],
}

impl Default for HidGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl HidGamepad {
    pub fn new() -> HidGamepad {
        HidGamepad { slots: [Slot::free(); MAX_GAMEPADS] }
    }

    fn find_slot(&self, gamepad_id: u32) -> Option<usize> {
        self.slots.iter().position(|slot| slot.gamepad_id == gamepad_id)
    }

    fn hid_id(index: usize) -> u16 {
        HID_ID_GAMEPAD_FIRST + index as u16
    }

    /// Allocate a slot for a newly plugged gamepad. Fails when all eight
    /// slots are taken.
    pub fn generate_open(&mut self, gamepad_id: u32) -> Option<HidOpen> {
        assert_ne!(gamepad_id, GAMEPAD_ID_INVALID);
        if self.find_slot(gamepad_id).is_some() {
            log::warn!("gamepad {gamepad_id} opened twice");
            return None;
        }
        let index = self.find_slot(GAMEPAD_ID_INVALID)?;
        let mut slot = Slot::free();
        slot.gamepad_id = gamepad_id;
        self.slots[index] = slot;
        Some(HidOpen {
            hid_id: Self::hid_id(index),
            name: "gamepad",
            report_desc: GAMEPAD_REPORT_DESC,
        })
    }

    pub fn generate_close(&mut self, gamepad_id: u32) -> Option<HidClose> {
        let index = self.find_slot(gamepad_id)?;
        self.slots[index] = Slot::free();
        Some(HidClose { hid_id: Self::hid_id(index) })
    }

    pub fn generate_input_from_button(&mut self, event: &GamepadButtonEvent) -> Option<HidInput> {
        let index = self.find_slot(event.gamepad_id)?;
        let bit = button_bit(event.button);
        match event.action {
            Action::Down => self.slots[index].buttons |= bit,
            Action::Up => self.slots[index].buttons &= !bit,
        }
        Some(self.report(index))
    }

    pub fn generate_input_from_axis(&mut self, event: &GamepadAxisEvent) -> Option<HidInput> {
        let index = self.find_slot(event.gamepad_id)?;
        let slot = &mut self.slots[index];
        match event.axis {
            GamepadAxis::LeftX => slot.axis_left_x = stick_to_u16(event.value),
            GamepadAxis::LeftY => slot.axis_left_y = stick_to_u16(event.value),
            GamepadAxis::RightX => slot.axis_right_x = stick_to_u16(event.value),
            GamepadAxis::RightY => slot.axis_right_y = stick_to_u16(event.value),
            GamepadAxis::LeftTrigger => slot.axis_left_trigger = trigger_to_u16(event.value),
            GamepadAxis::RightTrigger => slot.axis_right_trigger = trigger_to_u16(event.value),
        }
        Some(self.report(index))
    }

    fn report(&self, index: usize) -> HidInput {
        let slot = &self.slots[index];
        let mut input = HidInput::new(Self::hid_id(index));
        for byte in slot.buttons.to_le_bytes() {
            input.push(byte);
        }
        for axis in [
            slot.axis_left_x,
            slot.axis_left_y,
            slot.axis_right_x,
            slot.axis_right_y,
            slot.axis_left_trigger,
            slot.axis_right_trigger,
        ] {
            for byte in axis.to_le_bytes() {
                input.push(byte);
            }
        }
        input
    }
}
