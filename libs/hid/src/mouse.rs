//! HID mouse reports.
//!
//! The device is declared with two report ids:
//!
//!  - report 1 (pointer), 3 data bytes: buttons, relative x, relative y,
//!    with motion clamped to [-127, 127];
//!  - report 2 (scroll), 2 data bytes: vertical wheel and horizontal AC Pan
//!    from the consumer usage page.
//!
//! Splitting scroll out keeps the pointer report at the boot-protocol shape
//! while still carrying wheel data when the backend supports report ids.

use input_events::{MouseButtons, MouseClickEvent, MouseMotionEvent, MouseScrollEvent};

use crate::{HidClose, HidInput, HidOpen, HID_ID_MOUSE};

const REPORT_ID_POINTER: u8 = 1;
const REPORT_ID_SCROLL: u8 = 2;

static MOUSE_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_POINTER, // Report ID (1)
    0x09, 0x01, // Usage (Pointer)
    0xA1, 0x00, // Collection (Physical)
    0x05, 0x09, // Usage Page (Buttons)
    0x19, 0x01, // Usage Minimum (1)
    0x29, 0x05, // Usage Maximum (5)
    0x15, 0x00, // Logical Minimum (0)
    0x25, 0x01, // Logical Maximum (1)
    0x95, 0x05, // Report Count (5)
    0x75, 0x01, // Report Size (1)
    0x81, 0x02, // Input (Data, Variable, Absolute): 5 button bits
    0x95, 0x01, // Report Count (1)
    0x75, 0x03, // Report Size (3)
    0x81, 0x01, // Input (Constant): 3 bits padding
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x30, // Usage (X)
    0x09, 0x31, // Usage (Y)
    0x15, 0x81, // Logical Minimum (-127)
    0x25, 0x7F, // Logical Maximum (127)
    0x75, 0x08, // Report Size (8)
    0x95, 0x02, // Report Count (2)
    0x81, 0x06, // Input (Data, Variable, Relative): X & Y
    0xC0, // End Collection
    0x85, REPORT_ID_SCROLL, // Report ID (2)
    0x09, 0x38, // Usage (Wheel)
    0x15, 0x81, // Logical Minimum (-127)
    0x25, 0x7F, // Logical Maximum (127)
    0x75, 0x08, // Report Size (8)
    0x95, 0x01, // Report Count (1)
    0x81, 0x06, // Input (Data, Variable, Relative): vertical wheel
    0x05, 0x0C, // Usage Page (Consumer)
    0x0A, 0x38, 0x02, // Usage (AC Pan)
    0x15, 0x81, // Logical Minimum (-127)
    0x25, 0x7F, // Logical Maximum (127)
    0x75, 0x08, // Report Size (8)
    0x95, 0x01, // Report Count (1)
    0x81, 0x06, // Input (Data, Variable, Relative): horizontal pan
    0xC0, // End Collection
];

fn hid_buttons(buttons: MouseButtons) -> u8 {
    let mut out = 0u8;
    for (mask, bit) in [
        (MouseButtons::LEFT, 0),
        (MouseButtons::RIGHT, 1),
        (MouseButtons::MIDDLE, 2),
        (MouseButtons::X1, 3),
        (MouseButtons::X2, 4),
    ] {
        if buttons.contains(mask) {
            out |= 1 << bit;
        }
    }
    out
}

fn clamp_rel(v: i32) -> u8 {
    v.clamp(-127, 127) as i8 as u8
}

/// The mouse assembler carries no differential state: button state is
/// tracked by the input manager and repeated in every event.
#[derive(Debug, Default)]
pub struct HidMouse;

impl HidMouse {
    pub fn generate_open() -> HidOpen {
        HidOpen { hid_id: HID_ID_MOUSE, name: "mouse", report_desc: MOUSE_REPORT_DESC }
    }

    pub fn generate_close() -> HidClose {
        HidClose { hid_id: HID_ID_MOUSE }
    }

    pub fn generate_input_from_motion(event: &MouseMotionEvent) -> HidInput {
        let mut input = HidInput::new(HID_ID_MOUSE);
        input.push(REPORT_ID_POINTER);
        input.push(hid_buttons(event.buttons));
        input.push(clamp_rel(event.xrel));
        input.push(clamp_rel(event.yrel));
        input
    }

    pub fn generate_input_from_click(event: &MouseClickEvent) -> HidInput {
        let mut input = HidInput::new(HID_ID_MOUSE);
        input.push(REPORT_ID_POINTER);
        input.push(hid_buttons(event.buttons));
        input.push(0); // no x motion
        input.push(0); // no y motion
        input
    }

    pub fn generate_input_from_scroll(event: &MouseScrollEvent) -> HidInput {
        let mut input = HidInput::new(HID_ID_MOUSE);
        input.push(REPORT_ID_SCROLL);
        input.push(clamp_rel(event.vscroll_int));
        input.push(clamp_rel(event.hscroll_int));
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_events::{Action, MouseButton};
    use input_events::Position;

    #[test]
    fn motion_report() {
        let event = MouseMotionEvent {
            position: Position::default(),
            pointer_id: input_events::POINTER_ID_MOUSE,
            xrel: 5,
            yrel: -4,
            buttons: MouseButtons::LEFT,
        };
        let input = HidMouse::generate_input_from_motion(&event);
        assert_eq!(input.bytes(), [1, 0x01, 5, 0xFC]);
    }

    #[test]
    fn motion_clamps_to_i8() {
        let event = MouseMotionEvent {
            position: Position::default(),
            pointer_id: input_events::POINTER_ID_MOUSE,
            xrel: 1000,
            yrel: -1000,
            buttons: MouseButtons::empty(),
        };
        let input = HidMouse::generate_input_from_motion(&event);
        assert_eq!(input.bytes(), [1, 0x00, 127, 0x81]);
    }

    #[test]
    fn click_report_has_no_motion() {
        let event = MouseClickEvent {
            position: Position::default(),
            action: Action::Down,
            button: MouseButton::Right,
            pointer_id: input_events::POINTER_ID_MOUSE,
            buttons: MouseButtons::RIGHT | MouseButtons::MIDDLE,
            clicks: 1,
        };
        let input = HidMouse::generate_input_from_click(&event);
        assert_eq!(input.bytes(), [1, 0x06, 0, 0]);
    }

    #[test]
    fn scroll_uses_its_own_report() {
        let event = MouseScrollEvent {
            position: Position::default(),
            hscroll: -1.0,
            vscroll: 1.0,
            hscroll_int: -1,
            vscroll_int: 1,
            buttons: MouseButtons::empty(),
        };
        let input = HidMouse::generate_input_from_scroll(&event);
        assert_eq!(input.bytes(), [2, 1, 0xFF]);
    }
}
