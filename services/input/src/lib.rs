//! Input mapping: host events in, control messages or HID reports out.
//!
//! The input manager routes every host event to one of three processor
//! families, mirroring the three transports to the device:
//!
//!  - inject: Android key/motion events over the control socket;
//!  - aoa: USB HID reports pumped by the AOA worker;
//!  - uhid: HID reports wrapped in control messages, the device fabricates
//!    the HID devices itself.

pub mod capture;
pub mod coords;
pub mod inject;
pub mod manager;
pub mod resampler;
pub mod uhid;
pub mod usb;

use input_events::{
    GamepadAxisEvent, GamepadButtonEvent, GamepadDeviceEvent, KeyEvent, MouseClickEvent,
    MouseMotionEvent, MouseScrollEvent, TextEvent, TouchEvent,
};
use wire::Sequence;

pub use capture::MouseCapture;
pub use coords::Display;
pub use manager::{
    HostEvent, InputManager, InputManagerParams, MouseBinding, MouseBindingSet, MouseBindings,
};
pub use resampler::GamepadResampler;

/// Component able to process and inject key events.
pub trait KeyProcessor: Send {
    /// The implementation must wait for the clipboard-set acknowledgement
    /// before injecting Ctrl+v; the input manager then passes a sequence
    /// number along with the paste key event.
    fn async_paste(&self) -> bool {
        false
    }

    /// Used to gate the hard-keyboard-settings shortcut.
    fn is_hid(&self) -> bool {
        false
    }

    fn process_key(&mut self, event: &KeyEvent, ack_to_wait: Option<Sequence>);

    /// Optional; processors forwarding keys only ignore text.
    fn process_text(&mut self, event: &TextEvent) {
        let _ = event;
    }
}

/// Component able to process and inject mouse events.
pub trait MouseProcessor: Send {
    /// In relative mode absolute positions are meaningless and the UI must
    /// capture the pointer.
    fn relative_mode(&self) -> bool {
        false
    }

    fn process_mouse_motion(&mut self, event: &MouseMotionEvent);

    fn process_mouse_click(&mut self, event: &MouseClickEvent);

    /// Optional.
    fn process_mouse_scroll(&mut self, event: &MouseScrollEvent) {
        let _ = event;
    }

    /// Optional; only meaningful with absolute coordinates.
    fn process_touch(&mut self, event: &TouchEvent) {
        let _ = event;
    }
}

/// Component able to handle gamepad devices and their events.
pub trait GamepadProcessor: Send {
    fn process_gamepad_device(&mut self, event: &GamepadDeviceEvent);

    fn process_gamepad_axis(&mut self, event: &GamepadAxisEvent);

    fn process_gamepad_button(&mut self, event: &GamepadButtonEvent);
}
