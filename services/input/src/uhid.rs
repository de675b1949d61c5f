//! UHID-backed processors: the device fabricates virtual HID devices, fed
//! through UhidCreate/UhidInput/UhidDestroy control messages. No USB cable
//! role reversal needed, but the control socket must be up.

use std::sync::{Arc, Mutex};

use control::{Controller, UhidDevices, UhidOutputReceiver};
use hid::{HidGamepad, HidInput, HidKeyboard, HidMouse, HidOpen};
use input_events::*;
use wire::{ControlMsg, Sequence};

use crate::{GamepadProcessor, KeyProcessor, MouseProcessor};

fn push_create(controller: &Controller, open: &HidOpen, name: &str) -> bool {
    let msg = ControlMsg::UhidCreate {
        id: open.hid_id,
        vendor_id: 0,
        product_id: 0,
        name: open.name.to_owned(),
        report_desc: open.report_desc.to_vec(),
    };
    let ok = controller.push_msg(msg);
    if !ok {
        log::error!("could not push UHID_CREATE message ({name})");
    }
    ok
}

fn push_input(controller: &Controller, input: &HidInput, name: &str) {
    let msg = ControlMsg::UhidInput { id: input.hid_id, data: input.bytes().to_vec() };
    if !controller.push_msg(msg) {
        log::error!("could not push UHID_INPUT message ({name})");
    }
}

/// Keyboard LED output reports from the device, used to keep the lock-key
/// state observable.
#[derive(Default)]
struct KeyboardLeds {
    state: Arc<Mutex<u8>>,
}

impl UhidOutputReceiver for KeyboardLeds {
    fn process_output(&mut self, data: &[u8]) {
        if let Some(&leds) = data.last() {
            log::debug!("UHID keyboard LED state: {leds:#04x}");
            *self.state.lock().unwrap() = leds;
        }
    }
}

pub struct KeyboardUhid {
    controller: Arc<Controller>,
    hid: HidKeyboard,
    mod_lock_synchronized: bool,
    led_state: Arc<Mutex<u8>>,
}

impl KeyboardUhid {
    pub fn new(controller: Arc<Controller>, uhid_devices: &UhidDevices) -> KeyboardUhid {
        let open = HidKeyboard::generate_open();
        push_create(&controller, &open, "keyboard");

        let led_state = Arc::new(Mutex::new(0));
        uhid_devices
            .register(open.hid_id, Box::new(KeyboardLeds { state: Arc::clone(&led_state) }));

        KeyboardUhid {
            controller,
            hid: HidKeyboard::new(),
            mod_lock_synchronized: false,
            led_state,
        }
    }

    pub fn led_state(&self) -> u8 {
        *self.led_state.lock().unwrap()
    }
}

impl KeyProcessor for KeyboardUhid {
    fn async_paste(&self) -> bool {
        // UHID input travels on the same socket as SetClipboard, in order:
        // no acknowledgement round-trip is needed before pasting.
        false
    }

    fn is_hid(&self) -> bool {
        true
    }

    fn process_key(&mut self, event: &KeyEvent, _ack_to_wait: Option<Sequence>) {
        if event.repeat > 0 {
            // Key repeat is the device's business for HID keyboards.
            return;
        }
        let Some(input) = self.hid.generate_input_from_key(event) else {
            return;
        };

        if !self.mod_lock_synchronized {
            if let Some(sync) = HidKeyboard::generate_input_from_mods(event.mods) {
                push_input(&self.controller, &sync, "mod lock state");
            }
            self.mod_lock_synchronized = true;
        }

        push_input(&self.controller, &input, "key");
    }
}

pub struct MouseUhid {
    controller: Arc<Controller>,
}

impl MouseUhid {
    pub fn new(controller: Arc<Controller>) -> MouseUhid {
        let open = HidMouse::generate_open();
        push_create(&controller, &open, "mouse");
        MouseUhid { controller }
    }
}

impl MouseProcessor for MouseUhid {
    fn relative_mode(&self) -> bool {
        true
    }

    fn process_mouse_motion(&mut self, event: &MouseMotionEvent) {
        push_input(&self.controller, &HidMouse::generate_input_from_motion(event), "mouse motion");
    }

    fn process_mouse_click(&mut self, event: &MouseClickEvent) {
        push_input(&self.controller, &HidMouse::generate_input_from_click(event), "mouse click");
    }

    fn process_mouse_scroll(&mut self, event: &MouseScrollEvent) {
        push_input(&self.controller, &HidMouse::generate_input_from_scroll(event), "mouse scroll");
    }

    // Touch events not supported (coordinates are not relative).
}

pub struct GamepadUhid {
    controller: Arc<Controller>,
    hid: HidGamepad,
}

impl GamepadUhid {
    pub fn new(controller: Arc<Controller>) -> GamepadUhid {
        GamepadUhid { controller, hid: HidGamepad::new() }
    }
}

impl GamepadProcessor for GamepadUhid {
    fn process_gamepad_device(&mut self, event: &GamepadDeviceEvent) {
        match event.action {
            GamepadDeviceAction::Added => {
                let Some(open) = self.hid.generate_open(event.gamepad_id) else {
                    return;
                };
                push_create(&self.controller, &open, "gamepad");
            }
            GamepadDeviceAction::Removed => {
                let Some(close) = self.hid.generate_close(event.gamepad_id) else {
                    return;
                };
                let msg = ControlMsg::UhidDestroy { id: close.hid_id };
                if !self.controller.push_msg(msg) {
                    log::error!("could not push UHID_DESTROY message (gamepad)");
                }
            }
        }
    }

    fn process_gamepad_axis(&mut self, event: &GamepadAxisEvent) {
        if let Some(input) = self.hid.generate_input_from_axis(event) {
            push_input(&self.controller, &input, "gamepad axis");
        }
    }

    fn process_gamepad_button(&mut self, event: &GamepadButtonEvent) {
        if let Some(input) = self.hid.generate_input_from_button(event) {
            push_input(&self.controller, &input, "gamepad button");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Pipe {
        data: Arc<Mutex<Vec<u8>>>,
    }

    impl io::Write for Pipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn wait_for_len(data: &Arc<Mutex<Vec<u8>>>, len: usize) {
        for _ in 0..500 {
            if data.lock().unwrap().len() >= len {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("only {} bytes on the wire, wanted {len}", data.lock().unwrap().len());
    }

    #[test]
    fn keyboard_creates_device_and_forwards_reports() {
        let pipe = Pipe::default();
        let wire_bytes = pipe.data.clone();
        let mut controller = Controller::new();
        controller.start(pipe);
        let controller = Arc::new(controller);
        let devices = UhidDevices::new();

        let mut kb = KeyboardUhid::new(Arc::clone(&controller), &devices);

        // UhidCreate for the keyboard (id 1) goes out first.
        wait_for_len(&wire_bytes, 1);
        assert_eq!(wire_bytes.lock().unwrap()[0], 0x0D);
        let create_len = wire_bytes.lock().unwrap().len();

        // A key press becomes a UhidInput with an 8-byte report.
        kb.process_key(
            &KeyEvent {
                action: Action::Down,
                keycode: Keycode::A,
                scancode: Scancode(0x04),
                repeat: 0,
                mods: Mods::empty(),
            },
            None,
        );
        wait_for_len(&wire_bytes, create_len + 1 + 2 + 2 + 8);
        {
            let wire_bytes = wire_bytes.lock().unwrap();
            let input = &wire_bytes[create_len..];
            assert_eq!(input[0], 0x0E);
            assert_eq!(&input[1..5], [0x00, 0x01, 0x00, 0x08]); // id=1, size=8
            assert_eq!(input[5 + 2], 0x04); // first key slot
        }

        // Repeats are not forwarded.
        let len_before = wire_bytes.lock().unwrap().len();
        kb.process_key(
            &KeyEvent {
                action: Action::Down,
                keycode: Keycode::A,
                scancode: Scancode(0x04),
                repeat: 1,
                mods: Mods::empty(),
            },
            None,
        );
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(wire_bytes.lock().unwrap().len(), len_before);

        // An LED output report from the device updates the observable state.
        devices.route_output(1, &[0x02]);
        assert_eq!(kb.led_state(), 0x02);

        controller.stop();
    }

    #[test]
    fn uhid_keyboard_does_not_need_acks() {
        let pipe = Pipe::default();
        let mut controller = Controller::new();
        controller.start(pipe);
        let kb = KeyboardUhid::new(Arc::new(controller), &UhidDevices::new());
        assert!(!kb.async_paste());
        assert!(kb.is_hid());
    }
}
