//! The input manager: one entry point for every host event.
//!
//! Shortcut handling, clipboard synchronization and the virtual finger live
//! here; everything that actually reaches the device goes through the key /
//! mouse / gamepad processors or directly onto the controller.

use std::sync::Arc;

use control::{ClipboardState, Controller, HostClipboard};
use input_events::*;
use wire::android;
use wire::{ControlMsg, CopyKey, Orientation, Point, Position, Sequence};

use crate::coords::{self, Display};
use crate::{GamepadProcessor, KeyProcessor, MouseProcessor};

/// Host events, in window coordinates, as delivered by the UI toolkit
/// adapter.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Key(KeyEvent),
    Text(TextEvent),
    MouseMotion { x: i32, y: i32, xrel: i32, yrel: i32 },
    MouseButton { x: i32, y: i32, action: Action, button: MouseButton, clicks: u8, mods: Mods },
    MouseWheel { x: i32, y: i32, hscroll: f32, vscroll: f32, hscroll_int: i32, vscroll_int: i32 },
    /// Finger coordinates are normalized to [0, 1] over the drawable.
    Touch { x: f32, y: f32, action: TouchAction, pointer_id: u64, pressure: f32 },
    GamepadDevice(GamepadDeviceEvent),
    GamepadAxis(GamepadAxisEvent),
    GamepadButton(GamepadButtonEvent),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseBinding {
    Disabled,
    Click,
    Back,
    Home,
    AppSwitch,
    ExpandNotificationPanel,
}

#[derive(Debug, Copy, Clone)]
pub struct MouseBindingSet {
    pub right_click: MouseBinding,
    pub middle_click: MouseBinding,
    pub click4: MouseBinding,
    pub click5: MouseBinding,
}

impl Default for MouseBindingSet {
    fn default() -> Self {
        MouseBindingSet {
            right_click: MouseBinding::Back,
            middle_click: MouseBinding::Home,
            click4: MouseBinding::AppSwitch,
            click5: MouseBinding::ExpandNotificationPanel,
        }
    }
}

/// Primary set, plus the set active while Shift is held.
#[derive(Debug, Copy, Clone, Default)]
pub struct MouseBindings {
    pub pri: MouseBindingSet,
    pub sec: MouseBindingSet,
}

pub struct InputManagerParams {
    /// Modifier mask recognizing a shortcut (e.g. LAlt | LSuper).
    pub shortcut_mods: Mods,
    pub forward_key_repeat: bool,
    pub legacy_paste: bool,
    pub clipboard_autosync: bool,
    pub mouse_bindings: MouseBindings,
}

impl Default for InputManagerParams {
    fn default() -> Self {
        InputManagerParams {
            shortcut_mods: Mods::LALT | Mods::LSUPER,
            forward_key_repeat: true,
            legacy_paste: false,
            clipboard_autosync: true,
            mouse_bindings: MouseBindings::default(),
        }
    }
}

pub struct InputManager {
    controller: Option<Arc<Controller>>,
    display: Box<dyn Display>,
    clipboard: Box<dyn HostClipboard>,
    clipboard_state: ClipboardState,

    kp: Option<Box<dyn KeyProcessor>>,
    mp: Option<Box<dyn MouseProcessor>>,
    gp: Option<Box<dyn GamepadProcessor>>,

    shortcut_mods: Mods,
    forward_key_repeat: bool,
    legacy_paste: bool,
    clipboard_autosync: bool,
    mouse_bindings: MouseBindings,

    vfinger_down: bool,
    vfinger_invert_x: bool,
    vfinger_invert_y: bool,

    mouse_buttons_state: MouseButtons,

    last_keycode: Keycode,
    last_mods: Mods,
    key_repeat: u32,
    /// Modifier state as of the last key event.
    mods_state: Mods,

    next_sequence: Sequence,
}

impl InputManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: InputManagerParams,
        controller: Option<Arc<Controller>>,
        display: Box<dyn Display>,
        clipboard: Box<dyn HostClipboard>,
        clipboard_state: ClipboardState,
        kp: Option<Box<dyn KeyProcessor>>,
        mp: Option<Box<dyn MouseProcessor>>,
        gp: Option<Box<dyn GamepadProcessor>>,
    ) -> InputManager {
        // A processor without a controller cannot exist: even the HID paths
        // need the control socket for clipboard synchronization.
        assert!((kp.is_none() && mp.is_none() && gp.is_none()) || controller.is_some());
        InputManager {
            controller,
            display,
            clipboard,
            clipboard_state,
            kp,
            mp,
            gp,
            shortcut_mods: params.shortcut_mods,
            forward_key_repeat: params.forward_key_repeat,
            legacy_paste: params.legacy_paste,
            clipboard_autosync: params.clipboard_autosync,
            mouse_bindings: params.mouse_bindings,
            vfinger_down: false,
            vfinger_invert_x: false,
            vfinger_invert_y: false,
            mouse_buttons_state: MouseButtons::empty(),
            last_keycode: Keycode::Unknown,
            last_mods: Mods::empty(),
            key_repeat: 0,
            mods_state: Mods::empty(),
            // 0 is reserved for "no acknowledgement requested".
            next_sequence: 1,
        }
    }

    pub fn handle_event(&mut self, event: &HostEvent) {
        let paused = self.display.is_paused();
        match event {
            HostEvent::Key(key) => self.process_key(key),
            HostEvent::Text(text) => {
                if self.kp.is_some() && !paused {
                    self.process_text(text);
                }
            }
            HostEvent::MouseMotion { x, y, xrel, yrel } => {
                if self.mp.is_some() && !paused {
                    self.process_mouse_motion(*x, *y, *xrel, *yrel);
                }
            }
            HostEvent::MouseButton { x, y, action, button, clicks, mods } => {
                // Some clicks are bound to actions that make sense even
                // without forwarding, so process when paused too.
                self.process_mouse_button(*x, *y, *action, *button, *clicks, *mods);
            }
            HostEvent::MouseWheel { x, y, hscroll, vscroll, hscroll_int, vscroll_int } => {
                if self.mp.is_some() && !paused {
                    self.process_mouse_wheel(*x, *y, *hscroll, *vscroll, *hscroll_int, *vscroll_int);
                }
            }
            HostEvent::Touch { x, y, action, pointer_id, pressure } => {
                if self.mp.is_some() && !paused {
                    self.process_touch(*x, *y, *action, *pointer_id, *pressure);
                }
            }
            HostEvent::GamepadDevice(ev) => {
                // Device arrival/removal must be tracked even while paused.
                if let Some(gp) = self.gp.as_mut() {
                    gp.process_gamepad_device(ev);
                }
            }
            HostEvent::GamepadAxis(ev) => {
                if !paused {
                    if let Some(gp) = self.gp.as_mut() {
                        gp.process_gamepad_axis(ev);
                    }
                }
            }
            HostEvent::GamepadButton(ev) => {
                if !paused {
                    if let Some(gp) = self.gp.as_mut() {
                        gp.process_gamepad_button(ev);
                    }
                }
            }
        }
    }

    fn push_msg(&self, msg: ControlMsg, name: &str) -> bool {
        let Some(controller) = self.controller.as_ref() else {
            return false;
        };
        let ok = controller.push_msg(msg);
        if !ok {
            log::warn!("could not request '{name}'");
        }
        ok
    }

    fn send_keycode(&self, keycode: u32, action: Action, name: &str) {
        let msg = ControlMsg::InjectKeycode {
            action: match action {
                Action::Down => android::KEY_EVENT_ACTION_DOWN,
                Action::Up => android::KEY_EVENT_ACTION_UP,
            },
            keycode,
            repeat: 0,
            metastate: 0,
        };
        self.push_msg(msg, name);
    }

    fn press_back_or_turn_screen_on(&self, action: Action) {
        let msg = ControlMsg::BackOrScreenOn {
            action: match action {
                Action::Down => android::KEY_EVENT_ACTION_DOWN,
                Action::Up => android::KEY_EVENT_ACTION_UP,
            },
        };
        self.push_msg(msg, "press back or turn screen on");
    }

    fn get_device_clipboard(&self, copy_key: CopyKey) {
        self.push_msg(ControlMsg::GetClipboard { copy_key }, "get device clipboard");
    }

    /// Push the host clipboard to the device. Returns false when there was
    /// nothing new to push.
    fn set_device_clipboard(&mut self, paste: bool, sequence: Sequence) -> bool {
        let Some(text) = self.clipboard.get() else {
            log::warn!("could not get host clipboard text");
            return false;
        };
        if self.clipboard_state.is_last(&text) {
            // This text just came from the device; sending it back would
            // only echo.
            log::debug!("device clipboard unchanged, not setting");
            return false;
        }
        self.push_msg(ControlMsg::SetClipboard { sequence, paste, text }, "set device clipboard")
    }

    fn clipboard_paste(&mut self) {
        let Some(text) = self.clipboard.get() else {
            log::warn!("could not get host clipboard text");
            return;
        };
        if text.is_empty() {
            return;
        }
        self.push_msg(ControlMsg::InjectText { text }, "paste clipboard");
    }

    fn set_display_power(&self, on: bool) {
        self.push_msg(ControlMsg::SetDisplayPower { on }, "set display power");
    }

    /// Positions are expressed in the decoded frame space, unrotated: the
    /// point and the screen size it is scaled against must agree.
    fn frame_position(&self, x: i32, y: i32) -> Position {
        Position {
            screen_size: self.display.frame_size(),
            point: coords::window_to_frame_coords(&*self.display, x, y),
        }
    }

    fn position_for_processor(&self, x: i32, y: i32) -> Position {
        match self.mp.as_ref() {
            Some(mp) if mp.relative_mode() => Position::default(),
            _ => self.frame_position(x, y),
        }
    }

    fn is_shortcut(&self, event: &KeyEvent) -> bool {
        // Either the modifier state includes a shortcut modifier, or the key
        // itself is one (necessary to catch its release, when the modifier
        // state is already empty).
        event.mods.intersects(self.shortcut_mods) || self.is_shortcut_key(event.keycode)
    }

    fn is_shortcut_key(&self, keycode: Keycode) -> bool {
        (self.shortcut_mods.contains(Mods::LCTRL) && keycode == Keycode::LCtrl)
            || (self.shortcut_mods.contains(Mods::RCTRL) && keycode == Keycode::RCtrl)
            || (self.shortcut_mods.contains(Mods::LALT) && keycode == Keycode::LAlt)
            || (self.shortcut_mods.contains(Mods::RALT) && keycode == Keycode::RAlt)
            || (self.shortcut_mods.contains(Mods::LSUPER) && keycode == Keycode::LSuper)
            || (self.shortcut_mods.contains(Mods::RSUPER) && keycode == Keycode::RSuper)
    }

    fn process_key(&mut self, event: &KeyEvent) {
        let control = self.controller.is_some();
        let paused = self.display.is_paused();
        let video = self.display.has_video();
        let down = event.action == Action::Down;
        let repeat = event.repeat > 0;
        let shift = event.mods.shift();
        self.mods_state = event.mods;

        if down && !repeat {
            if event.keycode == self.last_keycode && event.mods == self.last_mods {
                self.key_repeat += 1;
            } else {
                self.key_repeat = 0;
                self.last_keycode = event.keycode;
                self.last_mods = event.mods;
            }
        }

        if self.is_shortcut(event) {
            let action = event.action;
            let kp = self.kp.is_some();
            match event.keycode {
                Keycode::H => {
                    if kp && !shift && !repeat && !paused {
                        self.send_keycode(android::KEYCODE_HOME, action, "HOME");
                    }
                }
                Keycode::B | Keycode::Backspace => {
                    if kp && !shift && !repeat && !paused {
                        self.send_keycode(android::KEYCODE_BACK, action, "BACK");
                    }
                }
                Keycode::S => {
                    if kp && !shift && !repeat && !paused {
                        self.send_keycode(android::KEYCODE_APP_SWITCH, action, "APP_SWITCH");
                    }
                }
                Keycode::M => {
                    if kp && !shift && !repeat && !paused {
                        self.send_keycode(android::KEYCODE_MENU, action, "MENU");
                    }
                }
                Keycode::P => {
                    if kp && !shift && !repeat && !paused {
                        self.send_keycode(android::KEYCODE_POWER, action, "POWER");
                    }
                }
                Keycode::O => {
                    if control && !repeat && down && !paused {
                        self.set_display_power(shift);
                    }
                }
                Keycode::Z => {
                    if video && down && !repeat {
                        self.display.set_paused(!shift);
                    }
                }
                Keycode::Down => {
                    if shift {
                        if video && !repeat && down {
                            self.display.apply_orientation_transform(Orientation::Flip180);
                        }
                    } else if kp && !paused {
                        // forward repeated events
                        self.send_keycode(android::KEYCODE_VOLUME_DOWN, action, "VOLUME_DOWN");
                    }
                }
                Keycode::Up => {
                    if shift {
                        if video && !repeat && down {
                            self.display.apply_orientation_transform(Orientation::Flip180);
                        }
                    } else if kp && !paused {
                        self.send_keycode(android::KEYCODE_VOLUME_UP, action, "VOLUME_UP");
                    }
                }
                Keycode::Left => {
                    if video && !repeat && down {
                        let transform =
                            if shift { Orientation::Flip0 } else { Orientation::Deg270 };
                        self.display.apply_orientation_transform(transform);
                    }
                }
                Keycode::Right => {
                    if video && !repeat && down {
                        let transform = if shift { Orientation::Flip0 } else { Orientation::Deg90 };
                        self.display.apply_orientation_transform(transform);
                    }
                }
                Keycode::C => {
                    if kp && !shift && !repeat && down && !paused {
                        self.get_device_clipboard(CopyKey::Copy);
                    }
                }
                Keycode::X => {
                    if kp && !shift && !repeat && down && !paused {
                        self.get_device_clipboard(CopyKey::Cut);
                    }
                }
                Keycode::V => {
                    if kp && !repeat && down && !paused {
                        if shift || self.legacy_paste {
                            // Inject the text as input events.
                            self.clipboard_paste();
                        } else {
                            // Store the text in the device clipboard and
                            // paste, without requesting an acknowledgement.
                            self.set_device_clipboard(true, 0);
                        }
                    }
                }
                Keycode::F => {
                    if video && !shift && !repeat && down {
                        self.display.toggle_fullscreen();
                    }
                }
                Keycode::W => {
                    if video && !shift && !repeat && down {
                        self.display.resize_to_fit();
                    }
                }
                Keycode::G => {
                    if video && !shift && !repeat && down {
                        self.display.resize_to_pixel_perfect();
                    }
                }
                Keycode::I => {
                    if video && !shift && !repeat && down {
                        self.display.toggle_fps_counter();
                    }
                }
                Keycode::N => {
                    if control && !repeat && down && !paused {
                        if shift {
                            self.push_msg(ControlMsg::CollapsePanels, "collapse panels");
                        } else if self.key_repeat == 0 {
                            self.push_msg(
                                ControlMsg::ExpandNotificationPanel,
                                "expand notification panel",
                            );
                        } else {
                            self.push_msg(ControlMsg::ExpandSettingsPanel, "expand settings panel");
                        }
                    }
                }
                Keycode::R => {
                    if control && !repeat && down && !paused {
                        if shift {
                            self.push_msg(ControlMsg::ResetVideo, "reset video");
                        } else {
                            self.push_msg(ControlMsg::RotateDevice, "rotate device");
                        }
                    }
                }
                Keycode::K => {
                    if control && !shift && !repeat && down && !paused {
                        if self.kp.as_ref().is_some_and(|kp| kp.is_hid()) {
                            // Only relevant for a physical (HID) keyboard.
                            self.push_msg(
                                ControlMsg::OpenHardKeyboardSettings,
                                "open hard keyboard settings",
                            );
                        }
                    }
                }
                _ => {}
            }
            return;
        }

        if self.kp.is_none() || paused {
            return;
        }

        if !self.forward_key_repeat && repeat {
            return;
        }

        let mut ack_to_wait = None;
        let ctrl = event.mods.ctrl();
        let is_ctrl_v = ctrl && !shift && event.keycode == Keycode::V && down && !repeat;
        if self.clipboard_autosync && is_ctrl_v {
            if self.legacy_paste {
                // Inject the text as input events instead of pasting.
                self.clipboard_paste();
                return;
            }

            // Request an acknowledgement only if necessary.
            let async_paste = self.kp.as_ref().unwrap().async_paste();
            let sequence = if async_paste { self.next_sequence } else { 0 };

            // Synchronize the host clipboard to the device clipboard before
            // sending Ctrl+v, to allow seamless copy-paste.
            let pushed = self.set_device_clipboard(false, sequence);
            if pushed && async_paste {
                // The key processor waits for this ack before injecting the
                // paste keystroke.
                ack_to_wait = Some(sequence);
                // Increment only on success, sequences must not be wasted.
                self.next_sequence += 1;
            }
        }

        self.kp.as_mut().unwrap().process_key(event, ack_to_wait);
    }

    fn process_text(&mut self, event: &TextEvent) {
        // A shortcut must never generate text events.
        if self.mods_state.intersects(self.shortcut_mods) {
            return;
        }
        self.kp.as_mut().unwrap().process_text(event);
    }

    fn simulate_virtual_finger(&mut self, action: TouchAction, point: Point) -> bool {
        let up = action == TouchAction::Up;
        let msg = ControlMsg::InjectTouch {
            action: match action {
                TouchAction::Down => android::MOTION_EVENT_ACTION_DOWN,
                TouchAction::Up => android::MOTION_EVENT_ACTION_UP,
                TouchAction::Move => android::MOTION_EVENT_ACTION_MOVE,
            },
            pointer_id: POINTER_ID_VIRTUAL_FINGER,
            position: Position { point, screen_size: self.display.frame_size() },
            pressure: if up { 0.0 } else { 1.0 },
            action_button: 0,
            buttons: 0,
        };
        self.push_msg(msg, "inject virtual finger event")
    }

    fn inverse_point(&self, point: Point) -> Point {
        let size = self.display.frame_size();
        let mut point = point;
        if self.vfinger_invert_x {
            point.x = size.width as i32 - point.x;
        }
        if self.vfinger_invert_y {
            point.y = size.height as i32 - point.y;
        }
        point
    }

    fn process_mouse_motion(&mut self, x: i32, y: i32, xrel: i32, yrel: i32) {
        let event = MouseMotionEvent {
            position: self.position_for_processor(x, y),
            pointer_id: if self.vfinger_down {
                POINTER_ID_GENERIC_FINGER
            } else {
                POINTER_ID_MOUSE
            },
            xrel,
            yrel,
            buttons: self.mouse_buttons_state,
        };
        self.mp.as_mut().unwrap().process_mouse_motion(&event);

        // The virtual finger is never used in relative mode.
        debug_assert!(!self.mp.as_ref().unwrap().relative_mode() || !self.vfinger_down);

        if self.vfinger_down {
            let mouse = coords::window_to_frame_coords(&*self.display, x, y);
            let vfinger = self.inverse_point(mouse);
            self.simulate_virtual_finger(TouchAction::Move, vfinger);
        }
    }

    fn binding_for(&self, button: MouseButton, shift: bool) -> MouseBinding {
        let set = if shift { &self.mouse_bindings.sec } else { &self.mouse_bindings.pri };
        match button {
            MouseButton::Left => MouseBinding::Click,
            MouseButton::Right => set.right_click,
            MouseButton::Middle => set.middle_click,
            MouseButton::X1 => set.click4,
            MouseButton::X2 => set.click5,
        }
    }

    fn process_mouse_button(
        &mut self,
        x: i32,
        y: i32,
        action: Action,
        button: MouseButton,
        clicks: u8,
        mods: Mods,
    ) {
        let control = self.controller.is_some();
        let paused = self.display.is_paused();
        let down = action == Action::Down;

        if !down {
            // Mark the button as released.
            self.mouse_buttons_state.remove(button.mask());
        }

        let ctrl_pressed = mods.ctrl();
        let shift_pressed = mods.shift();

        if control && !paused {
            match self.binding_for(button, shift_pressed) {
                MouseBinding::Disabled => return,
                MouseBinding::Back => {
                    if self.kp.is_some() {
                        self.press_back_or_turn_screen_on(action);
                    }
                    return;
                }
                MouseBinding::Home => {
                    if self.kp.is_some() {
                        self.send_keycode(android::KEYCODE_HOME, action, "HOME");
                    }
                    return;
                }
                MouseBinding::AppSwitch => {
                    if self.kp.is_some() {
                        self.send_keycode(android::KEYCODE_APP_SWITCH, action, "APP_SWITCH");
                    }
                    return;
                }
                MouseBinding::ExpandNotificationPanel => {
                    if down {
                        if clicks < 2 {
                            self.push_msg(
                                ControlMsg::ExpandNotificationPanel,
                                "expand notification panel",
                            );
                        } else {
                            self.push_msg(ControlMsg::ExpandSettingsPanel, "expand settings panel");
                        }
                    }
                    return;
                }
                MouseBinding::Click => {}
            }
        }

        if self.mp.is_none() || paused {
            return;
        }

        if down {
            self.mouse_buttons_state.insert(button.mask());
        }

        let relative_mode = self.mp.as_ref().unwrap().relative_mode();
        let change_vfinger = button == MouseButton::Left
            && ((down && !self.vfinger_down && (ctrl_pressed || shift_pressed))
                || (!down && self.vfinger_down));
        let use_finger = self.vfinger_down || change_vfinger;

        let event = MouseClickEvent {
            position: self.position_for_processor(x, y),
            action,
            button,
            pointer_id: if use_finger && !relative_mode {
                POINTER_ID_GENERIC_FINGER
            } else {
                POINTER_ID_MOUSE
            },
            buttons: self.mouse_buttons_state,
            clicks,
        };
        self.mp.as_mut().unwrap().process_mouse_click(&event);

        if relative_mode {
            // No pinch-to-zoom simulation in relative mode.
            debug_assert!(!self.vfinger_down);
            return;
        }

        // Pinch-to-zoom, rotate and tilt simulation: while the left button
        // is held with Ctrl and/or Shift, a second "virtual finger" mirrors
        // the mouse through the screen center (Ctrl), through the vertical
        // axis (Shift), or through the horizontal axis (Ctrl+Shift).
        if change_vfinger {
            let mouse = coords::window_to_frame_coords(&*self.display, x, y);
            if down {
                //  Ctrl  Shift     invert_x  invert_y
                //  ----  ----- ==> --------  --------
                //    0     1           1         0      vertical tilt
                //    1     0           1         1      rotate
                //    1     1           0         1      horizontal tilt
                self.vfinger_invert_x = ctrl_pressed ^ shift_pressed;
                self.vfinger_invert_y = ctrl_pressed;
            }
            let vfinger = self.inverse_point(mouse);
            let action = if down { TouchAction::Down } else { TouchAction::Up };
            if !self.simulate_virtual_finger(action, vfinger) {
                return;
            }
            self.vfinger_down = down;
        }
    }

    fn process_mouse_wheel(
        &mut self,
        x: i32,
        y: i32,
        hscroll: f32,
        vscroll: f32,
        hscroll_int: i32,
        vscroll_int: i32,
    ) {
        let event = MouseScrollEvent {
            position: self.position_for_processor(x, y),
            hscroll,
            vscroll,
            hscroll_int,
            vscroll_int,
            // Actual buttons are tracked manually to ignore shortcuts.
            buttons: self.mouse_buttons_state,
        };
        self.mp.as_mut().unwrap().process_mouse_scroll(&event);
    }

    fn process_touch(&mut self, x: f32, y: f32, action: TouchAction, pointer_id: u64, pressure: f32) {
        // Touch coordinates are normalized over the drawable.
        let drawable = self.display.drawable_size();
        let dx = (x * drawable.width as f32) as i32;
        let dy = (y * drawable.height as f32) as i32;

        let event = TouchEvent {
            position: Position {
                screen_size: self.display.frame_size(),
                point: coords::drawable_to_frame_coords(&*self.display, dx, dy),
            },
            action,
            pointer_id,
            pressure,
        };
        self.mp.as_mut().unwrap().process_touch(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;
    use wire::Size;

    struct FakeDisplay;

    impl Display for FakeDisplay {
        fn frame_size(&self) -> Size {
            Size { width: 1080, height: 1920 }
        }

        fn orientation(&self) -> Orientation {
            Orientation::Deg0
        }

        fn has_video(&self) -> bool {
            true
        }

        fn is_paused(&self) -> bool {
            false
        }

        fn set_paused(&mut self, _paused: bool) {}

        fn toggle_fullscreen(&mut self) {}

        fn resize_to_fit(&mut self) {}

        fn resize_to_pixel_perfect(&mut self) {}

        fn toggle_fps_counter(&mut self) {}

        fn apply_orientation_transform(&mut self, _transform: Orientation) {}

        fn hidpi_scale(&self) -> (f32, f32) {
            (1.0, 1.0)
        }

        fn drawable_size(&self) -> Size {
            Size { width: 1080, height: 1920 }
        }

        fn content_rect(&self) -> (Point, Size) {
            (Point { x: 0, y: 0 }, Size { width: 1080, height: 1920 })
        }

        fn set_relative_mouse(&mut self, _enabled: bool) {}
    }

    #[derive(Clone)]
    struct FakeClipboard {
        text: Arc<Mutex<Option<String>>>,
    }

    impl HostClipboard for FakeClipboard {
        fn get(&mut self) -> Option<String> {
            self.text.lock().unwrap().clone()
        }

        fn set(&mut self, text: &str) {
            *self.text.lock().unwrap() = Some(text.to_owned());
        }
    }

    #[derive(Clone, Default)]
    struct KeyProbe {
        keys: Arc<Mutex<Vec<(Keycode, Option<Sequence>)>>>,
        texts: Arc<Mutex<Vec<String>>>,
        async_paste: bool,
    }

    impl KeyProcessor for KeyProbe {
        fn async_paste(&self) -> bool {
            self.async_paste
        }

        fn process_key(&mut self, event: &KeyEvent, ack_to_wait: Option<Sequence>) {
            self.keys.lock().unwrap().push((event.keycode, ack_to_wait));
        }

        fn process_text(&mut self, event: &TextEvent) {
            self.texts.lock().unwrap().push(event.text.clone());
        }
    }

    #[derive(Clone, Default)]
    struct MouseProbe {
        clicks: Arc<Mutex<Vec<MouseClickEvent>>>,
        motions: Arc<Mutex<Vec<MouseMotionEvent>>>,
    }

    impl MouseProcessor for MouseProbe {
        fn process_mouse_motion(&mut self, event: &MouseMotionEvent) {
            self.motions.lock().unwrap().push(*event);
        }

        fn process_mouse_click(&mut self, event: &MouseClickEvent) {
            self.clicks.lock().unwrap().push(*event);
        }
    }

    /// Write end collecting serialized control messages.
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

    struct Harness {
        manager: InputManager,
        wire: Arc<Mutex<Vec<u8>>>,
        key_probe: KeyProbe,
        mouse_probe: MouseProbe,
        clipboard: FakeClipboard,
        clipboard_state: ClipboardState,
        controller: Arc<Controller>,
    }

    fn harness(params: InputManagerParams, async_paste: bool) -> Harness {
        let pipe = Pipe::default();
        let wire = pipe.data.clone();
        let mut controller = Controller::new();
        controller.start(pipe);
        let controller = Arc::new(controller);

        let key_probe = KeyProbe { async_paste, ..KeyProbe::default() };
        let mouse_probe = MouseProbe::default();
        let clipboard = FakeClipboard { text: Arc::new(Mutex::new(Some("hello".into()))) };
        let clipboard_state = ClipboardState::new();

        let manager = InputManager::new(
            params,
            Some(Arc::clone(&controller)),
            Box::new(FakeDisplay),
            Box::new(clipboard.clone()),
            clipboard_state.clone(),
            Some(Box::new(key_probe.clone())),
            Some(Box::new(mouse_probe.clone())),
            None,
        );
        Harness { manager, wire, key_probe, mouse_probe, clipboard, clipboard_state, controller }
    }

    fn key_event(keycode: Keycode, action: Action, mods: Mods, repeat: u16) -> HostEvent {
        HostEvent::Key(KeyEvent { action, keycode, scancode: Scancode(0), repeat, mods })
    }

    fn wait_for_wire_len(wire: &Arc<Mutex<Vec<u8>>>, len: usize) {
        for _ in 0..500 {
            if wire.lock().unwrap().len() >= len {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("wire only has {} bytes, wanted {len}", wire.lock().unwrap().len());
    }

    #[test]
    fn shortcut_injects_keycode_and_bypasses_processor() {
        let mut h = harness(InputManagerParams::default(), false);
        h.manager.handle_event(&key_event(Keycode::H, Action::Down, Mods::LALT, 0));
        h.manager.handle_event(&key_event(Keycode::H, Action::Up, Mods::LALT, 0));

        // Two InjectKeycode messages of 14 bytes each.
        wait_for_wire_len(&h.wire, 28);
        let wire = h.wire.lock().unwrap();
        assert_eq!(wire[0], 0x00);
        assert_eq!(wire::bytes::read_u32be(&wire[2..]), android::KEYCODE_HOME);
        // The key processor never saw the shortcut.
        assert!(h.key_probe.keys.lock().unwrap().is_empty());
    }

    #[test]
    fn ctrl_v_syncs_clipboard_and_passes_sequence() {
        let mut h = harness(InputManagerParams::default(), true);
        h.manager.handle_event(&key_event(Keycode::V, Action::Down, Mods::LCTRL, 0));

        // SetClipboard: tag + sequence + paste + length + "hello"
        wait_for_wire_len(&h.wire, 1 + 8 + 1 + 2 + 5);
        {
            let wire = h.wire.lock().unwrap();
            assert_eq!(wire[0], 0x0A);
            assert_eq!(wire::bytes::read_u64be(&wire[1..]), 1); // first sequence
            assert_eq!(wire[9], 0); // paste=false, the keystroke follows
            assert_eq!(&wire[12..17], b"hello");
        }
        // The paste key event awaits the matching ack.
        assert_eq!(h.key_probe.keys.lock().unwrap().as_slice(), [(Keycode::V, Some(1))]);

        // A second paste uses the next sequence.
        h.manager.handle_event(&key_event(Keycode::V, Action::Up, Mods::LCTRL, 0));
        h.clipboard.set("world");
        h.manager.handle_event(&key_event(Keycode::V, Action::Down, Mods::LCTRL, 0));
        assert_eq!(h.key_probe.keys.lock().unwrap().last().unwrap().1, Some(2));

        h.controller.stop();
    }

    #[test]
    fn device_clipboard_is_not_echoed_back() {
        let mut h = harness(InputManagerParams::default(), true);
        // The receiver recorded this text as coming from the device.
        h.clipboard_state.record("hello");
        h.manager.handle_event(&key_event(Keycode::V, Action::Down, Mods::LCTRL, 0));

        std::thread::sleep(Duration::from_millis(30));
        // No SetClipboard on the wire, and no sequence to wait for.
        assert!(h.wire.lock().unwrap().is_empty());
        assert_eq!(h.key_probe.keys.lock().unwrap().as_slice(), [(Keycode::V, None)]);
    }

    #[test]
    fn key_repeat_policy() {
        let params = InputManagerParams { forward_key_repeat: false, ..Default::default() };
        let mut h = harness(params, false);
        h.manager.handle_event(&key_event(Keycode::Return, Action::Down, Mods::empty(), 0));
        h.manager.handle_event(&key_event(Keycode::Return, Action::Down, Mods::empty(), 1));
        h.manager.handle_event(&key_event(Keycode::Return, Action::Down, Mods::empty(), 2));
        assert_eq!(h.key_probe.keys.lock().unwrap().len(), 1);
    }

    #[test]
    fn text_is_suppressed_while_shortcut_mod_held() {
        let mut h = harness(InputManagerParams::default(), false);
        h.manager.handle_event(&key_event(Keycode::A, Action::Down, Mods::LALT, 0));
        h.manager.handle_event(&HostEvent::Text(TextEvent { text: "a".into() }));
        assert!(h.key_probe.texts.lock().unwrap().is_empty());

        h.manager.handle_event(&key_event(Keycode::A, Action::Up, Mods::empty(), 0));
        h.manager.handle_event(&HostEvent::Text(TextEvent { text: "a".into() }));
        assert_eq!(h.key_probe.texts.lock().unwrap().as_slice(), ["a"]);
    }

    #[test]
    fn ctrl_click_synthesizes_virtual_finger() {
        let mut h = harness(InputManagerParams::default(), false);
        h.manager.handle_event(&HostEvent::MouseButton {
            x: 100,
            y: 200,
            action: Action::Down,
            button: MouseButton::Left,
            clicks: 1,
            mods: Mods::LCTRL,
        });

        // The processor saw a finger click...
        {
            let clicks = h.mouse_probe.clicks.lock().unwrap();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].pointer_id, POINTER_ID_GENERIC_FINGER);
        }

        // ...and the wire carries the mirrored virtual finger touch (Ctrl:
        // reflected through the center).
        wait_for_wire_len(&h.wire, 28);
        {
            let wire = h.wire.lock().unwrap();
            assert_eq!(wire[0], 0x02);
            assert_eq!(wire::bytes::read_u64be(&wire[2..]), POINTER_ID_VIRTUAL_FINGER);
            let x = wire::bytes::read_u32be(&wire[10..]) as i32;
            let y = wire::bytes::read_u32be(&wire[14..]) as i32;
            assert_eq!((x, y), (1080 - 100, 1920 - 200));
        }

        // Motion while the virtual finger is down produces a MOVE for it.
        h.manager.handle_event(&HostEvent::MouseMotion { x: 110, y: 210, xrel: 10, yrel: 10 });
        wait_for_wire_len(&h.wire, 56);
        {
            let motions = h.mouse_probe.motions.lock().unwrap();
            assert_eq!(motions[0].pointer_id, POINTER_ID_GENERIC_FINGER);
        }

        // Releasing the button lifts the virtual finger.
        h.manager.handle_event(&HostEvent::MouseButton {
            x: 110,
            y: 210,
            action: Action::Up,
            button: MouseButton::Left,
            clicks: 1,
            mods: Mods::empty(),
        });
        wait_for_wire_len(&h.wire, 84);
        let wire = h.wire.lock().unwrap();
        // Last touch message: action UP, pressure 0.
        let last = &wire[wire.len() - 28..];
        assert_eq!(last[0], 0x02);
        assert_eq!(last[1], android::MOTION_EVENT_ACTION_UP);
        assert_eq!(wire::bytes::read_u16be(&last[22..]), 0);
    }
}
