//! Pointer capture state machine for relative-mouse processors.
//!
//! The capture keys are the shortcut modifiers: press and release one alone
//! to toggle capture. Pressing a second modifier while the first is held
//! cancels the toggle, so chorded shortcuts do not fight with capture.

use input_events::{Action, Keycode, Mods};

use crate::coords::Display;
use crate::manager::HostEvent;

pub struct MouseCapture {
    capture_mods: Mods,
    active: bool,
    /// Capture key currently held, if any.
    key_pressed: Option<Keycode>,
}

impl MouseCapture {
    pub fn new(capture_mods: Mods) -> MouseCapture {
        MouseCapture { capture_mods, active: false, key_pressed: None }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn is_capture_key(&self, keycode: Keycode) -> bool {
        (self.capture_mods.contains(Mods::LCTRL) && keycode == Keycode::LCtrl)
            || (self.capture_mods.contains(Mods::RCTRL) && keycode == Keycode::RCtrl)
            || (self.capture_mods.contains(Mods::LALT) && keycode == Keycode::LAlt)
            || (self.capture_mods.contains(Mods::RALT) && keycode == Keycode::RAlt)
            || (self.capture_mods.contains(Mods::LSUPER) && keycode == Keycode::LSuper)
            || (self.capture_mods.contains(Mods::RSUPER) && keycode == Keycode::RSuper)
    }

    pub fn set_active(&mut self, display: &mut dyn Display, active: bool) {
        self.active = active;
        display.set_relative_mouse(active);
    }

    fn toggle(&mut self, display: &mut dyn Display) {
        let new_value = !self.active;
        self.set_active(display, new_value);
    }

    /// Called when the window loses focus: release the pointer.
    pub fn on_focus_lost(&mut self, display: &mut dyn Display) {
        self.set_active(display, false);
    }

    /// Returns true when the event was consumed by capture handling and
    /// must not reach the input manager.
    pub fn handle_event(&mut self, display: &mut dyn Display, event: &HostEvent) -> bool {
        match event {
            HostEvent::Key(key) => match key.action {
                Action::Down => {
                    if self.is_capture_key(key.keycode) {
                        if self.key_pressed.is_none() {
                            self.key_pressed = Some(key.keycode);
                        } else {
                            // Another capture key pressed: cancel.
                            self.key_pressed = None;
                        }
                        // Capture keys are never forwarded to the device.
                        return true;
                    }
                    false
                }
                Action::Up => {
                    let pressed = self.key_pressed.take();
                    if self.is_capture_key(key.keycode) {
                        if pressed == Some(key.keycode) {
                            // Press then release, alone: toggle capture.
                            self.toggle(display);
                        }
                        return true;
                    }
                    false
                }
            },
            HostEvent::MouseMotion { .. } | HostEvent::MouseWheel { .. } => {
                // Uncaptured relative events are meaningless; swallow them.
                !self.active
            }
            HostEvent::MouseButton { action, .. } => {
                if !self.active {
                    if *action == Action::Up {
                        // Capture on click release.
                        self.set_active(display, true);
                    }
                    return true;
                }
                false
            }
            HostEvent::Touch { .. } => {
                // Touch coordinates are absolute, incompatible with
                // relative mode.
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input_events::{KeyEvent, Scancode};
    use wire::{Orientation, Point, Size};

    struct FakeDisplay {
        relative: bool,
    }

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

        fn set_relative_mouse(&mut self, enabled: bool) {
            self.relative = enabled;
        }
    }

    fn key(keycode: Keycode, action: Action) -> HostEvent {
        HostEvent::Key(KeyEvent {
            action,
            keycode,
            scancode: Scancode(0),
            repeat: 0,
            mods: Mods::empty(),
        })
    }

    #[test]
    fn press_release_toggles_capture() {
        let mut display = FakeDisplay { relative: false };
        let mut capture = MouseCapture::new(Mods::LALT);

        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Down)));
        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Up)));
        assert!(capture.is_active());
        assert!(display.relative);

        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Down)));
        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Up)));
        assert!(!capture.is_active());
        assert!(!display.relative);
    }

    #[test]
    fn second_capture_key_cancels_the_toggle() {
        let mut display = FakeDisplay { relative: false };
        let mut capture = MouseCapture::new(Mods::LALT | Mods::LSUPER);

        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Down)));
        // Chording a second capture key cancels the pending toggle.
        assert!(capture.handle_event(&mut display, &key(Keycode::LSuper, Action::Down)));
        assert!(capture.handle_event(&mut display, &key(Keycode::LAlt, Action::Up)));
        assert!(capture.handle_event(&mut display, &key(Keycode::LSuper, Action::Up)));
        assert!(!capture.is_active());
    }

    #[test]
    fn click_captures_when_inactive() {
        let mut display = FakeDisplay { relative: false };
        let mut capture = MouseCapture::new(Mods::LALT);

        // Uncaptured motion is consumed.
        let motion = HostEvent::MouseMotion { x: 0, y: 0, xrel: 1, yrel: 1 };
        assert!(capture.handle_event(&mut display, &motion));

        let down = HostEvent::MouseButton {
            x: 0,
            y: 0,
            action: Action::Down,
            button: input_events::MouseButton::Left,
            clicks: 1,
            mods: Mods::empty(),
        };
        let up = HostEvent::MouseButton {
            x: 0,
            y: 0,
            action: Action::Up,
            button: input_events::MouseButton::Left,
            clicks: 1,
            mods: Mods::empty(),
        };
        assert!(capture.handle_event(&mut display, &down));
        assert!(capture.handle_event(&mut display, &up));
        assert!(capture.is_active());

        // Once captured, mouse events flow through.
        assert!(!capture.handle_event(&mut display, &motion));
    }
}
