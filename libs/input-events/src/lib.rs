//! Host-side input events.
//!
//! The windowing toolkit adapter (out of the core) translates its native
//! events into these types before handing them to the input manager. The
//! pointer-id constants match what the device's input stack expects for
//! mouse-as-finger and the synthesized pinch/rotate finger.

pub use wire::{Point, Position, Size};

pub const POINTER_ID_MOUSE: u64 = u64::MAX;
pub const POINTER_ID_GENERIC_FINGER: u64 = u64::MAX - 1;
pub const POINTER_ID_VIRTUAL_FINGER: u64 = u64::MAX - 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Down,
    Up,
}

bitflags::bitflags! {
    /// Modifier state at the time of an event, including lock keys.
    pub struct Mods: u16 {
        const LCTRL = 1 << 0;
        const RCTRL = 1 << 1;
        const LSHIFT = 1 << 2;
        const RSHIFT = 1 << 3;
        const LALT = 1 << 4;
        const RALT = 1 << 5;
        const LSUPER = 1 << 6;
        const RSUPER = 1 << 7;
        const CAPS = 1 << 8;
        const NUM = 1 << 9;
    }
}

impl Mods {
    pub fn ctrl(self) -> bool {
        self.intersects(Mods::LCTRL | Mods::RCTRL)
    }

    pub fn shift(self) -> bool {
        self.intersects(Mods::LSHIFT | Mods::RSHIFT)
    }

    pub fn alt(self) -> bool {
        self.intersects(Mods::LALT | Mods::RALT)
    }
}

/// Symbolic host keys. Layout-dependent (the character the key produces),
/// as opposed to `Scancode` which is positional.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Keycode {
    Unknown,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Return,
    Escape,
    Backspace,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    LCtrl,
    RCtrl,
    LShift,
    RShift,
    LAlt,
    RAlt,
    LSuper,
    RSuper,
}

impl Keycode {
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Keycode::LCtrl
                | Keycode::RCtrl
                | Keycode::LShift
                | Keycode::RShift
                | Keycode::LAlt
                | Keycode::RAlt
                | Keycode::LSuper
                | Keycode::RSuper
        )
    }
}

/// Positional key identifier: the HID usage id from the Keyboard/Keypad
/// usage page. Plain keys live in 0..=101; modifiers in 0xE0..=0xE7.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scancode(pub u16);

impl Scancode {
    pub const CAPSLOCK: Scancode = Scancode(0x39);
    pub const NUMLOCK: Scancode = Scancode(0x53);
    pub const LCTRL: Scancode = Scancode(0xE0);
    pub const RGUI: Scancode = Scancode(0xE7);

    pub fn is_modifier(self) -> bool {
        (Scancode::LCTRL.0..=Scancode::RGUI.0).contains(&self.0)
    }
}

#[derive(Debug, Copy, Clone)]
pub struct KeyEvent {
    pub action: Action,
    pub keycode: Keycode,
    pub scancode: Scancode,
    pub repeat: u16,
    pub mods: Mods,
}

#[derive(Debug, Clone)]
pub struct TextEvent {
    pub text: String,
}

bitflags::bitflags! {
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
        const X1 = 1 << 3;
        const X2 = 1 << 4;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    X1,
    X2,
}

impl MouseButton {
    pub fn mask(self) -> MouseButtons {
        match self {
            MouseButton::Left => MouseButtons::LEFT,
            MouseButton::Right => MouseButtons::RIGHT,
            MouseButton::Middle => MouseButtons::MIDDLE,
            MouseButton::X1 => MouseButtons::X1,
            MouseButton::X2 => MouseButtons::X2,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct MouseMotionEvent {
    pub position: Position,
    pub pointer_id: u64,
    pub xrel: i32,
    pub yrel: i32,
    pub buttons: MouseButtons,
}

#[derive(Debug, Copy, Clone)]
pub struct MouseClickEvent {
    pub position: Position,
    pub action: Action,
    pub button: MouseButton,
    pub pointer_id: u64,
    pub buttons: MouseButtons,
    /// Consecutive-click count from the toolkit (1 = single click).
    pub clicks: u8,
}

#[derive(Debug, Copy, Clone)]
pub struct MouseScrollEvent {
    pub position: Position,
    /// Precise scroll amounts, in ticks (positive = right/up).
    pub hscroll: f32,
    pub vscroll: f32,
    /// Integer fallback for consumers without high-resolution scroll.
    pub hscroll_int: i32,
    pub vscroll_int: i32,
    pub buttons: MouseButtons,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Up,
    Move,
}

#[derive(Debug, Copy, Clone)]
pub struct TouchEvent {
    pub position: Position,
    pub action: TouchAction,
    pub pointer_id: u64,
    pub pressure: f32,
}

pub const GAMEPAD_ID_INVALID: u32 = u32::MAX;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GamepadDeviceAction {
    Added,
    Removed,
}

#[derive(Debug, Copy, Clone)]
pub struct GamepadDeviceEvent {
    pub action: GamepadDeviceAction,
    pub gamepad_id: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

#[derive(Debug, Copy, Clone)]
pub struct GamepadAxisEvent {
    pub gamepad_id: u32,
    pub axis: GamepadAxis,
    /// Raw host axis value; sticks use the full i16 range, triggers are
    /// reported in 0..=0x7FFF.
    pub value: i16,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GamepadButton {
    South,
    East,
    West,
    North,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

#[derive(Debug, Copy, Clone)]
pub struct GamepadButtonEvent {
    pub gamepad_id: u32,
    pub action: Action,
    pub button: GamepadButton,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_helpers() {
        let mods = Mods::LCTRL | Mods::RSHIFT | Mods::CAPS;
        assert!(mods.ctrl());
        assert!(mods.shift());
        assert!(!mods.alt());
    }

    #[test]
    fn scancode_modifier_range() {
        assert!(Scancode::LCTRL.is_modifier());
        assert!(Scancode(0xE5).is_modifier());
        assert!(!Scancode(0x04).is_modifier());
        assert!(!Scancode::CAPSLOCK.is_modifier());
    }

    #[test]
    fn pointer_ids_are_distinct() {
        assert_ne!(POINTER_ID_MOUSE, POINTER_ID_GENERIC_FINGER);
        assert_ne!(POINTER_ID_GENERIC_FINGER, POINTER_ID_VIRTUAL_FINGER);
    }
}
