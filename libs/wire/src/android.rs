//! Android input constants, as defined by the platform's `KeyEvent` and
//! `MotionEvent` classes. Only the values the injection path needs.

pub const KEY_EVENT_ACTION_DOWN: u8 = 0;
pub const KEY_EVENT_ACTION_UP: u8 = 1;

pub const MOTION_EVENT_ACTION_DOWN: u8 = 0;
pub const MOTION_EVENT_ACTION_UP: u8 = 1;
pub const MOTION_EVENT_ACTION_MOVE: u8 = 2;

pub const MOTION_EVENT_BUTTON_PRIMARY: u32 = 1 << 0;
pub const MOTION_EVENT_BUTTON_SECONDARY: u32 = 1 << 1;
pub const MOTION_EVENT_BUTTON_TERTIARY: u32 = 1 << 2;
pub const MOTION_EVENT_BUTTON_BACK: u32 = 1 << 3;
pub const MOTION_EVENT_BUTTON_FORWARD: u32 = 1 << 4;

// Meta state flags.
pub const META_SHIFT_ON: u32 = 0x1;
pub const META_ALT_ON: u32 = 0x2;
pub const META_CTRL_ON: u32 = 0x1000;
pub const META_META_ON: u32 = 0x10000;
pub const META_CAPS_LOCK_ON: u32 = 0x100000;
pub const META_NUM_LOCK_ON: u32 = 0x200000;

// Keycodes.
pub const KEYCODE_HOME: u32 = 3;
pub const KEYCODE_BACK: u32 = 4;
pub const KEYCODE_0: u32 = 7;
pub const KEYCODE_9: u32 = 16;
pub const KEYCODE_VOLUME_UP: u32 = 24;
pub const KEYCODE_VOLUME_DOWN: u32 = 25;
pub const KEYCODE_POWER: u32 = 26;
pub const KEYCODE_A: u32 = 29;
pub const KEYCODE_Z: u32 = 54;
pub const KEYCODE_DPAD_UP: u32 = 19;
pub const KEYCODE_ALT_LEFT: u32 = 57;
pub const KEYCODE_ALT_RIGHT: u32 = 58;
pub const KEYCODE_SHIFT_LEFT: u32 = 59;
pub const KEYCODE_SHIFT_RIGHT: u32 = 60;
pub const KEYCODE_CTRL_LEFT: u32 = 113;
pub const KEYCODE_CTRL_RIGHT: u32 = 114;
pub const KEYCODE_META_LEFT: u32 = 117;
pub const KEYCODE_META_RIGHT: u32 = 118;
pub const KEYCODE_DPAD_DOWN: u32 = 20;
pub const KEYCODE_DPAD_LEFT: u32 = 21;
pub const KEYCODE_DPAD_RIGHT: u32 = 22;
pub const KEYCODE_TAB: u32 = 61;
pub const KEYCODE_SPACE: u32 = 62;
pub const KEYCODE_ENTER: u32 = 66;
pub const KEYCODE_DEL: u32 = 67;
pub const KEYCODE_MENU: u32 = 82;
pub const KEYCODE_PAGE_UP: u32 = 92;
pub const KEYCODE_PAGE_DOWN: u32 = 93;
pub const KEYCODE_ESCAPE: u32 = 111;
pub const KEYCODE_FORWARD_DEL: u32 = 112;
pub const KEYCODE_MOVE_HOME: u32 = 122;
pub const KEYCODE_MOVE_END: u32 = 123;
pub const KEYCODE_INSERT: u32 = 124;
pub const KEYCODE_F1: u32 = 131;
pub const KEYCODE_APP_SWITCH: u32 = 187;
