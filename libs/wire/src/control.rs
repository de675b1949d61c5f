//! Client → device control messages.
//!
//! Each message is one tag byte followed by a payload whose layout is fixed
//! by the tag. Multi-byte integers are big-endian; strings are a u16-BE
//! length followed by UTF-8 bytes, truncated on a character boundary.

use crate::bytes::*;
use crate::{to_fixed_point_i16, to_fixed_point_u16, Position, Sequence};

/// Serialization buffer upper bound (and the cap used when sizing queues).
pub const CONTROL_MSG_MAX_SIZE: usize = 1 << 16;

/// Injected text is deliberately short; long texts go through SetClipboard.
pub const INJECT_TEXT_MAX_LENGTH: usize = 300;

/// Leaves room for the tag, sequence, paste flag and length prefix.
pub const CLIPBOARD_TEXT_MAX_LENGTH: usize = CONTROL_MSG_MAX_SIZE - 14;

#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[repr(u8)]
pub enum ControlMsgType {
    InjectKeycode,
    InjectText,
    InjectTouch,
    InjectScroll,
    InjectKeyEvents,
    BackOrScreenOn,
    ExpandNotificationPanel,
    ExpandSettingsPanel,
    CollapsePanels,
    GetClipboard,
    SetClipboard,
    SetDisplayPower,
    RotateDevice,
    UhidCreate,
    UhidInput,
    UhidDestroy,
    OpenHardKeyboardSettings,
    ResetVideo,
    StartApp,
    StopApp,
}

/// Key selecting which device shortcut triggered a clipboard read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum CopyKey {
    None = 0,
    Copy = 1,
    Cut = 2,
}

/// One key event inside an InjectKeyEvents batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeyEventEntry {
    pub action: u8,
    pub keycode: u32,
    pub metastate: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    InjectKeycode {
        action: u8,
        keycode: u32,
        repeat: u32,
        metastate: u32,
    },
    InjectText {
        text: String,
    },
    InjectTouch {
        action: u8,
        pointer_id: u64,
        position: Position,
        pressure: f32,
        /// The button whose state change produced this event. Consumed on
        /// the client side only; the wire carries the full button mask.
        action_button: u32,
        buttons: u32,
    },
    InjectScroll {
        position: Position,
        hscroll: f32,
        vscroll: f32,
        buttons: u32,
    },
    InjectKeyEvents {
        events: Vec<KeyEventEntry>,
    },
    BackOrScreenOn {
        action: u8,
    },
    ExpandNotificationPanel,
    ExpandSettingsPanel,
    CollapsePanels,
    GetClipboard {
        copy_key: CopyKey,
    },
    SetClipboard {
        sequence: Sequence,
        paste: bool,
        text: String,
    },
    SetDisplayPower {
        on: bool,
    },
    RotateDevice,
    UhidCreate {
        id: u16,
        vendor_id: u16,
        product_id: u16,
        name: String,
        report_desc: Vec<u8>,
    },
    UhidInput {
        id: u16,
        data: Vec<u8>,
    },
    UhidDestroy {
        id: u16,
    },
    OpenHardKeyboardSettings,
    ResetVideo,
    StartApp {
        name: String,
    },
    StopApp {
        name: String,
    },
}

fn write_string(buf: &mut Vec<u8>, s: &str, max_len: usize) {
    let len = utf8_truncation_index(s, max_len);
    write_u16be(buf, len as u16);
    buf.extend_from_slice(&s.as_bytes()[..len]);
}

fn write_position(buf: &mut Vec<u8>, position: &Position) {
    write_i32be(buf, position.point.x);
    write_i32be(buf, position.point.y);
    write_u16be(buf, position.screen_size.width);
    write_u16be(buf, position.screen_size.height);
}

impl ControlMsg {
    pub fn msg_type(&self) -> ControlMsgType {
        match self {
            ControlMsg::InjectKeycode { .. } => ControlMsgType::InjectKeycode,
            ControlMsg::InjectText { .. } => ControlMsgType::InjectText,
            ControlMsg::InjectTouch { .. } => ControlMsgType::InjectTouch,
            ControlMsg::InjectScroll { .. } => ControlMsgType::InjectScroll,
            ControlMsg::InjectKeyEvents { .. } => ControlMsgType::InjectKeyEvents,
            ControlMsg::BackOrScreenOn { .. } => ControlMsgType::BackOrScreenOn,
            ControlMsg::ExpandNotificationPanel => ControlMsgType::ExpandNotificationPanel,
            ControlMsg::ExpandSettingsPanel => ControlMsgType::ExpandSettingsPanel,
            ControlMsg::CollapsePanels => ControlMsgType::CollapsePanels,
            ControlMsg::GetClipboard { .. } => ControlMsgType::GetClipboard,
            ControlMsg::SetClipboard { .. } => ControlMsgType::SetClipboard,
            ControlMsg::SetDisplayPower { .. } => ControlMsgType::SetDisplayPower,
            ControlMsg::RotateDevice => ControlMsgType::RotateDevice,
            ControlMsg::UhidCreate { .. } => ControlMsgType::UhidCreate,
            ControlMsg::UhidInput { .. } => ControlMsgType::UhidInput,
            ControlMsg::UhidDestroy { .. } => ControlMsgType::UhidDestroy,
            ControlMsg::OpenHardKeyboardSettings => ControlMsgType::OpenHardKeyboardSettings,
            ControlMsg::ResetVideo => ControlMsgType::ResetVideo,
            ControlMsg::StartApp { .. } => ControlMsgType::StartApp,
            ControlMsg::StopApp { .. } => ControlMsgType::StopApp,
        }
    }

    /// Append the serialized form to `buf` and return the number of bytes
    /// written.
    pub fn serialize(&self, buf: &mut Vec<u8>) -> usize {
        let start = buf.len();
        buf.push(self.msg_type() as u8);
        match self {
            ControlMsg::InjectKeycode { action, keycode, repeat, metastate } => {
                buf.push(*action);
                write_u32be(buf, *keycode);
                write_u32be(buf, *repeat);
                write_u32be(buf, *metastate);
            }
            ControlMsg::InjectText { text } => {
                write_string(buf, text, INJECT_TEXT_MAX_LENGTH);
            }
            ControlMsg::InjectTouch { action, pointer_id, position, pressure, buttons, .. } => {
                buf.push(*action);
                write_u64be(buf, *pointer_id);
                write_position(buf, position);
                write_u16be(buf, to_fixed_point_u16(*pressure));
                write_u32be(buf, *buttons);
            }
            ControlMsg::InjectScroll { position, hscroll, vscroll, buttons } => {
                write_position(buf, position);
                write_u16be(buf, to_fixed_point_i16(*hscroll) as u16);
                write_u16be(buf, to_fixed_point_i16(*vscroll) as u16);
                write_u32be(buf, *buttons);
            }
            ControlMsg::InjectKeyEvents { events } => {
                write_u16be(buf, events.len() as u16);
                for ev in events {
                    buf.push(ev.action);
                    write_u32be(buf, ev.keycode);
                    write_u32be(buf, ev.metastate);
                }
            }
            ControlMsg::BackOrScreenOn { action } => {
                buf.push(*action);
            }
            ControlMsg::GetClipboard { copy_key } => {
                buf.push(*copy_key as u8);
            }
            ControlMsg::SetClipboard { sequence, paste, text } => {
                write_u64be(buf, *sequence);
                buf.push(*paste as u8);
                write_string(buf, text, CLIPBOARD_TEXT_MAX_LENGTH);
            }
            ControlMsg::SetDisplayPower { on } => {
                buf.push(*on as u8);
            }
            ControlMsg::UhidCreate { id, vendor_id, product_id, name, report_desc } => {
                write_u16be(buf, *id);
                write_u16be(buf, *vendor_id);
                write_u16be(buf, *product_id);
                write_string(buf, name, u16::MAX as usize);
                write_u16be(buf, report_desc.len() as u16);
                buf.extend_from_slice(report_desc);
            }
            ControlMsg::UhidInput { id, data } => {
                write_u16be(buf, *id);
                write_u16be(buf, data.len() as u16);
                buf.extend_from_slice(data);
            }
            ControlMsg::UhidDestroy { id } => {
                write_u16be(buf, *id);
            }
            ControlMsg::StartApp { name } | ControlMsg::StopApp { name } => {
                write_string(buf, name, u16::MAX as usize);
            }
            ControlMsg::ExpandNotificationPanel
            | ControlMsg::ExpandSettingsPanel
            | ControlMsg::CollapsePanels
            | ControlMsg::RotateDevice
            | ControlMsg::OpenHardKeyboardSettings
            | ControlMsg::ResetVideo => {
                // tag only
            }
        }
        buf.len() - start
    }
}
