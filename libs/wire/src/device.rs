//! Device → client messages, read from the control socket.

use crate::bytes::*;
use crate::Sequence;

/// The receiver's rolling buffer size; any valid message fits.
pub const DEVICE_MSG_MAX_SIZE: usize = 1 << 18;

#[derive(Debug, Copy, Clone, PartialEq, Eq, num_derive::FromPrimitive, num_derive::ToPrimitive)]
#[repr(u8)]
pub enum DeviceMsgType {
    Clipboard,
    AckClipboard,
    UhidOutput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceMsg {
    /// New device clipboard content (4-byte-BE length + UTF-8).
    Clipboard { text: String },
    /// The device committed the SetClipboard request with this sequence.
    AckClipboard { sequence: Sequence },
    /// An output report for a UHID device (keyboard LEDs, rumble, ...).
    UhidOutput { id: u16, data: Vec<u8> },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeserializeError {
    #[error("unknown device message type {0}")]
    UnknownType(u8),
    #[error("device clipboard is not valid UTF-8")]
    InvalidUtf8,
}

impl DeviceMsg {
    /// Try to decode one message from the front of `buf`.
    ///
    /// Returns `Ok(None)` when the buffer does not yet hold a complete
    /// message, and `Ok(Some((msg, consumed)))` otherwise. An unknown tag is
    /// unrecoverable: the stream framing is lost and the receiver must shut
    /// the socket down.
    pub fn deserialize(buf: &[u8]) -> Result<Option<(DeviceMsg, usize)>, DeserializeError> {
        if buf.is_empty() {
            return Ok(None);
        }
        let msg_type = num_traits::FromPrimitive::from_u8(buf[0])
            .ok_or(DeserializeError::UnknownType(buf[0]))?;
        match msg_type {
            DeviceMsgType::Clipboard => {
                if buf.len() < 5 {
                    return Ok(None);
                }
                let len = read_u32be(&buf[1..]) as usize;
                if buf.len() < 5 + len {
                    return Ok(None);
                }
                let text = std::str::from_utf8(&buf[5..5 + len])
                    .map_err(|_| DeserializeError::InvalidUtf8)?
                    .to_owned();
                Ok(Some((DeviceMsg::Clipboard { text }, 5 + len)))
            }
            DeviceMsgType::AckClipboard => {
                if buf.len() < 9 {
                    return Ok(None);
                }
                let sequence = read_u64be(&buf[1..]);
                Ok(Some((DeviceMsg::AckClipboard { sequence }, 9)))
            }
            DeviceMsgType::UhidOutput => {
                if buf.len() < 5 {
                    return Ok(None);
                }
                let id = read_u16be(&buf[1..]);
                let size = read_u16be(&buf[3..]) as usize;
                if buf.len() < 5 + size {
                    return Ok(None);
                }
                let data = buf[5..5 + size].to_vec();
                Ok(Some((DeviceMsg::UhidOutput { id, data }, 5 + size)))
            }
        }
    }

    /// Encode as the device would. The client never sends these; this is the
    /// inverse used by tests and device-emulation harnesses.
    pub fn serialize(&self, buf: &mut Vec<u8>) -> usize {
        let start = buf.len();
        match self {
            DeviceMsg::Clipboard { text } => {
                buf.push(DeviceMsgType::Clipboard as u8);
                write_u32be(buf, text.len() as u32);
                buf.extend_from_slice(text.as_bytes());
            }
            DeviceMsg::AckClipboard { sequence } => {
                buf.push(DeviceMsgType::AckClipboard as u8);
                write_u64be(buf, *sequence);
            }
            DeviceMsg::UhidOutput { id, data } => {
                buf.push(DeviceMsgType::UhidOutput as u8);
                write_u16be(buf, *id);
                write_u16be(buf, data.len() as u16);
                buf.extend_from_slice(data);
            }
        }
        buf.len() - start
    }
}
