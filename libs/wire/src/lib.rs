pub mod android;
pub mod bytes;
mod control;
mod device;

pub use control::{
    ControlMsg, ControlMsgType, CopyKey, KeyEventEntry, CLIPBOARD_TEXT_MAX_LENGTH,
    CONTROL_MSG_MAX_SIZE, INJECT_TEXT_MAX_LENGTH,
};
pub use device::{DeviceMsg, DeviceMsgType, DeserializeError, DEVICE_MSG_MAX_SIZE};

/// Sequence numbers attached to SetClipboard requests. They start at 1 and
/// are never reused within a session; "no acknowledgement expected" is
/// modeled as `Option::None`, so 0 is never assigned.
pub type Sequence = u64;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub fn rotated(self) -> Size {
        Size { width: self.height, height: self.width }
    }
}

/// A point together with the screen size it was measured against, so the
/// device can rescale it to its own resolution.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Position {
    pub point: Point,
    pub screen_size: Size,
}

/// Display orientation: a quarter-turn rotation, optionally preceded by a
/// horizontal flip. The eight values form the symmetry group of the frame.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Deg0 = 0,
    Deg90 = 1,
    Deg180 = 2,
    Deg270 = 3,
    Flip0 = 4,
    Flip90 = 5,
    Flip180 = 6,
    Flip270 = 7,
}

impl Orientation {
    pub fn from_index(index: u8) -> Orientation {
        match index & 7 {
            0 => Orientation::Deg0,
            1 => Orientation::Deg90,
            2 => Orientation::Deg180,
            3 => Orientation::Deg270,
            4 => Orientation::Flip0,
            5 => Orientation::Flip90,
            6 => Orientation::Flip180,
            _ => Orientation::Flip270,
        }
    }

    pub fn rotation(self) -> u8 {
        self as u8 & 3
    }

    pub fn is_mirrored(self) -> bool {
        self as u8 & 4 != 0
    }

    pub fn is_swapped(self) -> bool {
        self.rotation() & 1 != 0
    }

    /// Compose `transform` on top of `self`.
    pub fn apply(self, transform: Orientation) -> Orientation {
        let mirrored = self.is_mirrored() ^ transform.is_mirrored();
        // A mirrored source reverses the direction of further rotations.
        let rotation = if self.is_mirrored() {
            (self.rotation() + 4 - transform.rotation()) % 4
        } else {
            (self.rotation() + transform.rotation()) % 4
        };
        Orientation::from_index(if mirrored { 4 } else { 0 } | rotation)
    }
}

/// Convert a pressure or trigger value in [0, 1] to unsigned 16-bit fixed
/// point, saturating 1.0 to 0xFFFF.
pub fn to_fixed_point_u16(value: f32) -> u16 {
    debug_assert!((0.0..=1.0).contains(&value));
    let u = (value * 65536.0) as u32;
    u.min(0xFFFF) as u16
}

/// Convert a scroll value in [-1, 1] to signed 16-bit fixed point.
pub fn to_fixed_point_i16(value: f32) -> i16 {
    debug_assert!((-1.0..=1.0).contains(&value));
    let i = (value * 32768.0) as i32;
    i.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_saturates() {
        assert_eq!(to_fixed_point_u16(0.0), 0);
        assert_eq!(to_fixed_point_u16(0.5), 0x8000);
        assert_eq!(to_fixed_point_u16(1.0), 0xFFFF);
        assert_eq!(to_fixed_point_i16(1.0), 0x7FFF);
        assert_eq!(to_fixed_point_i16(-1.0), i16::MIN);
        assert_eq!(to_fixed_point_i16(0.5), 0x4000);
    }

    #[test]
    fn orientation_identity_and_composition() {
        for i in 0..8 {
            let o = Orientation::from_index(i);
            assert_eq!(o.apply(Orientation::Deg0), o);
        }
        assert_eq!(Orientation::Deg90.apply(Orientation::Deg90), Orientation::Deg180);
        assert_eq!(Orientation::Deg270.apply(Orientation::Deg90), Orientation::Deg0);
        // Two identical flips cancel out.
        assert_eq!(Orientation::Flip0.apply(Orientation::Flip0), Orientation::Deg0);
        // A mirrored base rotates backwards.
        assert_eq!(Orientation::Flip90.apply(Orientation::Deg90), Orientation::Flip0);
    }

    #[test]
    fn orientation_swap() {
        assert!(Orientation::Deg90.is_swapped());
        assert!(Orientation::Flip270.is_swapped());
        assert!(!Orientation::Deg180.is_swapped());
    }
}
