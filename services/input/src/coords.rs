//! Coordinate conversion between window, drawable and frame space.
//!
//! Window coordinates come from the toolkit in logical pixels; the drawable
//! may be larger on HiDPI surfaces; the rendered frame occupies a sub-rect
//! of the drawable and may be displayed rotated and/or mirrored. Control
//! messages want coordinates in the *device frame* space.

use wire::{Orientation, Point, Size};

/// The rendering surface, owned by the UI layer. Everything the input
/// manager needs from it is behind this trait; the conversion math itself
/// lives here so it can be tested without a window.
pub trait Display: Send {
    /// Device frame size, unrotated.
    fn frame_size(&self) -> Size;

    fn orientation(&self) -> Orientation;

    /// Whether a video stream is displayed at all (audio-only sessions
    /// still have input).
    fn has_video(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn set_paused(&mut self, paused: bool);

    fn toggle_fullscreen(&mut self);

    fn resize_to_fit(&mut self);

    fn resize_to_pixel_perfect(&mut self);

    fn toggle_fps_counter(&mut self);

    fn apply_orientation_transform(&mut self, transform: Orientation);

    /// Scale factors from window to drawable coordinates.
    fn hidpi_scale(&self) -> (f32, f32);

    /// Size of the drawable surface, in physical pixels.
    fn drawable_size(&self) -> Size;

    /// Position and size, in drawable coordinates, of the rendered frame
    /// (black borders excluded). The size is oriented.
    fn content_rect(&self) -> (Point, Size);

    /// Pointer capture for relative-mouse processors.
    fn set_relative_mouse(&mut self, enabled: bool);
}

/// Map an oriented-frame point back to device frame coordinates.
///
/// The display shows the frame after an optional horizontal mirror followed
/// by a clockwise rotation; this applies the inverse.
pub fn unorient_point(point: Point, frame_size: Size, orientation: Orientation) -> Point {
    let w = frame_size.width as i32;
    let h = frame_size.height as i32;
    let Point { x, y } = point;
    let mut point = match orientation.rotation() {
        0 => Point { x, y },
        1 => Point { x: y, y: h - x },
        2 => Point { x: w - x, y: h - y },
        _ => Point { x: w - y, y: x },
    };
    if orientation.is_mirrored() {
        point.x = w - point.x;
    }
    point
}

/// Window coordinates → device frame coordinates.
pub fn window_to_frame_coords(display: &dyn Display, x: i32, y: i32) -> Point {
    let (sx, sy) = display.hidpi_scale();
    drawable_to_frame_coords(display, (x as f32 * sx) as i32, (y as f32 * sy) as i32)
}

/// Drawable coordinates → device frame coordinates.
pub fn drawable_to_frame_coords(display: &dyn Display, x: i32, y: i32) -> Point {
    let orientation = display.orientation();
    let frame_size = display.frame_size();
    let (origin, oriented) = display.content_rect();

    let ow = oriented.width.max(1) as i64;
    let oh = oriented.height.max(1) as i64;

    // Scale from the content rect to the oriented frame.
    let oriented_size = if orientation.is_swapped() { frame_size.rotated() } else { frame_size };
    let ox = ((x - origin.x) as i64 * oriented_size.width as i64 / ow) as i32;
    let oy = ((y - origin.y) as i64 * oriented_size.height as i64 / oh) as i32;

    unorient_point(Point { x: ox, y: oy }, frame_size, orientation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_orientation() {
        let size = Size { width: 1080, height: 1920 };
        let p = unorient_point(Point { x: 100, y: 200 }, size, Orientation::Deg0);
        assert_eq!(p, Point { x: 100, y: 200 });
    }

    #[test]
    fn quarter_turns_invert() {
        let size = Size { width: 1080, height: 1920 };
        // A point displayed after a 90° clockwise rotation: the oriented
        // image is 1920x1080; its top-right corner area maps back to the
        // frame's top-left area.
        let p = unorient_point(Point { x: 1920, y: 0 }, size, Orientation::Deg90);
        assert_eq!(p, Point { x: 0, y: 0 });

        let p = unorient_point(Point { x: 0, y: 0 }, size, Orientation::Deg90);
        assert_eq!(p, Point { x: 0, y: 1920 });

        let p = unorient_point(Point { x: 1080, y: 1920 }, size, Orientation::Deg180);
        assert_eq!(p, Point { x: 0, y: 0 });
    }

    #[test]
    fn mirror_flips_x_only() {
        let size = Size { width: 1000, height: 500 };
        let p = unorient_point(Point { x: 100, y: 200 }, size, Orientation::Flip0);
        assert_eq!(p, Point { x: 900, y: 200 });
    }

    #[test]
    fn rotation_roundtrip() {
        // Rotating a frame point into display space and back is identity;
        // model the forward transform explicitly for every orientation.
        let size = Size { width: 640, height: 480 };
        let frame_point = Point { x: 123, y: 45 };
        for index in 0..8u8 {
            let orientation = Orientation::from_index(index);
            let mut p = frame_point;
            // forward: mirror then rotate clockwise
            if orientation.is_mirrored() {
                p.x = size.width as i32 - p.x;
            }
            let displayed = match orientation.rotation() {
                0 => p,
                1 => Point { x: size.height as i32 - p.y, y: p.x },
                2 => Point {
                    x: size.width as i32 - p.x,
                    y: size.height as i32 - p.y,
                },
                _ => Point { x: p.y, y: size.width as i32 - p.x },
            };
            assert_eq!(
                unorient_point(displayed, size, orientation),
                frame_point,
                "orientation {orientation:?}"
            );
        }
    }
}
