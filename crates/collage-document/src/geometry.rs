//! Coordinate conversion and rotation math.
//!
//! Gesture APIs and the rendered canvas speak pixels; the document stores
//! percent-of-canvas positions so it stays resolution independent. Every
//! conversion between the two goes through this module.

use serde::{Deserialize, Serialize};

/// Measured canvas dimensions, in pixels.
///
/// A zero dimension means "not measured yet".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns true once both dimensions are known.
    pub fn is_measured(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Arrow-key nudge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit step in screen space (y grows downwards).
    pub fn unit(&self) -> (f64, f64) {
        match self {
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
        }
    }
}

/// Converts a pixel length to percent of `total`.
///
/// Returns 0 when `total` is 0 (canvas not yet measured).
pub fn pixels_to_percent(px: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    px / total * 100.0
}

/// Converts percent of `total` to a pixel length.
pub fn percent_to_pixels(percent: f64, total: f64) -> f64 {
    percent / 100.0 * total
}

/// Clamps `value` into `[min, max]`.
pub fn clamp_percent(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Clamps `value` into `[0, 100]`.
pub fn clamp_percent_default(value: f64) -> f64 {
    clamp_percent(value, 0.0, 100.0)
}

/// Keeps a `width` x `height` box at `(x, y)` fully inside the canvas.
///
/// When the box is larger than the canvas the allowed range is empty and
/// the coordinate is pinned to 0.
pub fn clamp_to_canvas(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    canvas_width: f64,
    canvas_height: f64,
) -> (f64, f64) {
    let clamped_x = x.min(canvas_width - width).max(0.0);
    let clamped_y = y.min(canvas_height - height).max(0.0);
    (clamped_x, clamped_y)
}

/// Angle of the pointer around a center, in degrees (`atan2` convention).
pub fn angle_between(center_x: f64, center_y: f64, pointer_x: f64, pointer_y: f64) -> f64 {
    (pointer_y - center_y).atan2(pointer_x - center_x).to_degrees()
}

/// Brings any angle into `[0, 360)`.
///
/// Non-finite input maps to 0.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Pointer state captured when a rotate gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnchor {
    pub center: PixelPoint,
    pub start_angle: f64,
    pub start_rotation: f64,
}

impl RotationAnchor {
    pub fn new(center: PixelPoint, pointer: PixelPoint, start_rotation: f64) -> Self {
        Self {
            center,
            start_angle: angle_between(center.x, center.y, pointer.x, pointer.y),
            start_rotation,
        }
    }

    /// Rotation for the current pointer position.
    pub fn rotation_at(&self, pointer: PixelPoint) -> f64 {
        let now = angle_between(self.center.x, self.center.y, pointer.x, pointer.y);
        normalize_degrees(self.start_rotation + now - self.start_angle)
    }
}
