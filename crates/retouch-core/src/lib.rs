//! Retouch Core - Raster editing engine
//!
//! This crate provides the core editing functionality for Retouch: the
//! non-destructive filter pipeline, view/image coordinate mapping, the
//! freehand eraser, cropping, and the gesture arbitration that decides which
//! interaction mode owns a touch sequence.

pub mod adjustments;
pub mod bitmap;
pub mod brush;
pub mod dilate;
pub mod gesture;
pub mod mapper;
pub mod render;
pub mod session;
pub mod transform;

pub use bitmap::{Bitmap, EditError};
pub use brush::{BrushStrokeEngine, DirtyRect};
pub use gesture::{CropTarget, GestureAction, GestureArbiter, GestureState, TouchPhase};
pub use mapper::{fit_rect, image_to_view, view_to_image, view_to_pixel, Point, Size, Vec2};
pub use render::render;
pub use session::EditSession;
pub use transform::{
    apply_crop, apply_flip_horizontal, apply_flip_vertical, apply_rotation,
    compute_rotated_bounds, initial_rect, resize_rect, resolve_source_rect, shift_rect, CropHandle,
    CropRect, PixelRect, MIN_CROP_EDGE,
};

/// Filter parameters for the tonal/line pipeline.
///
/// An immutable value replaced wholesale on each user adjustment; the
/// pipeline itself holds no state.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FilterParameters {
    /// Brightness offset (-1.0 to 1.0)
    pub brightness: f32,
    /// Contrast multiplier around the midpoint (0.5 to 2.0)
    pub contrast: f32,
    /// Second contrast-only pass approximating a tone curve (0.0 to 2.0)
    pub curve_contrast: f32,
    /// Line-thickening dilation strength (0.5 to 3.0); <= 1.0 is a no-op
    pub line_boldness: f32,
    /// Desaturate to luminance-preserving grayscale
    pub grayscale: bool,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            curve_contrast: 1.0,
            line_boldness: 1.0,
            grayscale: false,
        }
    }
}

impl FilterParameters {
    /// Create new filter parameters with identity values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults (the pipeline is identity).
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Return a copy with every field clamped to its documented range.
    pub fn clamped(&self) -> Self {
        Self {
            brightness: self.brightness.clamp(-1.0, 1.0),
            contrast: self.contrast.clamp(0.5, 2.0),
            curve_contrast: self.curve_contrast.clamp(0.0, 2.0),
            line_boldness: self.line_boldness.clamp(0.5, 3.0),
            grayscale: self.grayscale,
        }
    }
}

/// Geometric view state: accumulated quarter-turn rotation, flips, zoom, pan.
///
/// Independent of [`FilterParameters`]; geometry is composed after the tonal
/// stages in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeometryState {
    /// Accumulated quarter turns; each step is 90 degrees, positive =
    /// counter-clockwise.
    pub quarter_turns: i32,
    /// Mirror on the X axis.
    pub flip_horizontal: bool,
    /// Mirror on the Y axis.
    pub flip_vertical: bool,
    /// Display zoom scale (> 0).
    pub zoom_scale: f32,
    /// Display pan offset in view units.
    pub pan_offset: Vec2,
}

impl Default for GeometryState {
    fn default() -> Self {
        Self {
            quarter_turns: 0,
            flip_horizontal: false,
            flip_vertical: false,
            zoom_scale: 1.0,
            pan_offset: Vec2::ZERO,
        }
    }
}

impl GeometryState {
    /// Create a new identity geometry state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Accumulated rotation in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.quarter_turns as f64 * 90.0
    }

    /// Add one clockwise quarter turn.
    pub fn rotate_cw(&mut self) {
        self.quarter_turns -= 1;
    }

    /// Add one counter-clockwise quarter turn.
    pub fn rotate_ccw(&mut self) {
        self.quarter_turns += 1;
    }
}
