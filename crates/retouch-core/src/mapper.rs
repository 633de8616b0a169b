//! View-space to image-space coordinate mapping.
//!
//! The displayed image is aspect-fit inside the view: scaled by
//! `min(view_width / image_width, view_height / image_height)` and centered,
//! possibly leaving empty space along one axis. Touch points arrive in view
//! space and must land on image (and ultimately pixel-buffer) coordinates.
//!
//! Nothing here is cached: every mapping is recomputed from the sizes passed
//! in, so the mapping stays correct across view resizes.

use serde::{Deserialize, Serialize};

/// A point in some 2D coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A 2D offset or movement delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2D extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// The aspect-fit placement of an image within a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    /// Uniform scale from image units to view units.
    pub scale: f32,
    /// View-space offset of the image's top-left corner.
    pub offset_x: f32,
    /// View-space offset of the image's top-left corner.
    pub offset_y: f32,
    /// Scaled image width in view units.
    pub width: f32,
    /// Scaled image height in view units.
    pub height: f32,
}

impl FitRect {
    /// A degenerate placement that maps every point to the origin.
    pub fn empty() -> Self {
        Self {
            scale: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }
}

/// Compute the aspect-fit rectangle of `image` centered within `view`.
///
/// Degenerate sizes (zero, negative, or non-finite) yield [`FitRect::empty`].
pub fn fit_rect(view: Size, image: Size) -> FitRect {
    if !view.is_valid() || !image.is_valid() {
        return FitRect::empty();
    }

    let scale = (view.width / image.width).min(view.height / image.height);
    let width = image.width * scale;
    let height = image.height * scale;

    FitRect {
        scale,
        offset_x: (view.width - width) / 2.0,
        offset_y: (view.height - height) / 2.0,
        width,
        height,
    }
}

/// Map a view-space point to image coordinates.
///
/// The result is clamped to `[0, image]` on each axis, so points dragged
/// outside the visible frame never produce out-of-bounds coordinates.
pub fn view_to_image(point: Point, view: Size, image: Size) -> Point {
    let fit = fit_rect(view, image);
    if fit.scale <= 0.0 {
        return Point::ZERO;
    }

    Point {
        x: ((point.x - fit.offset_x) / fit.scale).clamp(0.0, image.width),
        y: ((point.y - fit.offset_y) / fit.scale).clamp(0.0, image.height),
    }
}

/// Map an image-space point back to view coordinates.
pub fn image_to_view(point: Point, view: Size, image: Size) -> Point {
    let fit = fit_rect(view, image);
    Point {
        x: point.x * fit.scale + fit.offset_x,
        y: point.y * fit.scale + fit.offset_y,
    }
}

/// Map a view-space point directly to pixel-buffer coordinates.
///
/// Composes the aspect-fit mapping (view to logical image points) with the
/// bitmap's point-to-pixel scale factor. The result is clamped to the pixel
/// extent implied by `image_logical * pixel_scale`.
pub fn view_to_pixel(point: Point, view: Size, image_logical: Size, pixel_scale: f32) -> Point {
    let logical = view_to_image(point, view, image_logical);
    let scale = if pixel_scale.is_finite() && pixel_scale > 0.0 {
        pixel_scale
    } else {
        1.0
    };
    Point {
        x: logical.x * scale,
        y: logical.y * scale,
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
