//! Crop rectangle manipulation and image cropping.
//!
//! A crop session manipulates a [`CropRect`] in display units: corner-handle
//! resizes anchor the opposite corner, whole-rect moves clamp the origin, and
//! both preserve the invariants (minimum edge length, fully contained within
//! the bounds, non-negative origin). Committing a crop resolves the display
//! rect to source-buffer pixels and copies that region out.

use crate::bitmap::{Bitmap, EditError};
use crate::mapper::{Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum crop edge length in display units.
pub const MIN_CROP_EDGE: f32 = 50.0;

/// A crop rectangle in display units.
///
/// Maintained invariants (after every engine operation, given bounds B):
/// - `width, height >= min(MIN_CROP_EDGE, B)` on the matching axis
/// - `x, y >= 0` and `x + width <= B.width`, `y + height <= B.height`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// True when the point lies inside the rectangle.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// A draggable corner of a crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CropHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A crop region in source-buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Effective minimum edge for the given bounds extent.
///
/// Images smaller than [`MIN_CROP_EDGE`] use their own extent, so the
/// invariants stay satisfiable.
#[inline]
fn min_edge(extent: f32) -> f32 {
    MIN_CROP_EDGE.min(extent)
}

/// Centered initial crop rectangle at `fraction` of each extent.
///
/// `fraction` is clamped to [0.5, 0.8].
pub fn initial_rect(bounds: Size, fraction: f32) -> CropRect {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.5, 0.8)
    } else {
        0.5
    };

    let width = (bounds.width * fraction).max(min_edge(bounds.width));
    let height = (bounds.height * fraction).max(min_edge(bounds.height));

    CropRect {
        x: (bounds.width - width) / 2.0,
        y: (bounds.height - height) / 2.0,
        width,
        height,
    }
}

/// Resize by dragging a corner handle; the opposite corner stays fixed.
///
/// Non-finite deltas leave the rectangle unchanged.
pub fn resize_rect(rect: CropRect, handle: CropHandle, delta: Vec2, bounds: Size) -> CropRect {
    if !delta.x.is_finite() || !delta.y.is_finite() {
        return rect;
    }

    let min_w = min_edge(bounds.width);
    let min_h = min_edge(bounds.height);

    let (mut left, mut top) = (rect.x, rect.y);
    let (mut right, mut bottom) = (rect.right(), rect.bottom());

    // Limits kept ordered even for a caller-supplied degenerate rect
    let left_max = (right - min_w).max(0.0);
    let top_max = (bottom - min_h).max(0.0);
    let right_min = (left + min_w).min(bounds.width);
    let bottom_min = (top + min_h).min(bounds.height);

    match handle {
        CropHandle::TopLeft => {
            left = (left + delta.x).clamp(0.0, left_max);
            top = (top + delta.y).clamp(0.0, top_max);
        }
        CropHandle::TopRight => {
            right = (right + delta.x).clamp(right_min, bounds.width);
            top = (top + delta.y).clamp(0.0, top_max);
        }
        CropHandle::BottomLeft => {
            left = (left + delta.x).clamp(0.0, left_max);
            bottom = (bottom + delta.y).clamp(bottom_min, bounds.height);
        }
        CropHandle::BottomRight => {
            right = (right + delta.x).clamp(right_min, bounds.width);
            bottom = (bottom + delta.y).clamp(bottom_min, bounds.height);
        }
    }

    CropRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}

/// Move the whole rectangle, clamping the origin so it stays in bounds.
///
/// Size is preserved, unless it already exceeds the bounds, in which case it
/// is clamped to the bounds first.
pub fn shift_rect(rect: CropRect, delta: Vec2, bounds: Size) -> CropRect {
    let width = rect.width.min(bounds.width);
    let height = rect.height.min(bounds.height);

    let (dx, dy) = if delta.x.is_finite() && delta.y.is_finite() {
        (delta.x, delta.y)
    } else {
        (0.0, 0.0)
    };

    CropRect {
        x: (rect.x + dx).clamp(0.0, bounds.width - width),
        y: (rect.y + dy).clamp(0.0, bounds.height - height),
        width,
        height,
    }
}

/// Resolve a display-space crop rectangle to source-buffer pixels.
///
/// Compounds the inverse of the current zoom with the ratio of the native
/// pixel size to the displayed image size, then intersects with the native
/// bounds. A rectangle reduced to zero area yields `EmptyCropRegion`.
pub fn resolve_source_rect(
    rect: CropRect,
    zoom: f32,
    displayed: Size,
    native: Size,
) -> Result<PixelRect, EditError> {
    if !displayed.is_valid() || !native.is_valid() || !zoom.is_finite() || zoom <= 0.0 {
        return Err(EditError::InvalidImage);
    }

    // Undo zoom, then scale display units to native pixels per axis
    let ratio_x = native.width / displayed.width;
    let ratio_y = native.height / displayed.height;

    let left = (rect.x / zoom) * ratio_x;
    let top = (rect.y / zoom) * ratio_y;
    let right = ((rect.x + rect.width) / zoom) * ratio_x;
    let bottom = ((rect.y + rect.height) / zoom) * ratio_y;

    if !left.is_finite() || !top.is_finite() || !right.is_finite() || !bottom.is_finite() {
        return Err(EditError::InvalidImage);
    }

    // Intersect with the native bounds
    let x0 = left.round().clamp(0.0, native.width) as u32;
    let y0 = top.round().clamp(0.0, native.height) as u32;
    let x1 = right.round().clamp(0.0, native.width) as u32;
    let y1 = bottom.round().clamp(0.0, native.height) as u32;

    if x1 <= x0 || y1 <= y0 {
        return Err(EditError::EmptyCropRegion);
    }

    Ok(PixelRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Copy the given pixel region out of the bitmap.
///
/// The region is intersected with the bitmap bounds; an empty intersection
/// aborts with `EmptyCropRegion` and the caller keeps the original bitmap.
pub fn apply_crop(bitmap: &Bitmap, rect: PixelRect) -> Result<Bitmap, EditError> {
    if bitmap.is_empty() {
        return Err(EditError::InvalidImage);
    }

    let left = rect.x.min(bitmap.width);
    let top = rect.y.min(bitmap.height);
    let right = rect.x.saturating_add(rect.width).min(bitmap.width);
    let bottom = rect.y.saturating_add(rect.height).min(bitmap.height);

    if right <= left || bottom <= top {
        return Err(EditError::EmptyCropRegion);
    }

    let out_width = right - left;
    let out_height = bottom - top;

    let mut output = vec![0u8; (out_width as usize) * (out_height as usize) * 4];

    // Copy pixel data row by row
    let src_stride = bitmap.width as usize * 4;
    let dst_stride = out_width as usize * 4;
    for y in 0..out_height as usize {
        let src_start = (top as usize + y) * src_stride + left as usize * 4;
        let dst_start = y * dst_stride;
        output[dst_start..dst_start + dst_stride]
            .copy_from_slice(&bitmap.pixels[src_start..src_start + dst_stride]);
    }

    let mut result = Bitmap::new(out_width, out_height, output);
    result.scale = bitmap.scale;
    Ok(result)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
