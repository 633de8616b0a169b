//! Geometric transform operations: rotation, flips, and cropping.
//!
//! # Transform Order
//!
//! The pipeline applies geometry after the tonal stages, in this order:
//! 1. Rotation (accumulated quarter turns; arbitrary angles supported)
//! 2. Horizontal flip
//! 3. Vertical flip
//!
//! Cropping operates on the working bitmap outside the render pipeline.
//!
//! # Coordinate System
//!
//! - Rotation angles are in degrees, positive = counter-clockwise
//! - Crop rectangles are in display units with the origin at the top-left
//! - Pixel rectangles are in source-buffer pixels

mod crop;
mod rotation;

pub use crop::{
    apply_crop, initial_rect, resize_rect, resolve_source_rect, shift_rect, CropHandle, CropRect,
    PixelRect, MIN_CROP_EDGE,
};
pub use rotation::{
    apply_flip_horizontal, apply_flip_vertical, apply_rotation, compute_rotated_bounds,
};
