//! Tonal adjustment algorithms.
//!
//! Applies the tonal stages of the filter pipeline to RGBA pixel data.
//!
//! ## Stage Order
//! 1. Grayscale desaturation
//! 2. Brightness/contrast
//! 3. Curve contrast (second contrast-only pass)
//!
//! Alpha is never touched by any tonal stage; erased (transparent) regions
//! keep their transparency through re-renders.

use crate::FilterParameters;

/// Apply all tonal stages to an image's pixel data in place.
///
/// # Arguments
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `filters` - The filter values to apply (dilation is handled separately)
pub fn apply_tonal_adjustments(pixels: &mut [u8], filters: &FilterParameters) {
    let filters = filters.clamped();

    // Early exit when every tonal stage is identity
    if !filters.grayscale
        && filters.brightness == 0.0
        && filters.contrast == 1.0
        && filters.curve_contrast == 1.0
    {
        return;
    }

    for chunk in pixels.chunks_exact_mut(4) {
        let mut r = chunk[0] as f32 / 255.0;
        let mut g = chunk[1] as f32 / 255.0;
        let mut b = chunk[2] as f32 / 255.0;

        if filters.grayscale {
            (r, g, b) = apply_grayscale(r, g, b);
        }
        (r, g, b) = apply_brightness_contrast(r, g, b, filters.brightness, filters.contrast);
        (r, g, b) = apply_brightness_contrast(r, g, b, 0.0, filters.curve_contrast);

        chunk[0] = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
        chunk[1] = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
        chunk[2] = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
        // chunk[3] (alpha) passes through
    }
}

/// Calculate luminance using ITU-R BT.709 coefficients.
#[inline]
pub(crate) fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Desaturate to grayscale, preserving luminance.
#[inline]
fn apply_grayscale(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let gray = calculate_luminance(r, g, b);
    (gray, gray, gray)
}

/// Apply a brightness/contrast affine remap.
///
/// Formula: `output = (input - 0.5) * contrast + 0.5 + brightness`,
/// clamped to [0, 1] per channel. Clamping per stage matters: the
/// curve-contrast pass operates on the clamped output of this one.
///
/// The same form serves both the main brightness/contrast stage and the
/// curve-contrast pass (`brightness = 0`).
#[inline]
fn apply_brightness_contrast(
    r: f32,
    g: f32,
    b: f32,
    brightness: f32,
    contrast: f32,
) -> (f32, f32, f32) {
    if brightness == 0.0 && contrast == 1.0 {
        return (r, g, b);
    }
    let midpoint = 0.5;
    (
        ((r - midpoint) * contrast + midpoint + brightness).clamp(0.0, 1.0),
        ((g - midpoint) * contrast + midpoint + brightness).clamp(0.0, 1.0),
        ((b - midpoint) * contrast + midpoint + brightness).clamp(0.0, 1.0),
    )
}
