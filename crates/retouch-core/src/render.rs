//! The filter pipeline: original bitmap + parameters -> display bitmap.
//!
//! Stages run in a fixed order: grayscale, brightness/contrast, curve
//! contrast, line dilation, rotation, horizontal flip, vertical flip.
//! The pipeline is pure and deterministic; identical inputs produce
//! bit-identical output. A stage that cannot produce a result degrades to
//! its input instead of aborting the render.

use crate::adjustments::apply_tonal_adjustments;
use crate::bitmap::Bitmap;
use crate::dilate::{apply_dilation, boldness_radius};
use crate::transform::{apply_flip_horizontal, apply_flip_vertical, apply_rotation};
use crate::{FilterParameters, GeometryState};

/// Render the display bitmap for the given parameters.
///
/// An empty original is returned unchanged (the no-op policy for
/// `InvalidImage` conditions: the caller keeps the bitmap it had).
pub fn render(original: &Bitmap, geometry: &GeometryState, filters: &FilterParameters) -> Bitmap {
    if original.is_empty() {
        return original.clone();
    }

    let filters = filters.clamped();

    // Tonal stages mutate a copy of the source pixels in place
    let mut bitmap = original.clone();
    apply_tonal_adjustments(&mut bitmap.pixels, &filters);

    let bitmap = run_stage(bitmap, |input| {
        apply_dilation(input, boldness_radius(filters.line_boldness))
    });
    let bitmap = run_stage(bitmap, |input| {
        apply_rotation(input, geometry.rotation_degrees())
    });
    let bitmap = run_stage(bitmap, |input| {
        if geometry.flip_horizontal {
            apply_flip_horizontal(input)
        } else {
            input.clone()
        }
    });
    run_stage(bitmap, |input| {
        if geometry.flip_vertical {
            apply_flip_vertical(input)
        } else {
            input.clone()
        }
    })
}

/// Run one pipeline stage, falling back to the stage input when the stage
/// degrades to an empty result.
fn run_stage(input: Bitmap, stage: impl FnOnce(&Bitmap) -> Bitmap) -> Bitmap {
    let output = stage(&input);
    if output.is_empty() && !input.is_empty() {
        input
    } else {
        output
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
