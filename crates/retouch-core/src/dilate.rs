//! Morphological maximum (dilation) filter for line boldness.
//!
//! Each output pixel takes the per-channel maximum found in a square window
//! of the given radius around it, thickening line work. The filter reads from
//! the source buffer and writes a new one; dilation cannot be done in place.

use crate::bitmap::Bitmap;

/// Window radius for a given line boldness value.
///
/// Boldness <= 1.0 maps to radius 0 (the filter is skipped entirely).
pub fn boldness_radius(line_boldness: f32) -> u32 {
    if !(line_boldness > 1.0) {
        return 0;
    }
    (line_boldness * 2.0).round() as u32
}

/// Apply a morphological maximum with the given window radius.
///
/// Returns a new bitmap of the same dimensions. A radius of 0 or an empty
/// input returns a plain clone.
pub fn apply_dilation(bitmap: &Bitmap, radius: u32) -> Bitmap {
    if radius == 0 || bitmap.is_empty() {
        return bitmap.clone();
    }

    let width = bitmap.width as i64;
    let height = bitmap.height as i64;
    let r = radius as i64;

    let mut output = vec![0u8; bitmap.pixels.len()];

    for y in 0..height {
        // Window rows, clamped to the image
        let y0 = (y - r).max(0);
        let y1 = (y + r).min(height - 1);

        for x in 0..width {
            let x0 = (x - r).max(0);
            let x1 = (x + r).min(width - 1);

            let mut max = [0u8; 4];
            for wy in y0..=y1 {
                let row = (wy * width) as usize * 4;
                for wx in x0..=x1 {
                    let idx = row + (wx as usize) * 4;
                    let px = &bitmap.pixels[idx..idx + 4];
                    for (m, &v) in max.iter_mut().zip(px) {
                        if v > *m {
                            *m = v;
                        }
                    }
                }
            }

            let out_idx = ((y * width + x) as usize) * 4;
            output[out_idx..out_idx + 4].copy_from_slice(&max);
        }
    }

    let mut result = Bitmap::new(bitmap.width, bitmap.height, output);
    result.scale = bitmap.scale;
    result
}
