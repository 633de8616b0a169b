//! Image rotation and mirroring.
//!
//! Quarter turns (90/180/270) are exact pixel shuffles and lossless. Other
//! angles use inverse mapping with bilinear interpolation: for each pixel in
//! the output image we calculate which source pixels contribute to it and
//! interpolate their values. The output canvas is expanded to the rotated
//! bounding box, and pixels outside the source map to transparent.

use crate::bitmap::Bitmap;

/// Compute the dimensions of the bounding box for a rotated image.
///
/// When an image is rotated, the corners extend beyond the original bounds.
/// This function calculates the minimum bounding box that contains the
/// entire rotated image.
///
/// # Arguments
///
/// * `width` - Original image width
/// * `height` - Original image height
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    // Normalize angle to handle 360, 720, negatives, etc.
    let angle_normalized = angle_degrees.rem_euclid(360.0);

    // Fast path: no rotation needed (including near-zero and multiples of 360)
    if angle_normalized < 0.001 || angle_normalized > 359.999 {
        return (width, height);
    }

    // Fast path: exact 90/270 degree rotations (swap dimensions)
    if (angle_normalized - 90.0).abs() < 0.001 || (angle_normalized - 270.0).abs() < 0.001 {
        return (height, width);
    }

    // Fast path: exact 180 degree rotation (same dimensions)
    if (angle_normalized - 180.0).abs() < 0.001 {
        return (width, height);
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // Bounding box of a rotated rectangle:
    // new_w = |w*cos| + |h*sin|
    // new_h = |w*sin| + |h*cos|
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Quarter-turn count for angles that are exact multiples of 90 degrees.
fn quarter_turns(angle_degrees: f64) -> Option<u32> {
    let normalized = angle_degrees.rem_euclid(360.0);
    let steps = normalized / 90.0;
    if (steps - steps.round()).abs() < 1e-9 {
        Some((steps.round() as u32) % 4)
    } else {
        None
    }
}

/// Apply rotation about the image center.
///
/// The output canvas is expanded to fit the entire rotated image (no
/// clipping). Multiples of 90 degrees take an exact shuffle path; other
/// angles are resampled bilinearly with transparent fill outside the source.
pub fn apply_rotation(bitmap: &Bitmap, angle_degrees: f64) -> Bitmap {
    if bitmap.is_empty() {
        return bitmap.clone();
    }

    if let Some(turns) = quarter_turns(angle_degrees) {
        return match turns {
            1 => rotate_quarter_ccw(bitmap),
            2 => rotate_half(bitmap),
            3 => rotate_quarter_cw(bitmap),
            _ => bitmap.clone(),
        };
    }

    rotate_arbitrary(bitmap, angle_degrees)
}

/// Mirror the image on the X axis (left-right).
pub fn apply_flip_horizontal(bitmap: &Bitmap) -> Bitmap {
    if bitmap.is_empty() {
        return bitmap.clone();
    }
    remap(bitmap, bitmap.width, bitmap.height, |x, y, w, _| {
        (w - 1 - x, y)
    })
}

/// Mirror the image on the Y axis (top-bottom).
pub fn apply_flip_vertical(bitmap: &Bitmap) -> Bitmap {
    if bitmap.is_empty() {
        return bitmap.clone();
    }
    remap(bitmap, bitmap.width, bitmap.height, |x, y, _, h| {
        (x, h - 1 - y)
    })
}

/// 90 degrees counter-clockwise: output is height x width.
fn rotate_quarter_ccw(bitmap: &Bitmap) -> Bitmap {
    remap(bitmap, bitmap.height, bitmap.width, |x, y, _, h| {
        (y, h - 1 - x)
    })
}

/// 180 degrees: same dimensions, both axes reversed.
fn rotate_half(bitmap: &Bitmap) -> Bitmap {
    remap(bitmap, bitmap.width, bitmap.height, |x, y, w, h| {
        (w - 1 - x, h - 1 - y)
    })
}

/// 270 degrees counter-clockwise (90 clockwise): output is height x width.
fn rotate_quarter_cw(bitmap: &Bitmap) -> Bitmap {
    remap(bitmap, bitmap.height, bitmap.width, |x, y, w, _| {
        (w - 1 - y, x)
    })
}

/// Build a new bitmap where every destination pixel copies a source pixel.
///
/// `source_of(dst_x, dst_y, src_w, src_h) -> (src_x, src_y)` must stay in
/// bounds; the shuffle paths guarantee this by construction.
fn remap(
    bitmap: &Bitmap,
    dst_w: u32,
    dst_h: u32,
    source_of: impl Fn(u32, u32, u32, u32) -> (u32, u32),
) -> Bitmap {
    let mut output = vec![0u8; (dst_w as usize) * (dst_h as usize) * 4];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let (src_x, src_y) = source_of(dst_x, dst_y, bitmap.width, bitmap.height);
            let src_idx = bitmap.pixel_index(src_x, src_y);
            let dst_idx = ((dst_y as usize) * (dst_w as usize) + (dst_x as usize)) * 4;
            output[dst_idx..dst_idx + 4].copy_from_slice(&bitmap.pixels[src_idx..src_idx + 4]);
        }
    }

    let mut result = Bitmap::new(dst_w, dst_h, output);
    result.scale = bitmap.scale;
    result
}

/// General-angle rotation via inverse-mapped bilinear sampling.
fn rotate_arbitrary(bitmap: &Bitmap, angle_degrees: f64) -> Bitmap {
    let (src_w, src_h) = (bitmap.width as f64, bitmap.height as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(bitmap.width, bitmap.height, angle_degrees);

    // Negate angle for correct visual rotation direction
    // (positive angle should rotate counter-clockwise visually)
    let angle_rad = -angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = vec![0u8; (dst_w as usize) * (dst_h as usize) * 4];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Translate destination point to origin at center
            let dx = dst_x as f64 - dst_cx;
            let dy = dst_y as f64 - dst_cy;

            // Apply inverse rotation to find source coordinates
            let src_x = dx * cos - dy * sin + src_cx;
            let src_y = dx * sin + dy * cos + src_cy;

            let dst_idx = ((dst_y as usize) * (dst_w as usize) + (dst_x as usize)) * 4;
            let pixel = sample_bilinear(bitmap, src_x, src_y);
            output[dst_idx..dst_idx + 4].copy_from_slice(&pixel);
        }
    }

    let mut result = Bitmap::new(dst_w, dst_h, output);
    result.scale = bitmap.scale;
    result
}

/// Get a pixel as [f64; 4] at the given coordinates.
#[inline]
fn get_pixel_f64(bitmap: &Bitmap, px: usize, py: usize) -> [f64; 4] {
    let idx = (py * bitmap.width as usize + px) * 4;
    [
        bitmap.pixels[idx] as f64,
        bitmap.pixels[idx + 1] as f64,
        bitmap.pixels[idx + 2] as f64,
        bitmap.pixels[idx + 3] as f64,
    ]
}

/// Sample a pixel using bilinear interpolation.
///
/// The 4 nearest pixels are weighted by distance. Out-of-bounds samples
/// return transparent so the expanded canvas stays clear around the image.
fn sample_bilinear(bitmap: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (bitmap.width as i64, bitmap.height as i64);

    if x < 0.0 || x >= (w - 1) as f64 || y < 0.0 || y >= (h - 1) as f64 {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    // Fractional distances
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(bitmap, x0, y0);
    let p10 = get_pixel_f64(bitmap, x1, y0);
    let p01 = get_pixel_f64(bitmap, x0, y1);
    let p11 = get_pixel_f64(bitmap, x1, y1);

    let mut result = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }

    result
}
