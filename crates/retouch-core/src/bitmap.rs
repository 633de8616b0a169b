//! Core bitmap type and error definitions.

use thiserror::Error;

/// Error types for editing operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EditError {
    /// The source bitmap is missing, empty, or degenerate.
    #[error("Invalid or empty source bitmap")]
    InvalidImage,

    /// The crop rectangle resolved to zero area after clamping.
    #[error("Crop region is empty after clamping")]
    EmptyCropRegion,

    /// A stroke is already in progress; a concurrent start is rejected.
    #[error("A stroke is already active")]
    StrokeAlreadyActive,

    /// A touch sample carried a NaN or infinite coordinate.
    #[error("Touch sample has a non-finite coordinate")]
    NonFiniteSample,
}

/// An owned RGBA pixel buffer.
///
/// Pixels are stored in row-major order, 4 bytes per pixel (R, G, B, A).
/// The `scale` factor relates logical points to pixel samples: a bitmap
/// loaded from a 2x display has `scale = 2.0` and a logical size of half
/// its pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Scale factor relating logical points to pixel samples (>= 1.0).
    pub scale: f32,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a new Bitmap with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            scale: 1.0,
            pixels,
        }
    }

    /// Create a new Bitmap with an explicit point-to-pixel scale factor.
    pub fn with_scale(width: u32, height: u32, scale: f32, pixels: Vec<u8>) -> Self {
        let mut bitmap = Self::new(width, height, pixels);
        bitmap.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        bitmap
    }

    /// Create an empty (zero-sized) bitmap.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            scale: 1.0,
            pixels: Vec::new(),
        }
    }

    /// Create a fully transparent bitmap of the given size.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::new(
            width,
            height,
            vec![0u8; (width as usize) * (height as usize) * 4],
        )
    }

    /// Create a Bitmap from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Convert to an image::RgbaImage for export by the shell.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid bitmap.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Logical size in points (pixel dimensions divided by the scale factor).
    pub fn logical_size(&self) -> (f32, f32) {
        (
            self.width as f32 / self.scale,
            self.height as f32 / self.scale,
        )
    }

    /// Byte offset of the pixel at (x, y). Caller must check bounds.
    #[inline]
    pub(crate) fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Get the RGBA value of the pixel at (x, y), or None when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.pixel_index(x, y);
        Some([
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ])
    }
}
