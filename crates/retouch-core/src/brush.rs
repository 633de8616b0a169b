//! Freehand eraser operating on a working pixel buffer.
//!
//! A stroke is one touch-down-to-touch-up interaction. `begin_stroke` stamps
//! a filled circle and snapshots the buffer so the stroke can be rolled back;
//! `continue_stroke` stamps a round-capped capsule from the previous sample
//! to the new one, so fast motion leaves no gaps between samples. Erased
//! pixels are set fully transparent (RGBA zero).
//!
//! Only one stroke may be active at a time; a concurrent `begin_stroke`
//! is rejected with `StrokeAlreadyActive` (first touch wins).

use crate::bitmap::{Bitmap, EditError};
use crate::mapper::Point;

/// The pixel region touched by a stroke, for minimal redraw by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl DirtyRect {
    /// An empty rect that any expansion will replace.
    pub fn empty() -> Self {
        Self {
            left: i32::MAX,
            top: i32::MAX,
            right: i32::MIN,
            bottom: i32::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Grow to include a circle of `radius` around (x, y).
    fn expand(&mut self, x: i32, y: i32, radius: i32) {
        self.left = self.left.min(x - radius);
        self.top = self.top.min(y - radius);
        self.right = self.right.max(x + radius + 1);
        self.bottom = self.bottom.max(y + radius + 1);
    }

    /// Intersect with the pixel bounds of a buffer.
    fn clamp_to(mut self, width: u32, height: u32) -> Self {
        self.left = self.left.max(0);
        self.top = self.top.max(0);
        self.right = self.right.min(width as i32);
        self.bottom = self.bottom.min(height as i32);
        self
    }
}

/// Internal stroke state.
enum StrokeState {
    Idle,
    Stroking {
        last_point: Point,
        radius: f32,
        /// Pre-stroke pixel snapshot; restored on cancel.
        snapshot: Vec<u8>,
        dirty: DirtyRect,
    },
}

/// Stateful eraser: stamps transparent circles/capsules along a stroke path.
pub struct BrushStrokeEngine {
    state: StrokeState,
}

impl Default for BrushStrokeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BrushStrokeEngine {
    pub fn new() -> Self {
        Self {
            state: StrokeState::Idle,
        }
    }

    /// True while a stroke is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, StrokeState::Stroking { .. })
    }

    /// Begin a stroke at `point` with the given brush radius.
    ///
    /// Snapshots the buffer for rollback, then erases a filled circle.
    /// Rejected with `StrokeAlreadyActive` while another stroke is active
    /// (callers ignore the rejection per the first-touch-wins policy), with
    /// `NonFiniteSample` for a NaN/infinite point, and with `InvalidImage`
    /// for an empty buffer; the engine stays Idle in every rejection case.
    pub fn begin_stroke(
        &mut self,
        bitmap: &mut Bitmap,
        point: Point,
        radius: f32,
    ) -> Result<(), EditError> {
        if self.is_active() {
            return Err(EditError::StrokeAlreadyActive);
        }
        if bitmap.is_empty() {
            return Err(EditError::InvalidImage);
        }
        if !point.is_finite() {
            return Err(EditError::NonFiniteSample);
        }

        let radius = sanitize_radius(radius);
        let snapshot = bitmap.pixels.clone();
        let mut dirty = DirtyRect::empty();
        stamp_segment(bitmap, point, point, radius, &mut dirty);

        self.state = StrokeState::Stroking {
            last_point: point,
            radius,
            snapshot,
            dirty,
        };
        Ok(())
    }

    /// Extend the active stroke to `point`.
    ///
    /// Erases a round-capped capsule from the previous sample. A non-finite
    /// sample is dropped (`NonFiniteSample`) and the stroke continues from
    /// the last valid point. A call with no active stroke is a no-op.
    pub fn continue_stroke(&mut self, bitmap: &mut Bitmap, point: Point) -> Result<(), EditError> {
        let StrokeState::Stroking {
            last_point,
            radius,
            dirty,
            ..
        } = &mut self.state
        else {
            return Ok(());
        };

        if !point.is_finite() {
            return Err(EditError::NonFiniteSample);
        }

        stamp_segment(bitmap, *last_point, point, *radius, dirty);
        *last_point = point;
        Ok(())
    }

    /// Finish the stroke, committing the erased marks.
    ///
    /// Returns the touched pixel region (clamped to the buffer), or None
    /// when no stroke was active or nothing inside the buffer was touched.
    pub fn end_stroke(&mut self, bitmap: &Bitmap) -> Option<DirtyRect> {
        match std::mem::replace(&mut self.state, StrokeState::Idle) {
            StrokeState::Idle => None,
            StrokeState::Stroking { dirty, .. } => {
                let clamped = dirty.clamp_to(bitmap.width, bitmap.height);
                (!clamped.is_empty()).then_some(clamped)
            }
        }
    }

    /// Abort the stroke, restoring the buffer to its pre-stroke state.
    ///
    /// A call with no active stroke is a no-op.
    pub fn cancel_stroke(&mut self, bitmap: &mut Bitmap) {
        if let StrokeState::Stroking { snapshot, .. } =
            std::mem::replace(&mut self.state, StrokeState::Idle)
        {
            // The buffer cannot be resized mid-stroke; the length check
            // guards against a caller swapping bitmaps underneath us.
            if snapshot.len() == bitmap.pixels.len() {
                bitmap.pixels = snapshot;
            }
        }
    }
}

/// Minimum usable brush radius in pixels.
fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() {
        radius.max(0.5)
    } else {
        0.5
    }
}

/// Erase a round-capped capsule of half-width `radius` from `a` to `b`.
///
/// Every pixel whose center lies within `radius` of the segment is set to
/// transparent. Out-of-bounds portions are clipped.
fn stamp_segment(bitmap: &mut Bitmap, a: Point, b: Point, radius: f32, dirty: &mut DirtyRect) {
    let width = bitmap.width as i32;
    let height = bitmap.height as i32;

    let x0 = ((a.x.min(b.x) - radius).floor() as i32).max(0);
    let y0 = ((a.y.min(b.y) - radius).floor() as i32).max(0);
    let x1 = ((a.x.max(b.x) + radius).ceil() as i32).min(width - 1);
    let y1 = ((a.y.max(b.y) + radius).ceil() as i32).min(height - 1);

    if x0 > x1 || y0 > y1 {
        return;
    }

    let radius_sq = radius * radius;

    for py in y0..=y1 {
        for px in x0..=x1 {
            let d2 = distance_sq_to_segment(px as f32, py as f32, a, b);
            if d2 <= radius_sq {
                let idx = bitmap.pixel_index(px as u32, py as u32);
                bitmap.pixels[idx..idx + 4].fill(0);
            }
        }
    }

    let r = radius.ceil() as i32;
    dirty.expand(a.x.round() as i32, a.y.round() as i32, r);
    dirty.expand(b.x.round() as i32, b.y.round() as i32, r);
}

/// Squared distance from (px, py) to the segment a-b.
#[inline]
fn distance_sq_to_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let apx = px - a.x;
    let apy = py - a.y;

    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let cx = apx - t * abx;
    let cy = apy - t * aby;
    cx * cx + cy * cy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_image(width: u32, height: u32) -> Bitmap {
        Bitmap::new(
            width,
            height,
            vec![255u8; (width as usize) * (height as usize) * 4],
        )
    }

    fn alpha_at(bitmap: &Bitmap, x: u32, y: u32) -> u8 {
        bitmap.pixel(x, y).unwrap()[3]
    }

    // ===== Lifecycle Tests =====

    #[test]
    fn test_begin_erases_circle() {
        let mut bitmap = opaque_image(20, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 3.0)
            .unwrap();

        assert_eq!(alpha_at(&bitmap, 10, 10), 0);
        assert_eq!(alpha_at(&bitmap, 13, 10), 0); // on the boundary
        assert_eq!(alpha_at(&bitmap, 14, 10), 255); // outside
        assert_eq!(alpha_at(&bitmap, 0, 0), 255);
    }

    #[test]
    fn test_second_begin_rejected() {
        let mut bitmap = opaque_image(20, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(5.0, 5.0), 2.0)
            .unwrap();
        let result = engine.begin_stroke(&mut bitmap, Point::new(15.0, 15.0), 2.0);

        assert_eq!(result, Err(EditError::StrokeAlreadyActive));
        // The rejected touch must not have stamped anything
        assert_eq!(alpha_at(&bitmap, 15, 15), 255);
        assert!(engine.is_active());
    }

    #[test]
    fn test_begin_on_empty_bitmap_rejected() {
        let mut bitmap = Bitmap::empty();
        let mut engine = BrushStrokeEngine::new();

        let result = engine.begin_stroke(&mut bitmap, Point::new(1.0, 1.0), 2.0);
        assert_eq!(result, Err(EditError::InvalidImage));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_begin_with_nan_rejected() {
        let mut bitmap = opaque_image(10, 10);
        let mut engine = BrushStrokeEngine::new();

        let result = engine.begin_stroke(&mut bitmap, Point::new(f32::NAN, 1.0), 2.0);
        assert_eq!(result, Err(EditError::NonFiniteSample));
        assert!(!engine.is_active());
        assert!(bitmap.pixels.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_end_returns_dirty_rect() {
        let mut bitmap = opaque_image(40, 40);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 4.0)
            .unwrap();
        engine
            .continue_stroke(&mut bitmap, Point::new(25.0, 10.0))
            .unwrap();
        let dirty = engine.end_stroke(&bitmap).unwrap();

        assert!(!engine.is_active());
        assert!(dirty.left <= 6 && dirty.right >= 29);
        assert!(dirty.top <= 6 && dirty.bottom >= 14);
    }

    #[test]
    fn test_stray_end_and_continue_are_noops() {
        let mut bitmap = opaque_image(10, 10);
        let mut engine = BrushStrokeEngine::new();

        assert!(engine.end_stroke(&bitmap).is_none());
        assert!(engine
            .continue_stroke(&mut bitmap, Point::new(5.0, 5.0))
            .is_ok());
        assert!(bitmap.pixels.iter().all(|&v| v == 255));
    }

    // ===== Capsule Coverage Tests =====

    #[test]
    fn test_vertical_stroke_capsule_coverage() {
        // Stroke (10,10) -> (10,50) at radius 5: capsule covers
        // x in [5, 15], y in [10, 50] plus the round caps.
        let mut bitmap = opaque_image(30, 70);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 5.0)
            .unwrap();
        engine
            .continue_stroke(&mut bitmap, Point::new(10.0, 50.0))
            .unwrap();
        engine.end_stroke(&bitmap);

        // Inside the capsule
        assert_eq!(alpha_at(&bitmap, 5, 30), 0);
        assert_eq!(alpha_at(&bitmap, 15, 30), 0);
        assert_eq!(alpha_at(&bitmap, 10, 10), 0);
        assert_eq!(alpha_at(&bitmap, 10, 50), 0);
        assert_eq!(alpha_at(&bitmap, 10, 55), 0); // bottom cap

        // Outside
        assert_eq!(alpha_at(&bitmap, 4, 30), 255);
        assert_eq!(alpha_at(&bitmap, 16, 30), 255);
        assert_eq!(alpha_at(&bitmap, 10, 56), 255);
        assert_eq!(alpha_at(&bitmap, 4, 4), 255); // corner beyond top cap
    }

    #[test]
    fn test_fast_motion_leaves_no_gap() {
        // Two distant samples: every pixel along the join line is erased
        let mut bitmap = opaque_image(100, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(5.0, 10.0), 2.0)
            .unwrap();
        engine
            .continue_stroke(&mut bitmap, Point::new(95.0, 10.0))
            .unwrap();

        for x in 5..=95 {
            assert_eq!(alpha_at(&bitmap, x, 10), 0, "gap at x = {x}");
        }
    }

    #[test]
    fn test_erase_is_idempotent() {
        let mut bitmap = opaque_image(20, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 4.0)
            .unwrap();
        engine.end_stroke(&bitmap);
        let after_first = bitmap.pixels.clone();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 4.0)
            .unwrap();
        engine.end_stroke(&bitmap);

        assert_eq!(bitmap.pixels, after_first);
    }

    #[test]
    fn test_stroke_clipped_at_edges() {
        let mut bitmap = opaque_image(10, 10);
        let mut engine = BrushStrokeEngine::new();

        // Center outside the buffer; only the overlapping part is erased
        engine
            .begin_stroke(&mut bitmap, Point::new(-2.0, 5.0), 4.0)
            .unwrap();
        assert_eq!(alpha_at(&bitmap, 0, 5), 0);
        assert_eq!(alpha_at(&bitmap, 1, 5), 0);
        assert_eq!(alpha_at(&bitmap, 5, 5), 255);
    }

    // ===== NaN Handling Tests =====

    #[test]
    fn test_nan_sample_dropped_stroke_continues() {
        let mut bitmap = opaque_image(60, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 2.0)
            .unwrap();
        let result = engine.continue_stroke(&mut bitmap, Point::new(f32::NAN, 10.0));
        assert_eq!(result, Err(EditError::NonFiniteSample));
        assert!(engine.is_active(), "stroke survives a dropped sample");

        // Next valid sample joins from the last valid point (10, 10)
        engine
            .continue_stroke(&mut bitmap, Point::new(40.0, 10.0))
            .unwrap();
        for x in 10..=40 {
            assert_eq!(alpha_at(&bitmap, x, 10), 0, "gap at x = {x}");
        }
    }

    #[test]
    fn test_infinite_sample_dropped() {
        let mut bitmap = opaque_image(20, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 2.0)
            .unwrap();
        let before = bitmap.pixels.clone();
        let result = engine.continue_stroke(&mut bitmap, Point::new(10.0, f32::INFINITY));

        assert_eq!(result, Err(EditError::NonFiniteSample));
        assert_eq!(bitmap.pixels, before, "dropped sample must not stamp");
    }

    // ===== Cancel Tests =====

    #[test]
    fn test_cancel_restores_pre_stroke_buffer() {
        let mut bitmap = opaque_image(20, 20);
        let before = bitmap.pixels.clone();
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(10.0, 10.0), 5.0)
            .unwrap();
        engine
            .continue_stroke(&mut bitmap, Point::new(15.0, 15.0))
            .unwrap();
        assert_ne!(bitmap.pixels, before);

        engine.cancel_stroke(&mut bitmap);
        assert_eq!(bitmap.pixels, before, "cancel rolls back every pixel");
        assert!(!engine.is_active());
    }

    #[test]
    fn test_cancel_without_stroke_is_noop() {
        let mut bitmap = opaque_image(10, 10);
        let before = bitmap.pixels.clone();
        let mut engine = BrushStrokeEngine::new();

        engine.cancel_stroke(&mut bitmap);
        assert_eq!(bitmap.pixels, before);
    }

    #[test]
    fn test_new_stroke_allowed_after_cancel() {
        let mut bitmap = opaque_image(20, 20);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(5.0, 5.0), 2.0)
            .unwrap();
        engine.cancel_stroke(&mut bitmap);

        assert!(engine
            .begin_stroke(&mut bitmap, Point::new(8.0, 8.0), 2.0)
            .is_ok());
    }

    // ===== Radius Tests =====

    #[test]
    fn test_radius_floor() {
        let mut bitmap = opaque_image(10, 10);
        let mut engine = BrushStrokeEngine::new();

        // Zero and non-finite radii erase at least the touched pixel
        engine
            .begin_stroke(&mut bitmap, Point::new(5.0, 5.0), 0.0)
            .unwrap();
        assert_eq!(alpha_at(&bitmap, 5, 5), 0);
        engine.end_stroke(&bitmap);

        engine
            .begin_stroke(&mut bitmap, Point::new(2.0, 2.0), f32::NAN)
            .unwrap();
        assert_eq!(alpha_at(&bitmap, 2, 2), 0);
    }

    #[test]
    fn test_dirty_rect_empty_for_off_canvas_stroke() {
        let mut bitmap = opaque_image(10, 10);
        let mut engine = BrushStrokeEngine::new();

        engine
            .begin_stroke(&mut bitmap, Point::new(500.0, 500.0), 3.0)
            .unwrap();
        assert!(engine.end_stroke(&bitmap).is_none());
        assert!(bitmap.pixels.iter().all(|&v| v == 255));
    }
}
