//! The edit session: composition root owning the bitmaps and edit state.
//!
//! An [`EditSession`] owns the original bitmap, the current parameter
//! values, and the working bitmap the eraser mutates. The surrounding shell
//! feeds it coordinate-mapped touch events and parameter changes; results
//! come back as return values, never callbacks.
//!
//! The working bitmap is the render output (original + filters + geometry)
//! with erase marks applied on top. Replacing filters or geometry re-derives
//! it from the original, so erasures are kept only until the next
//! re-render; committing promotes the working bitmap to be the new
//! original. Cropping also commits: the cropped working bitmap becomes the
//! new original and the session parameters reset.

use crate::bitmap::{Bitmap, EditError};
use crate::brush::{BrushStrokeEngine, DirtyRect};
use crate::gesture::{CropTarget, GestureAction, GestureArbiter, GestureState, TouchPhase};
use crate::mapper::{view_to_image, Point, Size, Vec2};
use crate::render::render;
use crate::transform::{
    apply_crop, initial_rect, resize_rect, resolve_source_rect, shift_rect, CropRect,
};
use crate::{FilterParameters, GeometryState};

/// Grab distance around a crop corner, in display units.
const HANDLE_GRAB_RADIUS: f32 = 30.0;

/// Default eraser radius in working-buffer pixels.
const DEFAULT_BRUSH_RADIUS: f32 = 20.0;

/// Display zoom comfort bounds.
const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 8.0;

/// State for an in-progress crop-rect drag.
struct CropDrag {
    /// Rect at drag start, restored on abort.
    origin: CropRect,
    target: CropTarget,
    last_point: Point,
}

/// Owns the original bitmap, edit parameters, and the working buffer.
pub struct EditSession {
    original: Bitmap,
    working: Bitmap,
    filters: FilterParameters,
    geometry: GeometryState,
    brush: BrushStrokeEngine,
    brush_radius: f32,
    arbiter: GestureArbiter,
    crop_rect: Option<CropRect>,
    crop_drag: Option<CropDrag>,
    last_stroke_dirty: Option<DirtyRect>,
    needs_render: bool,
}

impl EditSession {
    /// Create a session around a loaded bitmap.
    pub fn new(original: Bitmap) -> Result<Self, EditError> {
        if original.is_empty() {
            return Err(EditError::InvalidImage);
        }
        let working = original.clone();
        Ok(Self {
            original,
            working,
            filters: FilterParameters::default(),
            geometry: GeometryState::default(),
            brush: BrushStrokeEngine::new(),
            brush_radius: DEFAULT_BRUSH_RADIUS,
            arbiter: GestureArbiter::new(),
            crop_rect: None,
            crop_drag: None,
            last_stroke_dirty: None,
            needs_render: false,
        })
    }

    pub fn original(&self) -> &Bitmap {
        &self.original
    }

    /// The working bitmap, re-rendered if parameters changed.
    ///
    /// Re-rendering is deferred to this accessor so a burst of slider
    /// changes costs one render, not one per intermediate value.
    pub fn working(&mut self) -> &Bitmap {
        self.ensure_rendered();
        &self.working
    }

    pub fn filters(&self) -> FilterParameters {
        self.filters
    }

    pub fn geometry(&self) -> GeometryState {
        self.geometry
    }

    pub fn arbiter_state(&self) -> GestureState {
        self.arbiter.state()
    }

    pub fn crop_rect(&self) -> Option<CropRect> {
        self.crop_rect
    }

    /// Pixel region touched by the most recently committed stroke.
    pub fn take_last_stroke_dirty(&mut self) -> Option<DirtyRect> {
        self.last_stroke_dirty.take()
    }

    /// Set the eraser radius in working-buffer pixels (floored at 0.5).
    pub fn set_brush_radius(&mut self, radius: f32) {
        self.brush_radius = if radius.is_finite() {
            radius.max(0.5)
        } else {
            DEFAULT_BRUSH_RADIUS
        };
    }

    /// Replace the filter parameters.
    ///
    /// Cancels any active stroke or crop session first, then marks the
    /// working bitmap for re-derivation.
    pub fn set_filters(&mut self, filters: FilterParameters) {
        self.cancel_active_interactions();
        self.filters = filters;
        self.needs_render = true;
    }

    /// Replace the geometry state.
    pub fn set_geometry(&mut self, geometry: GeometryState) {
        self.cancel_active_interactions();
        self.geometry = geometry;
        self.needs_render = true;
    }

    /// Restore default parameters and re-derive the working bitmap.
    pub fn reset(&mut self) {
        self.cancel_active_interactions();
        self.filters = FilterParameters::default();
        self.geometry = GeometryState::default();
        self.needs_render = true;
    }

    /// Promote the working bitmap to be the new original.
    ///
    /// An active stroke is cancelled, not committed; parameters reset.
    pub fn commit_as_original(&mut self) {
        self.cancel_active_interactions();
        self.ensure_rendered();
        self.original = self.working.clone();
        self.filters = FilterParameters::default();
        self.geometry = GeometryState::default();
        self.needs_render = false;
    }

    // ===== Touch routing =====

    /// Advance the gesture arbiter with one touch event and apply the
    /// resulting actions. Returns the actions for the shell's benefit.
    ///
    /// `view_point` is in view coordinates; `view_size` is the current view
    /// extent. Both are re-queried per event, never cached.
    pub fn handle_touch(
        &mut self,
        phase: TouchPhase,
        view_point: Point,
        view_size: Size,
    ) -> Vec<GestureAction> {
        self.ensure_rendered();

        let display_point = self.to_display_space(view_point, view_size);
        let actions = match phase {
            TouchPhase::Began => {
                let target = self.hit_test_crop(display_point);
                self.arbiter.touch_began(display_point, target)
            }
            TouchPhase::Moved => self.arbiter.touch_moved(display_point),
            TouchPhase::Ended => self.arbiter.touch_ended(),
            TouchPhase::Cancelled => self.arbiter.touch_cancelled(),
        };

        for action in &actions {
            self.apply_action(*action);
        }
        actions
    }

    /// Apply a composed pinch/pan update from the shell's recognizers.
    ///
    /// Ignored unless a multi-finger manipulation is live; single-finger
    /// movement can never reach this path.
    pub fn apply_manipulation(&mut self, scale_factor: f32, pan_delta: Vec2) {
        let GestureState::Manipulating { active } = self.arbiter.state() else {
            return;
        };
        if active < 2 {
            return;
        }

        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.geometry.zoom_scale =
                (self.geometry.zoom_scale * scale_factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
        if pan_delta.x.is_finite() && pan_delta.y.is_finite() {
            self.geometry.pan_offset.x += pan_delta.x;
            self.geometry.pan_offset.y += pan_delta.y;
        }
    }

    // ===== Stroke lifecycle (direct entry points for the shell) =====

    /// Begin an erase stroke at a working-buffer pixel point.
    ///
    /// A second concurrent start or a non-finite point is rejected and
    /// ignored; the error is informational.
    pub fn begin_stroke(&mut self, pixel_point: Point) -> Result<(), EditError> {
        self.ensure_rendered();
        self.brush
            .begin_stroke(&mut self.working, pixel_point, self.brush_radius)
    }

    pub fn continue_stroke(&mut self, pixel_point: Point) -> Result<(), EditError> {
        self.brush.continue_stroke(&mut self.working, pixel_point)
    }

    /// Commit the stroke; returns the touched region.
    pub fn end_stroke(&mut self) -> Option<DirtyRect> {
        self.brush.end_stroke(&self.working)
    }

    /// Discard the stroke, restoring the pre-stroke working buffer.
    pub fn cancel_stroke(&mut self) {
        self.brush.cancel_stroke(&mut self.working);
    }

    // ===== Crop lifecycle =====

    /// Start a crop session with a centered rect at `fraction` of the
    /// displayed extent. Cancels any active stroke first.
    pub fn begin_crop(&mut self, fraction: f32) {
        self.brush.cancel_stroke(&mut self.working);
        self.ensure_rendered();

        let bounds = self.display_bounds();
        self.crop_rect = Some(initial_rect(bounds, fraction));
        self.crop_drag = None;
        let _ = self.arbiter.set_crop_mode(true);
    }

    /// Resize the crop rect by dragging `handle`.
    pub fn resize_crop(&mut self, handle: crate::transform::CropHandle, delta: Vec2) {
        let bounds = self.display_bounds();
        if let Some(rect) = self.crop_rect {
            self.crop_rect = Some(resize_rect(rect, handle, delta, bounds));
        }
    }

    /// Move the crop rect by `delta`.
    pub fn move_crop(&mut self, delta: Vec2) {
        let bounds = self.display_bounds();
        if let Some(rect) = self.crop_rect {
            self.crop_rect = Some(shift_rect(rect, delta, bounds));
        }
    }

    /// Apply the crop: the cropped working bitmap becomes the new original
    /// and the session parameters reset. On failure the bitmaps are left
    /// untouched and the crop session stays open.
    pub fn commit_crop(&mut self) -> Result<(), EditError> {
        self.ensure_rendered();
        let rect = self.crop_rect.ok_or(EditError::EmptyCropRegion)?;

        let logical = self.logical_size();
        let native = Size::new(self.working.width as f32, self.working.height as f32);
        let source = resolve_source_rect(rect, self.zoom(), logical, native)?;
        let cropped = apply_crop(&self.working, source)?;

        self.original = cropped.clone();
        self.working = cropped;
        self.filters = FilterParameters::default();
        self.geometry = GeometryState::default();
        self.needs_render = false;
        self.end_crop_session();
        Ok(())
    }

    /// Abandon the crop session, keeping the bitmaps unchanged.
    pub fn cancel_crop(&mut self) {
        self.end_crop_session();
    }

    // ===== Internals =====

    fn ensure_rendered(&mut self) {
        if self.needs_render {
            // An active stroke would be orphaned by the buffer swap
            self.brush.cancel_stroke(&mut self.working);
            self.working = render(&self.original, &self.geometry, &self.filters);
            self.needs_render = false;
        }
    }

    fn cancel_active_interactions(&mut self) {
        self.brush.cancel_stroke(&mut self.working);
        if self.crop_rect.is_some() {
            self.end_crop_session();
        }
    }

    fn end_crop_session(&mut self) {
        self.crop_rect = None;
        self.crop_drag = None;
        let _ = self.arbiter.set_crop_mode(false);
    }

    /// Current zoom, sanitized: the shell may hand us a degenerate value.
    fn zoom(&self) -> f32 {
        let zoom = self.geometry.zoom_scale;
        if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            1.0
        }
    }

    /// Logical (point) size of the working bitmap.
    fn logical_size(&self) -> Size {
        let (w, h) = self.working.logical_size();
        Size::new(w, h)
    }

    /// Displayed extent: logical size under the current zoom.
    fn display_bounds(&self) -> Size {
        let logical = self.logical_size();
        Size::new(logical.width * self.zoom(), logical.height * self.zoom())
    }

    /// Map a view point into the zoomed display space the crop rect and
    /// touch classification operate in.
    fn to_display_space(&self, view_point: Point, view_size: Size) -> Point {
        let logical = view_to_image(view_point, view_size, self.logical_size());
        Point {
            x: logical.x * self.zoom(),
            y: logical.y * self.zoom(),
        }
    }

    /// Map a display-space point onto working-buffer pixels.
    fn display_to_pixel(&self, display_point: Point) -> Point {
        let scale = self.working.scale / self.zoom();
        Point {
            x: display_point.x * scale,
            y: display_point.y * scale,
        }
    }

    /// Hit-test a display point against the crop rect (handles first).
    fn hit_test_crop(&self, point: Point) -> Option<CropTarget> {
        use crate::transform::CropHandle::*;

        let rect = self.crop_rect?;
        let corners = [
            (TopLeft, rect.x, rect.y),
            (TopRight, rect.right(), rect.y),
            (BottomLeft, rect.x, rect.bottom()),
            (BottomRight, rect.right(), rect.bottom()),
        ];

        for (handle, cx, cy) in corners {
            let dx = point.x - cx;
            let dy = point.y - cy;
            if dx * dx + dy * dy <= HANDLE_GRAB_RADIUS * HANDLE_GRAB_RADIUS {
                return Some(CropTarget::Handle(handle));
            }
        }

        rect.contains(point.x, point.y).then_some(CropTarget::Body)
    }

    fn apply_action(&mut self, action: GestureAction) {
        match action {
            GestureAction::BeginErase(point) => {
                let pixel = self.display_to_pixel(point);
                // StrokeAlreadyActive / NonFiniteSample are dropped here:
                // first touch wins, bad samples are ignored
                let _ = self
                    .brush
                    .begin_stroke(&mut self.working, pixel, self.brush_radius);
            }
            GestureAction::ContinueErase(point) => {
                let pixel = self.display_to_pixel(point);
                let _ = self.brush.continue_stroke(&mut self.working, pixel);
            }
            GestureAction::CommitErase => {
                self.last_stroke_dirty = self.brush.end_stroke(&self.working);
            }
            GestureAction::AbortErase => {
                self.brush.cancel_stroke(&mut self.working);
            }
            GestureAction::BeginManipulation | GestureAction::EndManipulation => {
                // Zoom/pan deltas arrive via apply_manipulation
            }
            GestureAction::UpdateManipulation(_) => {}
            GestureAction::BeginCropDrag(target, point) => {
                if let Some(rect) = self.crop_rect {
                    self.crop_drag = Some(CropDrag {
                        origin: rect,
                        target,
                        last_point: point,
                    });
                }
            }
            GestureAction::UpdateCropDrag(point) => {
                let bounds = self.display_bounds();
                if let (Some(drag), Some(rect)) = (self.crop_drag.as_mut(), self.crop_rect) {
                    let delta = Vec2::new(point.x - drag.last_point.x, point.y - drag.last_point.y);
                    drag.last_point = point;
                    self.crop_rect = Some(match drag.target {
                        CropTarget::Handle(handle) => resize_rect(rect, handle, delta, bounds),
                        CropTarget::Body => shift_rect(rect, delta, bounds),
                    });
                }
            }
            GestureAction::EndCropDrag => {
                self.crop_drag = None;
            }
            GestureAction::AbortCropDrag => {
                // Revert to the rect captured at drag start
                if let Some(drag) = self.crop_drag.take() {
                    self.crop_rect = Some(drag.origin);
                }
            }
        }
    }
}
