//! Gesture arbitration: which interaction mode owns a touch sequence.
//!
//! One explicit state machine replaces a tangle of concurrent recognizers
//! fighting over the same touches. The shell feeds discrete touch events in
//! arrival order; the arbiter advances its state and returns the actions the
//! caller must perform. It never invokes callbacks and holds no reference to
//! the bitmap or the engines it gates.
//!
//! Rules enforced here:
//! - a single new contact starts an erase stroke (never a pan);
//! - a second contact aborts the erase and hands the sequence to
//!   multi-finger manipulation, which needs two or more live contacts;
//! - while a crop drag is active, manipulation and erasing are disabled
//!   entirely;
//! - a clean end commits an erase, a cancellation discards it.
//!
//! Move events carry the position of the primary (first) contact; the
//! composed pinch/rotate/pan deltas of a manipulation are computed by the
//! shell's recognizers and applied only while the arbiter reports an active
//! manipulation.

use crate::mapper::Point;
use crate::transform::CropHandle;

/// What a touch grabbed inside an active crop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropTarget {
    /// A corner handle; dragging resizes with the opposite corner fixed.
    Handle(CropHandle),
    /// The rectangle body; dragging moves the whole rect.
    Body,
}

/// Touch phase reported by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Erasing,
    /// Multi-finger pan/pinch/rotate; `active` counts live contacts.
    Manipulating { active: u32 },
    CropDragging { target: CropTarget },
}

/// An action the caller must perform in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    BeginErase(Point),
    ContinueErase(Point),
    CommitErase,
    AbortErase,
    BeginManipulation,
    UpdateManipulation(Point),
    EndManipulation,
    BeginCropDrag(CropTarget, Point),
    UpdateCropDrag(Point),
    EndCropDrag,
    AbortCropDrag,
}

/// The touch-classification state machine.
#[derive(Debug)]
pub struct GestureArbiter {
    state: GestureState,
    /// Live contact count across all modes.
    contacts: u32,
    /// True while a crop session is active; gates erase and manipulation.
    crop_mode: bool,
}

impl Default for GestureArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureArbiter {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            contacts: 0,
            crop_mode: false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn contacts(&self) -> u32 {
        self.contacts
    }

    pub fn crop_mode(&self) -> bool {
        self.crop_mode
    }

    /// Enable or disable the crop session gate.
    ///
    /// Disabling while a crop drag is active aborts that drag.
    pub fn set_crop_mode(&mut self, enabled: bool) -> Vec<GestureAction> {
        self.crop_mode = enabled;
        if !enabled {
            if let GestureState::CropDragging { .. } = self.state {
                self.state = GestureState::Idle;
                return vec![GestureAction::AbortCropDrag];
            }
        }
        Vec::new()
    }

    /// A new contact touched down.
    ///
    /// `crop_target` is the hit-test result against the crop rectangle,
    /// meaningful only while crop mode is active.
    pub fn touch_began(
        &mut self,
        point: Point,
        crop_target: Option<CropTarget>,
    ) -> Vec<GestureAction> {
        self.contacts += 1;

        match self.state {
            GestureState::Idle => {
                if self.crop_mode {
                    // Only the crop rect reacts during a crop session
                    match crop_target {
                        Some(target) => {
                            self.state = GestureState::CropDragging { target };
                            vec![GestureAction::BeginCropDrag(target, point)]
                        }
                        None => Vec::new(),
                    }
                } else if self.contacts == 1 {
                    self.state = GestureState::Erasing;
                    vec![GestureAction::BeginErase(point)]
                } else {
                    // Contacts accumulated while idle (e.g. the first touch
                    // hit nothing): two of them confirm a manipulation
                    self.state = GestureState::Manipulating {
                        active: self.contacts,
                    };
                    vec![GestureAction::BeginManipulation]
                }
            }
            GestureState::Erasing => {
                // Second contact: the stroke is aborted, not committed, and
                // the sequence becomes a multi-finger manipulation
                self.state = GestureState::Manipulating {
                    active: self.contacts,
                };
                vec![GestureAction::AbortErase, GestureAction::BeginManipulation]
            }
            GestureState::Manipulating { .. } => {
                self.state = GestureState::Manipulating {
                    active: self.contacts,
                };
                Vec::new()
            }
            // The active handle wins; extra touches are ignored
            GestureState::CropDragging { .. } => Vec::new(),
        }
    }

    /// A contact moved.
    pub fn touch_moved(&mut self, point: Point) -> Vec<GestureAction> {
        match self.state {
            GestureState::Erasing => vec![GestureAction::ContinueErase(point)],
            GestureState::Manipulating { active } if active >= 2 => {
                vec![GestureAction::UpdateManipulation(point)]
            }
            // A single leftover contact is inert: it must not pan
            GestureState::Manipulating { .. } => Vec::new(),
            GestureState::CropDragging { .. } => vec![GestureAction::UpdateCropDrag(point)],
            GestureState::Idle => Vec::new(),
        }
    }

    /// A contact lifted cleanly.
    pub fn touch_ended(&mut self) -> Vec<GestureAction> {
        self.contacts = self.contacts.saturating_sub(1);

        match self.state {
            GestureState::Erasing => {
                self.state = GestureState::Idle;
                vec![GestureAction::CommitErase]
            }
            GestureState::Manipulating { active } => self.manipulation_contact_down(active),
            GestureState::CropDragging { .. } => {
                if self.contacts == 0 {
                    self.state = GestureState::Idle;
                    vec![GestureAction::EndCropDrag]
                } else {
                    Vec::new()
                }
            }
            GestureState::Idle => Vec::new(),
        }
    }

    /// A contact was cancelled (platform interruption).
    ///
    /// An in-progress erase is discarded, not committed; an in-progress
    /// crop drag reverts to its pre-drag rectangle.
    pub fn touch_cancelled(&mut self) -> Vec<GestureAction> {
        self.contacts = self.contacts.saturating_sub(1);

        match self.state {
            GestureState::Erasing => {
                self.state = GestureState::Idle;
                vec![GestureAction::AbortErase]
            }
            GestureState::Manipulating { active } => self.manipulation_contact_down(active),
            GestureState::CropDragging { .. } => {
                if self.contacts == 0 {
                    self.state = GestureState::Idle;
                    vec![GestureAction::AbortCropDrag]
                } else {
                    Vec::new()
                }
            }
            GestureState::Idle => Vec::new(),
        }
    }

    /// Shared bookkeeping for a manipulation losing one contact.
    fn manipulation_contact_down(&mut self, active: u32) -> Vec<GestureAction> {
        let remaining = active.saturating_sub(1);
        if self.contacts == 0 {
            self.state = GestureState::Idle;
        } else {
            self.state = GestureState::Manipulating { active: remaining };
        }

        // The manipulation ends the moment it drops below two contacts
        if active >= 2 && remaining < 2 {
            vec![GestureAction::EndManipulation]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    // ===== Erase Flow Tests =====

    #[test]
    fn test_single_touch_starts_erase() {
        let mut arbiter = GestureArbiter::new();

        let actions = arbiter.touch_began(p(10.0, 10.0), None);
        assert_eq!(actions, vec![GestureAction::BeginErase(p(10.0, 10.0))]);
        assert_eq!(arbiter.state(), GestureState::Erasing);
    }

    #[test]
    fn test_move_routes_to_erase() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);

        let actions = arbiter.touch_moved(p(12.0, 14.0));
        assert_eq!(actions, vec![GestureAction::ContinueErase(p(12.0, 14.0))]);
    }

    #[test]
    fn test_clean_end_commits_erase() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);

        let actions = arbiter.touch_ended();
        assert_eq!(actions, vec![GestureAction::CommitErase]);
        assert_eq!(arbiter.state(), GestureState::Idle);
        assert_eq!(arbiter.contacts(), 0);
    }

    #[test]
    fn test_cancel_discards_erase() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);

        let actions = arbiter.touch_cancelled();
        assert_eq!(actions, vec![GestureAction::AbortErase]);
        assert_eq!(arbiter.state(), GestureState::Idle);
    }

    // ===== Erase -> Manipulation Handoff Tests =====

    #[test]
    fn test_second_touch_aborts_erase_and_starts_manipulation() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);

        let actions = arbiter.touch_began(p(50.0, 50.0), None);
        assert_eq!(
            actions,
            vec![GestureAction::AbortErase, GestureAction::BeginManipulation]
        );
        assert_eq!(arbiter.state(), GestureState::Manipulating { active: 2 });
    }

    #[test]
    fn test_manipulation_updates_with_two_contacts() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);

        let actions = arbiter.touch_moved(p(30.0, 30.0));
        assert_eq!(actions, vec![GestureAction::UpdateManipulation(p(30.0, 30.0))]);
    }

    #[test]
    fn test_third_contact_joins_manipulation() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);

        let actions = arbiter.touch_began(p(90.0, 90.0), None);
        assert!(actions.is_empty());
        assert_eq!(arbiter.state(), GestureState::Manipulating { active: 3 });
    }

    #[test]
    fn test_single_leftover_contact_is_inert() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);

        let actions = arbiter.touch_ended();
        assert_eq!(actions, vec![GestureAction::EndManipulation]);
        assert_eq!(arbiter.state(), GestureState::Manipulating { active: 1 });

        // The leftover finger must not pan and must not erase
        assert!(arbiter.touch_moved(p(60.0, 60.0)).is_empty());

        let actions = arbiter.touch_ended();
        assert!(actions.is_empty());
        assert_eq!(arbiter.state(), GestureState::Idle);
    }

    #[test]
    fn test_three_to_two_contacts_keeps_manipulating() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);
        arbiter.touch_began(p(90.0, 90.0), None);

        let actions = arbiter.touch_ended();
        assert!(actions.is_empty(), "manipulation continues with 2 contacts");
        assert!(!arbiter.touch_moved(p(40.0, 40.0)).is_empty());
    }

    #[test]
    fn test_erase_never_restarts_mid_sequence() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);
        arbiter.touch_ended();
        arbiter.touch_ended();
        assert_eq!(arbiter.state(), GestureState::Idle);

        // A genuinely new contact may erase again
        let actions = arbiter.touch_began(p(5.0, 5.0), None);
        assert_eq!(actions, vec![GestureAction::BeginErase(p(5.0, 5.0))]);
    }

    #[test]
    fn test_manipulation_cancel_winds_down() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(50.0, 50.0), None);

        let actions = arbiter.touch_cancelled();
        assert_eq!(actions, vec![GestureAction::EndManipulation]);
        let actions = arbiter.touch_cancelled();
        assert!(actions.is_empty());
        assert_eq!(arbiter.state(), GestureState::Idle);
    }

    // ===== Crop Mode Tests =====

    #[test]
    fn test_crop_handle_drag() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);

        let target = CropTarget::Handle(CropHandle::BottomRight);
        let actions = arbiter.touch_began(p(200.0, 200.0), Some(target));
        assert_eq!(
            actions,
            vec![GestureAction::BeginCropDrag(target, p(200.0, 200.0))]
        );

        let actions = arbiter.touch_moved(p(210.0, 220.0));
        assert_eq!(actions, vec![GestureAction::UpdateCropDrag(p(210.0, 220.0))]);

        let actions = arbiter.touch_ended();
        assert_eq!(actions, vec![GestureAction::EndCropDrag]);
        assert_eq!(arbiter.state(), GestureState::Idle);
    }

    #[test]
    fn test_crop_body_drag_moves_rect() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);

        let actions = arbiter.touch_began(p(150.0, 150.0), Some(CropTarget::Body));
        assert_eq!(
            actions,
            vec![GestureAction::BeginCropDrag(CropTarget::Body, p(150.0, 150.0))]
        );
    }

    #[test]
    fn test_crop_mode_disables_erase_and_manipulation() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);

        // A touch missing the crop rect does nothing
        let actions = arbiter.touch_began(p(5.0, 5.0), None);
        assert!(actions.is_empty());
        assert_eq!(arbiter.state(), GestureState::Idle);

        // And a second one must not start a manipulation during cropping
        let actions = arbiter.touch_began(p(80.0, 80.0), None);
        assert!(actions.is_empty());

        arbiter.touch_ended();
        arbiter.touch_ended();
        assert_eq!(arbiter.contacts(), 0);
    }

    #[test]
    fn test_extra_touch_during_crop_drag_ignored() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);

        let target = CropTarget::Handle(CropHandle::TopLeft);
        arbiter.touch_began(p(100.0, 100.0), Some(target));

        let actions = arbiter.touch_began(p(50.0, 50.0), Some(CropTarget::Body));
        assert!(actions.is_empty(), "active handle wins");
        assert_eq!(arbiter.state(), GestureState::CropDragging { target });

        // Drag only ends when every contact lifts
        assert!(arbiter.touch_ended().is_empty());
        assert_eq!(arbiter.touch_ended(), vec![GestureAction::EndCropDrag]);
    }

    #[test]
    fn test_crop_drag_cancelled_reverts() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);
        arbiter.touch_began(p(100.0, 100.0), Some(CropTarget::Body));

        let actions = arbiter.touch_cancelled();
        assert_eq!(actions, vec![GestureAction::AbortCropDrag]);
        assert_eq!(arbiter.state(), GestureState::Idle);
    }

    #[test]
    fn test_leaving_crop_mode_aborts_active_drag() {
        let mut arbiter = GestureArbiter::new();
        arbiter.set_crop_mode(true);
        arbiter.touch_began(p(100.0, 100.0), Some(CropTarget::Body));

        let actions = arbiter.set_crop_mode(false);
        assert_eq!(actions, vec![GestureAction::AbortCropDrag]);
        assert_eq!(arbiter.state(), GestureState::Idle);
        assert!(!arbiter.crop_mode());
    }

    #[test]
    fn test_crop_target_ignored_outside_crop_mode() {
        let mut arbiter = GestureArbiter::new();

        let actions = arbiter.touch_began(p(10.0, 10.0), Some(CropTarget::Body));
        assert_eq!(actions, vec![GestureAction::BeginErase(p(10.0, 10.0))]);
    }

    // ===== Robustness Tests =====

    #[test]
    fn test_stray_end_does_not_underflow() {
        let mut arbiter = GestureArbiter::new();
        assert!(arbiter.touch_ended().is_empty());
        assert_eq!(arbiter.contacts(), 0);
    }

    #[test]
    fn test_idle_move_is_ignored() {
        let mut arbiter = GestureArbiter::new();
        assert!(arbiter.touch_moved(p(1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_full_sequence_returns_to_idle() {
        let mut arbiter = GestureArbiter::new();
        arbiter.touch_began(p(10.0, 10.0), None);
        arbiter.touch_began(p(20.0, 20.0), None);
        arbiter.touch_began(p(30.0, 30.0), None);
        arbiter.touch_ended();
        arbiter.touch_cancelled();
        arbiter.touch_ended();

        assert_eq!(arbiter.state(), GestureState::Idle);
        assert_eq!(arbiter.contacts(), 0);
    }
}
