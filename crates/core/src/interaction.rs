//! Drag-and-drop interaction controller.
//!
//! Mouse and touch input are both fed in as [`PointerGesture`]s. The
//! controller is a two-state machine (`Idle`, `Dragging`): a press on an
//! occupied seat or an unassigned user starts a drag, moves only
//! reposition the preview, and the release decides the single store
//! mutation (if any). Touch releases carry no drop target, so they are
//! resolved by hit-testing the release point.

use crate::assignment::{AssignOutcome, AssignmentStore, Location, StoreChange};
use crate::error::CoreError;
use crate::geometry::{popup_position, Point, Size, Viewport};
use crate::snapshot::UserInfo;
use crate::types::{SeatId, UserId};

/// Which input device produced a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// `mousedown` / `touchstart`.
    Start,
    /// `mousemove` / `touchmove`.
    Move,
    /// `mouseup` / `touchend`.
    End,
    /// The gesture was aborted by the platform (e.g. `touchcancel`).
    Cancel,
}

/// The element under the pointer, as far as seating is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Seat(SeatId),
    /// A user card inside the unassigned area.
    UnassignedUser(UserId),
    /// The unassigned area itself.
    UnassignedArea,
    Elsewhere,
}

/// One normalized pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerGesture {
    pub source: PointerSource,
    pub phase: GesturePhase,
    /// Client coordinates of the pointer (first touch for touch input).
    pub position: Point,
    /// Element the platform dispatched the event on. Ignored for touch
    /// releases, which are hit-tested instead.
    pub target: Option<HitTarget>,
}

impl PointerGesture {
    pub fn mouse(phase: GesturePhase, position: Point, target: Option<HitTarget>) -> Self {
        Self {
            source: PointerSource::Mouse,
            phase,
            position,
            target,
        }
    }

    pub fn touch(phase: GesturePhase, position: Point, target: Option<HitTarget>) -> Self {
        Self {
            source: PointerSource::Touch,
            phase,
            position,
            target,
        }
    }
}

/// Resolves the element under a client-space point.
pub trait HitTester {
    fn hit_test(&self, position: Point) -> HitTarget;
}

impl<F> HitTester for F
where
    F: Fn(Point) -> HitTarget,
{
    fn hit_test(&self, position: Point) -> HitTarget {
        self(position)
    }
}

/// Measurements the preview placement depends on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreviewLayout {
    pub popup: Size,
    pub viewport: Viewport,
}

/// Where a drag picked its user up from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrigin {
    Seat(SeatId),
    Unassigned,
}

/// State of an in-progress drag. Dropped when the gesture ends.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub user: UserInfo,
    pub origin: DragOrigin,
    pub preview: Point,
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What a completed drop did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropResult {
    Assigned {
        seat_id: SeatId,
        change: StoreChange,
    },
    /// Dropped on an occupied seat; the mapping is untouched.
    Rejected { seat_id: SeatId, occupant: UserId },
    Unassigned(StoreChange),
    /// Dropped outside any target, or cancelled.
    Discarded,
}

impl DropResult {
    /// The store change, when the drop mutated anything.
    pub fn change(&self) -> Option<&StoreChange> {
        match self {
            Self::Assigned { change, .. } | Self::Unassigned(change) if !change.is_empty() => {
                Some(change)
            }
            _ => None,
        }
    }
}

/// Result of feeding one gesture to the controller.
#[derive(Debug)]
pub enum GestureOutcome {
    /// Nothing to do (e.g. press on an empty seat, move while idle).
    Ignored,
    Started { user: UserInfo, preview: Point },
    Moved { user: UserInfo, preview: Point },
    Dropped { user: UserInfo, result: DropResult },
    /// The drop hit a store error; the drag is over regardless.
    DropFailed { user: UserInfo, error: CoreError },
}

impl GestureOutcome {
    /// Whether the host should suppress the platform's default handling
    /// (text selection, native drag, scrolling) for this event.
    pub fn suppress_default(&self) -> bool {
        matches!(self, Self::Started { .. } | Self::Moved { .. })
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    layout: PreviewLayout,
}

impl DragController {
    pub fn new(layout: PreviewLayout) -> Self {
        Self {
            state: DragState::Idle,
            layout,
        }
    }

    /// Update measurements after a resize or scroll.
    pub fn set_layout(&mut self, layout: PreviewLayout) {
        self.layout = layout;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    /// Drive the state machine with one gesture.
    pub fn handle(
        &mut self,
        gesture: PointerGesture,
        store: &mut AssignmentStore,
        hit_tester: &dyn HitTester,
    ) -> GestureOutcome {
        match gesture.phase {
            GesturePhase::Start => self.start(gesture, store),
            GesturePhase::Move => self.move_to(gesture.position),
            GesturePhase::End => {
                let target = match gesture.source {
                    PointerSource::Touch => hit_tester.hit_test(gesture.position),
                    PointerSource::Mouse => gesture.target.unwrap_or(HitTarget::Elsewhere),
                };
                self.drop_on(target, store)
            }
            GesturePhase::Cancel => self.cancel(),
        }
    }

    /// Abandon any drag in progress without touching the store.
    pub fn cancel(&mut self) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => GestureOutcome::Dropped {
                user: session.user,
                result: DropResult::Discarded,
            },
            DragState::Idle => GestureOutcome::Ignored,
        }
    }

    // ---- private helpers ----

    fn start(&mut self, gesture: PointerGesture, store: &AssignmentStore) -> GestureOutcome {
        if self.is_dragging() {
            return GestureOutcome::Ignored;
        }

        let picked = match gesture.target {
            Some(HitTarget::Seat(seat_id)) => store
                .occupant(seat_id)
                .map(|user_id| (user_id, DragOrigin::Seat(seat_id))),
            Some(HitTarget::UnassignedUser(user_id)) => {
                match store.locate(user_id) {
                    Ok(Some(Location::Unassigned)) => Some((user_id, DragOrigin::Unassigned)),
                    _ => None,
                }
            }
            _ => None,
        };
        let Some((user_id, origin)) = picked else {
            return GestureOutcome::Ignored;
        };
        let Some(user) = store.user(user_id).cloned() else {
            return GestureOutcome::Ignored;
        };

        let preview = self.place(gesture.position);
        tracing::debug!(user_id, ?origin, "Drag started");
        self.state = DragState::Dragging(DragSession {
            user: user.clone(),
            origin,
            preview,
        });
        GestureOutcome::Started { user, preview }
    }

    fn move_to(&mut self, position: Point) -> GestureOutcome {
        let preview = self.place(position);
        match &mut self.state {
            DragState::Dragging(session) => {
                session.preview = preview;
                GestureOutcome::Moved {
                    user: session.user.clone(),
                    preview,
                }
            }
            DragState::Idle => GestureOutcome::Ignored,
        }
    }

    fn drop_on(&mut self, target: HitTarget, store: &mut AssignmentStore) -> GestureOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return GestureOutcome::Ignored;
        };
        let user_id = session.user.user_id;

        let result = match target {
            HitTarget::Seat(seat_id) => match store.assign_seat(seat_id, user_id) {
                Ok(AssignOutcome::Assigned(change)) => Ok(DropResult::Assigned { seat_id, change }),
                Ok(AssignOutcome::Rejected { occupant }) => {
                    Ok(DropResult::Rejected { seat_id, occupant })
                }
                Err(e) => Err(e),
            },
            HitTarget::UnassignedUser(_) | HitTarget::UnassignedArea => {
                store.unassign_user(user_id).map(DropResult::Unassigned)
            }
            HitTarget::Elsewhere => Ok(DropResult::Discarded),
        };

        match result {
            Ok(result) => {
                tracing::debug!(user_id, ?target, ?result, "Drag dropped");
                GestureOutcome::Dropped {
                    user: session.user,
                    result,
                }
            }
            Err(error) => GestureOutcome::DropFailed {
                user: session.user,
                error,
            },
        }
    }

    fn place(&self, position: Point) -> Point {
        popup_position(position, self.layout.popup, self.layout.viewport)
    }
}
