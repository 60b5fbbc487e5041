//! Boundary between the seating state machine and whatever draws it.
//!
//! The session never touches a DOM, terminal, or canvas directly. It
//! calls a [`RenderAdapter`] with the exact pieces that changed.

use crate::geometry::Point;
use crate::snapshot::{Revision, UserInfo};
use crate::types::SeatId;

/// Label shown on the commit control while there are unsaved edits.
pub const LABEL_SAVE: &str = "Save";

/// Label shown while a commit is in flight.
pub const LABEL_SAVING: &str = "Saving";

/// Label shown once the last commit succeeded.
pub const LABEL_SAVED: &str = "Saved";

/// Visual side effects requested by the session.
pub trait RenderAdapter: Send {
    /// Redraw one seat. `occupant` is `None` for an empty seat; `is_self`
    /// is true when the occupant is the logged-in user.
    fn render_seat(&mut self, seat_id: SeatId, occupant: Option<&UserInfo>, is_self: bool);

    /// Redraw the whole unassigned list (already sorted).
    fn render_unassigned_list(&mut self, users: &[UserInfo]);

    /// Show the floating preview for `user` at `position`, or hide it
    /// when `position` is `None`.
    fn render_drag_preview(&mut self, user: &UserInfo, position: Option<Point>);

    /// Insert a revision into the visible log at `index` (0 = top).
    fn append_revision_log_entry(&mut self, revision: &Revision, index: usize);

    fn set_commit_control_state(&mut self, enabled: bool, label: &str);

    /// Append `text` to the dismissible error notification.
    fn show_error(&mut self, text: &str);

    /// Hide and empty the error notification.
    fn clear_error(&mut self);
}

/// A single call recorded by [`RecordingRenderer`].
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Seat {
        seat_id: SeatId,
        occupant: Option<crate::types::UserId>,
        is_self: bool,
    },
    Unassigned(Vec<crate::types::UserId>),
    Preview {
        user_id: crate::types::UserId,
        position: Option<Point>,
    },
    RevisionEntry {
        number: crate::types::RevisionNumber,
        index: usize,
    },
    CommitControl {
        enabled: bool,
        label: String,
    },
    Error(String),
    ClearError,
}

/// Renderer that records every call, for assertions in tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderCall>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&mut self) -> Vec<RenderCall> {
        std::mem::take(&mut self.calls)
    }

    /// The most recent commit control state, if any was set.
    pub fn commit_control(&self) -> Option<(bool, &str)> {
        self.calls.iter().rev().find_map(|call| match call {
            RenderCall::CommitControl { enabled, label } => Some((*enabled, label.as_str())),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RenderCall::Error(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl RenderAdapter for RecordingRenderer {
    fn render_seat(&mut self, seat_id: SeatId, occupant: Option<&UserInfo>, is_self: bool) {
        self.calls.push(RenderCall::Seat {
            seat_id,
            occupant: occupant.map(|u| u.user_id),
            is_self,
        });
    }

    fn render_unassigned_list(&mut self, users: &[UserInfo]) {
        self.calls
            .push(RenderCall::Unassigned(users.iter().map(|u| u.user_id).collect()));
    }

    fn render_drag_preview(&mut self, user: &UserInfo, position: Option<Point>) {
        self.calls.push(RenderCall::Preview {
            user_id: user.user_id,
            position,
        });
    }

    fn append_revision_log_entry(&mut self, revision: &Revision, index: usize) {
        self.calls.push(RenderCall::RevisionEntry {
            number: revision.number,
            index,
        });
    }

    fn set_commit_control_state(&mut self, enabled: bool, label: &str) {
        self.calls.push(RenderCall::CommitControl {
            enabled,
            label: label.to_string(),
        });
    }

    fn show_error(&mut self, text: &str) {
        self.calls.push(RenderCall::Error(text.to_string()));
    }

    fn clear_error(&mut self) {
        self.calls.push(RenderCall::ClearError);
    }
}
