//! The seating session: one owned state object per open seating page.
//!
//! [`SeatingSession`] ties together the assignment store, the drag
//! controller, the revision log, the user directory, and the save state,
//! and forwards every visible change to a [`RenderAdapter`].
//!
//! Network round-trips are split in two halves so the session itself stays
//! synchronous and IO-free:
//!
//! 1. `begin_*` records the request and returns a ticket.
//! 2. `apply_*` takes the ticket back with the remote result and checks
//!    it is still relevant before touching any state.
//!
//! Superseded snapshot loads, live polls that raced a local edit or drag,
//! and commit results overtaken by a newer commit are all dropped at
//! step 2. A background poll never supersedes a load the user asked for.

use std::collections::HashMap;
use std::fmt::Display;

use crate::assignment::{AssignmentStore, StoreChange};
use crate::error::CoreError;
use crate::interaction::{DragController, GestureOutcome, HitTester, PointerGesture, PreviewLayout};
use crate::render::{RenderAdapter, LABEL_SAVE, LABEL_SAVED, LABEL_SAVING};
use crate::revision::RevisionLog;
use crate::snapshot::{Revision, SeatingSnapshot, SubmitLayout, UserInfo};
use crate::types::{RevisionNumber, UserId};

/// Shown when a snapshot could not be fetched or was malformed.
pub const LOAD_ERROR: &str = "The seating configuration could not be retrieved.";

/// Shown when the revision log could not be fetched.
pub const REVISION_LOG_ERROR: &str = "The current revision log could not be retrieved.";

/// Shown when a commit failed.
pub const SAVE_ERROR: &str = "There was an error saving your changes.";

/// Shown when the store detected a user in two places.
pub const INVARIANT_ERROR: &str = "The seating plan is inconsistent. Please reload the page.";

/// Static facts about the person using the session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// The logged-in user, whose seat is highlighted.
    pub logged_in_user: Option<UserId>,
    /// Publishers may read the revision log and publish revisions.
    pub is_publisher: bool,
    pub layout: PreviewLayout,
}

/// Commit control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    /// Nothing to save; matches the last loaded live snapshot.
    #[default]
    Clean,
    /// Local edits not yet submitted.
    Dirty,
    /// A submission is in flight.
    Committing,
    /// The last submission succeeded and nothing changed since.
    Saved,
}

impl SaveState {
    pub fn has_unsaved_edits(self) -> bool {
        matches!(self, Self::Dirty | Self::Committing)
    }

    /// `(enabled, label)` for the commit control.
    pub fn control(self) -> (bool, &'static str) {
        match self {
            Self::Clean => (false, LABEL_SAVE),
            Self::Dirty => (true, LABEL_SAVE),
            Self::Committing => (false, LABEL_SAVING),
            Self::Saved => (false, LABEL_SAVED),
        }
    }
}

/// Who asked for a snapshot load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Explicit navigation (initial load, clicking a revision).
    User,
    /// Background live refresh.
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    revision: Option<RevisionNumber>,
    origin: LoadOrigin,
    edit_generation: u64,
}

impl LoadTicket {
    /// `None` for the live snapshot.
    pub fn revision(&self) -> Option<RevisionNumber> {
        self.revision
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionLogTicket {
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTicket {
    seq: u64,
    edit_generation: u64,
    layout: SubmitLayout,
}

impl CommitTicket {
    /// The serialized assignment captured when the commit began.
    pub fn layout(&self) -> &SubmitLayout {
        &self.layout
    }
}

/// Why a remote result was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// A newer request of the same kind was issued after this one.
    Superseded,
    /// A live poll raced a local edit, a drag, or a revision switch.
    LocalActivity,
}

/// What happened to a remote result handed to an `apply_*` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The remote call failed; an error was shown and state kept.
    Failed,
    Stale(StaleReason),
}

/// Whether a background tick should refresh the live snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    LoadLive,
    /// A user-requested load is still in flight.
    SkipPendingLoad,
    SkipHistorical,
    SkipDragging,
    SkipUnsavedEdits,
}

/// Result of [`SeatingSession::handle_gesture`].
#[derive(Debug, Default)]
pub struct GestureResponse {
    /// The host should suppress the platform default for the event.
    pub suppress_default: bool,
    /// A commit the caller must submit (live view autosave).
    pub commit: Option<CommitTicket>,
}

pub struct SeatingSession<R: RenderAdapter> {
    config: SessionConfig,
    store: AssignmentStore,
    controller: DragController,
    revisions: RevisionLog,
    /// Every user seen in any loaded snapshot; first record wins.
    users: HashMap<UserId, UserInfo>,
    /// Revision on screen; `None` is the live state.
    viewing: Option<RevisionNumber>,
    save_state: SaveState,
    /// Bumped on every local mutation and every wholesale load.
    edit_generation: u64,
    /// Last load of any origin.
    load_seq: u64,
    /// Last load the user asked for; background polls never supersede it.
    user_load_seq: u64,
    user_load_pending: bool,
    revision_log_seq: u64,
    commit_seq: u64,
    last_commit_success: u64,
    errors: Vec<String>,
    renderer: R,
}

impl<R: RenderAdapter> SeatingSession<R> {
    pub fn new(config: SessionConfig, mut renderer: R) -> Self {
        let (enabled, label) = SaveState::Clean.control();
        renderer.set_commit_control_state(enabled, label);

        Self {
            controller: DragController::new(config.layout),
            config,
            store: AssignmentStore::new(),
            revisions: RevisionLog::new(),
            users: HashMap::new(),
            viewing: None,
            save_state: SaveState::Clean,
            edit_generation: 0,
            load_seq: 0,
            user_load_seq: 0,
            user_load_pending: false,
            revision_log_seq: 0,
            commit_seq: 0,
            last_commit_success: 0,
            errors: Vec::new(),
            renderer,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    pub fn revisions(&self) -> &RevisionLog {
        &self.revisions
    }

    pub fn viewing(&self) -> Option<RevisionNumber> {
        self.viewing
    }

    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }

    pub fn known_user(&self, user_id: UserId) -> Option<&UserInfo> {
        self.users.get(&user_id)
    }

    pub fn known_user_count(&self) -> usize {
        self.users.len()
    }

    /// Errors currently shown in the notification, oldest first.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn set_layout(&mut self, layout: PreviewLayout) {
        self.config.layout = layout;
        self.controller.set_layout(layout);
    }

    /// Dismiss the error notification.
    pub fn dismiss_errors(&mut self) {
        self.errors.clear();
        self.renderer.clear_error();
    }

    // ---- interaction ----

    /// Feed one pointer gesture through the drag controller.
    ///
    /// Mutations are rendered and mark the session dirty. In live view a
    /// mutation also begins a commit, returned for the caller to submit.
    pub fn handle_gesture(
        &mut self,
        gesture: PointerGesture,
        hit_tester: &dyn HitTester,
    ) -> GestureResponse {
        let outcome = self.controller.handle(gesture, &mut self.store, hit_tester);
        let mut response = GestureResponse {
            suppress_default: outcome.suppress_default(),
            commit: None,
        };

        match outcome {
            GestureOutcome::Ignored => {}
            GestureOutcome::Started { user, preview } | GestureOutcome::Moved { user, preview } => {
                self.renderer.render_drag_preview(&user, Some(preview));
            }
            GestureOutcome::Dropped { user, result } => {
                self.renderer.render_drag_preview(&user, None);
                if let Some(change) = result.change() {
                    self.render_change(change);
                    self.mark_dirty();
                    if self.viewing.is_none() {
                        response.commit = self.begin_commit();
                    }
                }
            }
            GestureOutcome::DropFailed { user, error } => {
                self.renderer.render_drag_preview(&user, None);
                self.report_core_error(error);
            }
        }
        response
    }

    // ---- snapshot loading ----

    /// Start loading `revision` (or the live state for `None`).
    pub fn begin_load(
        &mut self,
        revision: Option<RevisionNumber>,
        origin: LoadOrigin,
    ) -> LoadTicket {
        self.load_seq += 1;
        if origin == LoadOrigin::User {
            self.user_load_seq = self.load_seq;
            self.user_load_pending = true;
        }
        LoadTicket {
            seq: self.load_seq,
            revision,
            origin,
            edit_generation: self.edit_generation,
        }
    }

    /// Whether a background tick should refresh the live snapshot.
    pub fn poll_decision(&self) -> PollDecision {
        if self.user_load_pending {
            PollDecision::SkipPendingLoad
        } else if self.viewing.is_some() {
            PollDecision::SkipHistorical
        } else if self.controller.is_dragging() {
            PollDecision::SkipDragging
        } else if self.save_state.has_unsaved_edits() {
            PollDecision::SkipUnsavedEdits
        } else {
            PollDecision::LoadLive
        }
    }

    /// Apply the result of a snapshot fetch started with [`begin_load`].
    ///
    /// [`begin_load`]: Self::begin_load
    pub fn apply_load<E: Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<SeatingSnapshot, E>,
    ) -> ApplyOutcome {
        // A poll is superseded by any newer load, a user load only by a
        // newer user load.
        let latest = match ticket.origin {
            LoadOrigin::User => self.user_load_seq,
            LoadOrigin::Poll => self.load_seq,
        };
        if ticket.seq < latest {
            tracing::debug!(seq = ticket.seq, latest, "Dropping superseded snapshot");
            return ApplyOutcome::Stale(StaleReason::Superseded);
        }
        match ticket.origin {
            LoadOrigin::User => self.user_load_pending = false,
            LoadOrigin::Poll if self.poll_raced(&ticket) => {
                tracing::debug!(
                    seq = ticket.seq,
                    "Dropping live refresh that raced local activity"
                );
                return ApplyOutcome::Stale(StaleReason::LocalActivity);
            }
            LoadOrigin::Poll => {}
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    revision = ?ticket.revision,
                    error = %e,
                    "Failed to fetch seating snapshot"
                );
                self.push_error(LOAD_ERROR);
                return ApplyOutcome::Failed;
            }
        };

        let change = match self.store.load_snapshot(&snapshot) {
            Ok(change) => change,
            Err(e) => {
                tracing::warn!(
                    revision = ?ticket.revision,
                    error = %e,
                    "Rejected malformed seating snapshot"
                );
                self.push_error(LOAD_ERROR);
                return ApplyOutcome::Failed;
            }
        };

        for user in snapshot.users() {
            self.users.entry(user.user_id).or_insert(user);
        }
        self.edit_generation += 1;
        self.viewing = ticket.revision;
        self.render_change(&change);

        match ticket.revision {
            // A historical plan can be republished as-is.
            Some(_) => self.set_save_state(SaveState::Dirty),
            None if self.save_state.has_unsaved_edits() => self.set_save_state(SaveState::Clean),
            None => {}
        }

        tracing::debug!(
            revision = ?ticket.revision,
            seated = snapshot.seated.len(),
            unseated = snapshot.unseated.len(),
            "Seating snapshot applied",
        );
        ApplyOutcome::Applied
    }

    // ---- revision log ----

    /// Start a revision log refresh. `None` for non-publishers, who never
    /// see the log.
    pub fn begin_revision_refresh(&mut self) -> Option<RevisionLogTicket> {
        if !self.config.is_publisher {
            return None;
        }
        self.revision_log_seq += 1;
        Some(RevisionLogTicket {
            seq: self.revision_log_seq,
        })
    }

    /// Merge a fetched revision list into the log.
    ///
    /// Merging is idempotent, so overlapping refreshes are harmless; only
    /// failures from superseded refreshes are suppressed.
    pub fn apply_revision_refresh<E: Display>(
        &mut self,
        ticket: RevisionLogTicket,
        result: Result<Vec<Revision>, E>,
    ) -> ApplyOutcome {
        match result {
            Ok(revisions) => {
                let added = self.revisions.merge(revisions);
                for (index, revision) in &added {
                    self.renderer.append_revision_log_entry(revision, *index);
                }
                if !added.is_empty() {
                    tracing::info!(
                        added = added.len(),
                        total = self.revisions.len(),
                        "Revision log updated"
                    );
                }
                ApplyOutcome::Applied
            }
            Err(_) if ticket.seq < self.revision_log_seq => {
                ApplyOutcome::Stale(StaleReason::Superseded)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch revision log");
                self.push_error(REVISION_LOG_ERROR);
                ApplyOutcome::Failed
            }
        }
    }

    // ---- commit ----

    /// Start submitting the current assignment.
    ///
    /// Returns `None` when there is nothing unsaved or a commit with the
    /// same content is already in flight.
    pub fn begin_commit(&mut self) -> Option<CommitTicket> {
        if self.save_state != SaveState::Dirty {
            return None;
        }
        self.commit_seq += 1;
        self.set_save_state(SaveState::Committing);
        Some(CommitTicket {
            seq: self.commit_seq,
            edit_generation: self.edit_generation,
            layout: SubmitLayout {
                seats: self.store.serialize(),
            },
        })
    }

    /// Apply the remote answer to a commit.
    ///
    /// `Ok(Some(revision))` means the submission published a new
    /// revision; it is added to the log (publishers only) and the session
    /// returns to the live view. Local edits are never rolled back.
    pub fn apply_commit<E: Display>(
        &mut self,
        ticket: CommitTicket,
        result: Result<Option<Revision>, E>,
    ) -> ApplyOutcome {
        match result {
            Ok(published) => {
                self.last_commit_success = self.last_commit_success.max(ticket.seq);
                if ticket.edit_generation == self.edit_generation {
                    self.set_save_state(SaveState::Saved);
                }
                if let Some(revision) = published.filter(|_| self.config.is_publisher) {
                    tracing::info!(
                        revision = revision.number,
                        name = %revision.name,
                        "Revision published"
                    );
                    if let Some(index) = self.revisions.insert(revision.clone()) {
                        self.renderer.append_revision_log_entry(&revision, index);
                    }
                    self.viewing = None;
                }
                tracing::debug!(seats = ticket.layout.seats.len(), "Seating committed");
                ApplyOutcome::Applied
            }
            Err(_) if ticket.seq < self.commit_seq || ticket.seq < self.last_commit_success => {
                ApplyOutcome::Stale(StaleReason::Superseded)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to commit seating");
                if self.save_state == SaveState::Committing {
                    self.set_save_state(SaveState::Dirty);
                }
                self.push_error(SAVE_ERROR);
                ApplyOutcome::Failed
            }
        }
    }

    // ---- private helpers ----

    fn poll_raced(&self, ticket: &LoadTicket) -> bool {
        ticket.edit_generation != self.edit_generation
            || self.poll_decision() != PollDecision::LoadLive
    }

    fn mark_dirty(&mut self) {
        self.edit_generation += 1;
        self.set_save_state(SaveState::Dirty);
    }

    fn set_save_state(&mut self, state: SaveState) {
        self.save_state = state;
        let (enabled, label) = state.control();
        self.renderer.set_commit_control_state(enabled, label);
    }

    fn render_change(&mut self, change: &StoreChange) {
        let Self {
            store,
            users,
            renderer,
            config,
            ..
        } = self;

        for &seat_id in &change.seats {
            let occupant_id = store.occupant(seat_id);
            let occupant = occupant_id.and_then(|id| users.get(&id).or_else(|| store.user(id)));
            let is_self = occupant_id.is_some() && occupant_id == config.logged_in_user;
            renderer.render_seat(seat_id, occupant, is_self);
        }
        if change.unassigned {
            renderer.render_unassigned_list(store.unassigned());
        }
    }

    fn report_core_error(&mut self, error: CoreError) {
        match error {
            CoreError::InvariantViolation { .. } => {
                tracing::error!(error = %error, "Seating invariant violated");
                self.push_error(INVARIANT_ERROR);
            }
            other => {
                tracing::warn!(error = %other, "Drop could not be applied");
            }
        }
    }

    fn push_error(&mut self, text: &str) {
        self.errors.push(text.to_string());
        self.renderer.show_error(text);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::geometry::{Point, Size, Viewport};
    use crate::interaction::{GesturePhase, HitTarget};
    use crate::render::{RecordingRenderer, RenderCall};
    use crate::snapshot::{SeatAssignment, SeatedUser};

    const A: UserId = 100;
    const B: UserId = 200;
    const C: UserId = 300;

    fn config(is_publisher: bool) -> SessionConfig {
        SessionConfig {
            logged_in_user: Some(A),
            is_publisher,
            layout: PreviewLayout {
                popup: Size::new(100.0, 30.0),
                viewport: Viewport::new(1000.0, 800.0, 0.0),
            },
        }
    }

    fn seated(seat_id: i64, user_id: UserId, nickname: &str) -> SeatedUser {
        SeatedUser {
            seat_id,
            user_id,
            nickname: nickname.to_string(),
            avatar: format!("https://avatars/{user_id}"),
        }
    }

    /// seats = {1:A, 2:B}, unassigned = {C}
    fn abc() -> SeatingSnapshot {
        SeatingSnapshot {
            seated: vec![seated(1, A, "A"), seated(2, B, "B")],
            unseated: vec![UserInfo::new(C, "C", "https://avatars/300")],
        }
    }

    fn loaded(is_publisher: bool) -> SeatingSession<RecordingRenderer> {
        let mut session = SeatingSession::new(config(is_publisher), RecordingRenderer::new());
        let ticket = session.begin_load(None, LoadOrigin::User);
        assert_eq!(session.apply_load(ticket, Ok::<_, String>(abc())), ApplyOutcome::Applied);
        session.renderer_mut().take();
        session
    }

    fn nowhere(_: Point) -> HitTarget {
        HitTarget::Elsewhere
    }

    fn drag(
        session: &mut SeatingSession<RecordingRenderer>,
        from: HitTarget,
        to: HitTarget,
    ) -> GestureResponse {
        let start = PointerGesture::mouse(GesturePhase::Start, Point::new(5.0, 5.0), Some(from));
        session.handle_gesture(start, &nowhere);
        let end = PointerGesture::mouse(GesturePhase::End, Point::new(9.0, 9.0), Some(to));
        session.handle_gesture(end, &nowhere)
    }

    #[test]
    fn initial_load_renders_seats_and_unassigned() {
        let mut session = SeatingSession::new(config(false), RecordingRenderer::new());
        let ticket = session.begin_load(None, LoadOrigin::User);
        session.apply_load(ticket, Ok::<_, String>(abc()));

        let calls = &session.renderer().calls;
        assert!(calls.contains(&RenderCall::Seat { seat_id: 1, occupant: Some(A), is_self: true }));
        assert!(calls.contains(&RenderCall::Seat {
            seat_id: 2,
            occupant: Some(B),
            is_self: false,
        }));
        assert!(calls.contains(&RenderCall::Unassigned(vec![C])));
        assert_eq!(session.save_state(), SaveState::Clean);
        assert_eq!(session.known_user_count(), 3);
    }

    #[test]
    fn scenario_with_autosave_in_live_view() {
        let mut session = loaded(false);

        let response = drag(&mut session, HitTarget::UnassignedUser(C), HitTarget::Seat(3));
        let ticket = response.commit.expect("live view autosaves");
        assert_eq!(
            ticket.layout().seats,
            vec![
                SeatAssignment { seat_id: 1, user_id: A },
                SeatAssignment { seat_id: 2, user_id: B },
                SeatAssignment { seat_id: 3, user_id: C },
            ]
        );
        assert_eq!(session.save_state(), SaveState::Committing);
        assert!(session.store().unassigned().is_empty());
        session.apply_commit(ticket, Ok::<_, String>(None));
        assert_eq!(session.save_state(), SaveState::Saved);
        assert_eq!(session.renderer().commit_control(), Some((false, LABEL_SAVED)));

        let response = drag(&mut session, HitTarget::Seat(1), HitTarget::UnassignedArea);
        assert!(response.commit.is_some());
        assert_eq!(session.store().occupant(1), None);
        let unassigned: Vec<UserId> =
            session.store().unassigned().iter().map(|u| u.user_id).collect();
        assert_eq!(unassigned, vec![A]);
    }

    #[test]
    fn drag_renders_only_what_changed() {
        let mut session = loaded(false);
        drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(5));

        let calls = session.renderer_mut().take();
        let seats: Vec<&RenderCall> = calls
            .iter()
            .filter(|c| matches!(c, RenderCall::Seat { .. }))
            .collect();
        assert_eq!(
            seats,
            vec![
                &RenderCall::Seat { seat_id: 1, occupant: None, is_self: false },
                &RenderCall::Seat { seat_id: 5, occupant: Some(A), is_self: true },
            ]
        );
        assert!(!calls.iter().any(|c| matches!(c, RenderCall::Unassigned(_))));
        assert!(calls.contains(&RenderCall::Preview { user_id: A, position: None }));
    }

    #[test]
    fn rejected_drop_does_not_dirty_or_commit() {
        let mut session = loaded(false);
        let response = drag(&mut session, HitTarget::UnassignedUser(C), HitTarget::Seat(2));

        assert!(response.commit.is_none());
        assert_eq!(session.save_state(), SaveState::Clean);
        assert_eq!(session.store().occupant(2), Some(B));
    }

    #[test]
    fn drag_start_suppresses_default() {
        let mut session = loaded(false);
        let start = PointerGesture::touch(
            GesturePhase::Start,
            Point::new(5.0, 5.0),
            Some(HitTarget::Seat(1)),
        );
        let response = session.handle_gesture(start, &nowhere);
        assert!(response.suppress_default);
        assert!(session.is_dragging());
        assert_eq!(session.poll_decision(), PollDecision::SkipDragging);
    }

    #[test]
    fn commit_failure_keeps_edits_and_reenables_control() {
        let mut session = loaded(false);
        let ticket = drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9))
            .commit
            .unwrap();

        assert_eq!(
            session.apply_commit(ticket, Err::<Option<Revision>, _>("503")),
            ApplyOutcome::Failed
        );
        assert_eq!(session.save_state(), SaveState::Dirty);
        assert_eq!(session.renderer().commit_control(), Some((true, LABEL_SAVE)));
        assert_eq!(session.errors(), [SAVE_ERROR.to_string()]);
        assert_eq!(session.store().occupant(9), Some(A));

        // Retry succeeds.
        let retry = session.begin_commit().unwrap();
        session.apply_commit(retry, Ok::<_, String>(None));
        assert_eq!(session.save_state(), SaveState::Saved);

        session.dismiss_errors();
        assert!(session.errors().is_empty());
        assert_eq!(session.renderer().calls.last(), Some(&RenderCall::ClearError));
    }

    #[test]
    fn older_commit_success_does_not_mark_newer_edits_saved() {
        let mut session = loaded(false);
        let first = drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9)).commit.unwrap();
        // A second edit while the first commit is in flight autosaves again.
        let second = drag(&mut session, HitTarget::Seat(2), HitTarget::Seat(8)).commit.unwrap();

        session.apply_commit(first, Ok::<_, String>(None));
        assert_eq!(session.save_state(), SaveState::Committing);
        assert_eq!(session.poll_decision(), PollDecision::SkipUnsavedEdits);

        session.apply_commit(second, Ok::<_, String>(None));
        assert_eq!(session.save_state(), SaveState::Saved);
    }

    #[test]
    fn edits_during_manual_commit_stay_dirty() {
        let mut session = loaded(true);
        let ticket = session.begin_load(Some(1), LoadOrigin::User);
        session.apply_load(ticket, Ok::<_, String>(abc()));
        let commit = session.begin_commit().unwrap();

        // Historical view: no autosave, so the edit leaves the state dirty.
        drag(&mut session, HitTarget::Seat(2), HitTarget::Seat(8));
        session.apply_commit(commit, Ok::<_, String>(None));
        assert_eq!(session.save_state(), SaveState::Dirty);
        assert!(session.begin_commit().is_some());
    }

    #[test]
    fn older_commit_failure_after_newer_success_is_ignored() {
        let mut session = loaded(false);
        let first = drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9)).commit.unwrap();
        let second = drag(&mut session, HitTarget::Seat(2), HitTarget::Seat(8)).commit.unwrap();

        session.apply_commit(second, Ok::<_, String>(None));
        assert_eq!(
            session.apply_commit(first, Err::<Option<Revision>, _>("timeout")),
            ApplyOutcome::Stale(StaleReason::Superseded)
        );
        assert_eq!(session.save_state(), SaveState::Saved);
        assert!(session.errors().is_empty());
    }

    #[test]
    fn begin_commit_requires_dirty_state() {
        let mut session = loaded(false);
        assert!(session.begin_commit().is_none());
    }

    #[test]
    fn load_failure_leaves_state_untouched() {
        let mut session = loaded(false);
        let ticket = session.begin_load(Some(4), LoadOrigin::User);
        assert_eq!(
            session.apply_load(ticket, Err::<SeatingSnapshot, _>("boom")),
            ApplyOutcome::Failed
        );

        assert_eq!(session.viewing(), None);
        assert_eq!(session.store().occupant(1), Some(A));
        assert_eq!(session.errors(), [LOAD_ERROR.to_string()]);
    }

    #[test]
    fn malformed_snapshot_counts_as_failed_load() {
        let mut session = loaded(false);
        let ticket = session.begin_load(None, LoadOrigin::User);
        let bad = SeatingSnapshot {
            seated: vec![seated(1, A, "A"), seated(2, A, "A")],
            unseated: vec![],
        };
        assert_eq!(session.apply_load(ticket, Ok::<_, String>(bad)), ApplyOutcome::Failed);
        assert_eq!(session.store().occupant(2), Some(B));
    }

    #[test]
    fn historical_view_enables_save_and_skips_live_poll() {
        let mut session = loaded(true);
        let ticket = session.begin_load(Some(2), LoadOrigin::User);
        let old = SeatingSnapshot {
            seated: vec![seated(4, C, "C")],
            unseated: vec![UserInfo::new(A, "A", ""), UserInfo::new(B, "B", "")],
        };
        session.apply_load(ticket, Ok::<_, String>(old));

        assert_eq!(session.viewing(), Some(2));
        assert_eq!(session.save_state(), SaveState::Dirty);
        assert_eq!(session.poll_decision(), PollDecision::SkipHistorical);

        // Edits in a historical view do not autosave.
        let response = drag(&mut session, HitTarget::Seat(4), HitTarget::Seat(5));
        assert!(response.commit.is_none());

        // Publishing returns to the live view.
        let ticket = session.begin_commit().unwrap();
        session.apply_commit(ticket, Ok::<_, String>(Some(Revision::new(3, "Republished"))));
        assert_eq!(session.viewing(), None);
        assert_eq!(session.revisions().latest(), Some(&Revision::new(3, "Republished")));
        assert!(session
            .renderer()
            .calls
            .contains(&RenderCall::RevisionEntry { number: 3, index: 0 }));
    }

    #[test]
    fn non_publisher_ignores_published_revision() {
        let mut session = loaded(false);
        let ticket = drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9)).commit.unwrap();
        session.apply_commit(ticket, Ok::<_, String>(Some(Revision::new(3, "x"))));
        assert!(session.revisions().is_empty());
        assert!(session.begin_revision_refresh().is_none());
    }

    #[test]
    fn loading_live_view_clears_unsaved_state() {
        let mut session = loaded(true);
        let ticket = session.begin_load(Some(1), LoadOrigin::User);
        session.apply_load(ticket, Ok::<_, String>(abc()));
        assert_eq!(session.save_state(), SaveState::Dirty);

        let ticket = session.begin_load(None, LoadOrigin::User);
        session.apply_load(ticket, Ok::<_, String>(abc()));
        assert_eq!(session.save_state(), SaveState::Clean);
        assert_eq!(session.poll_decision(), PollDecision::LoadLive);
    }

    #[test]
    fn superseded_load_is_dropped() {
        let mut session = loaded(true);
        let older = session.begin_load(Some(1), LoadOrigin::User);
        let newer = session.begin_load(Some(2), LoadOrigin::User);

        let two = SeatingSnapshot {
            seated: vec![seated(7, B, "B")],
            unseated: vec![],
        };
        assert_eq!(session.apply_load(newer, Ok::<_, String>(two)), ApplyOutcome::Applied);
        assert_eq!(
            session.apply_load(older, Ok::<_, String>(abc())),
            ApplyOutcome::Stale(StaleReason::Superseded)
        );
        assert_eq!(session.viewing(), Some(2));
        assert_eq!(session.store().occupant(7), Some(B));
    }

    #[test]
    fn poll_issued_during_revision_load_does_not_cancel_it() {
        let mut session = loaded(true);
        let click = session.begin_load(Some(4), LoadOrigin::User);
        assert_eq!(session.poll_decision(), PollDecision::SkipPendingLoad);

        // A poll that decided before the click still races it.
        let poll = session.begin_load(None, LoadOrigin::Poll);
        let four = SeatingSnapshot {
            seated: vec![seated(6, C, "C")],
            unseated: vec![],
        };
        assert_eq!(session.apply_load(click, Ok::<_, String>(four)), ApplyOutcome::Applied);
        assert_matches!(
            session.apply_load(poll, Ok::<_, String>(abc())),
            ApplyOutcome::Stale(_)
        );

        assert_eq!(session.viewing(), Some(4));
        assert_eq!(session.store().occupant(6), Some(C));
        assert!(session.errors().is_empty());
    }

    #[test]
    fn revision_load_supersedes_earlier_poll() {
        let mut session = loaded(true);
        let poll = session.begin_load(None, LoadOrigin::Poll);
        let click = session.begin_load(Some(4), LoadOrigin::User);

        assert_eq!(
            session.apply_load(poll, Ok::<_, String>(SeatingSnapshot::default())),
            ApplyOutcome::Stale(StaleReason::Superseded)
        );
        assert_eq!(session.apply_load(click, Ok::<_, String>(abc())), ApplyOutcome::Applied);
        assert_eq!(session.viewing(), Some(4));
    }

    #[test]
    fn failed_revision_load_resumes_polling() {
        let mut session = loaded(false);
        let click = session.begin_load(Some(4), LoadOrigin::User);
        assert_eq!(session.poll_decision(), PollDecision::SkipPendingLoad);

        session.apply_load(click, Err::<SeatingSnapshot, _>("timeout"));
        assert_eq!(session.poll_decision(), PollDecision::LoadLive);
    }

    #[test]
    fn live_poll_racing_an_edit_is_dropped() {
        let mut session = loaded(false);
        let poll = session.begin_load(None, LoadOrigin::Poll);
        drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9));

        assert_eq!(
            session.apply_load(poll, Ok::<_, String>(abc())),
            ApplyOutcome::Stale(StaleReason::LocalActivity)
        );
        assert_eq!(session.store().occupant(9), Some(A));
    }

    #[test]
    fn live_poll_during_drag_is_dropped() {
        let mut session = loaded(false);
        let poll = session.begin_load(None, LoadOrigin::Poll);
        let start = PointerGesture::mouse(
            GesturePhase::Start,
            Point::new(1.0, 1.0),
            Some(HitTarget::Seat(1)),
        );
        session.handle_gesture(start, &nowhere);

        assert_matches!(
            session.apply_load(poll, Ok::<_, String>(SeatingSnapshot::default())),
            ApplyOutcome::Stale(StaleReason::LocalActivity)
        );
        assert_eq!(session.store().occupant(1), Some(A));
    }

    #[test]
    fn quiet_live_poll_applies_and_keeps_saved_label() {
        let mut session = loaded(false);
        let ticket = drag(&mut session, HitTarget::Seat(1), HitTarget::Seat(9)).commit.unwrap();
        session.apply_commit(ticket, Ok::<_, String>(None));

        let poll = session.begin_load(None, LoadOrigin::Poll);
        let mut remote = abc();
        remote.seated[0].seat_id = 9;
        assert_eq!(session.apply_load(poll, Ok::<_, String>(remote)), ApplyOutcome::Applied);
        assert_eq!(session.save_state(), SaveState::Saved);
    }

    #[test]
    fn revision_refresh_renders_new_entries_once() {
        let mut session = loaded(true);
        let ticket = session.begin_revision_refresh().unwrap();
        session.apply_revision_refresh(
            ticket,
            Ok::<_, String>(vec![Revision::new(1, "first"), Revision::new(2, "second")]),
        );
        let ticket = session.begin_revision_refresh().unwrap();
        session.apply_revision_refresh(
            ticket,
            Ok::<_, String>(vec![Revision::new(2, "second"), Revision::new(3, "third")]),
        );

        let entries: Vec<RenderCall> = session
            .renderer_mut()
            .take()
            .into_iter()
            .filter(|c| matches!(c, RenderCall::RevisionEntry { .. }))
            .collect();
        assert_eq!(
            entries,
            vec![
                RenderCall::RevisionEntry { number: 1, index: 0 },
                RenderCall::RevisionEntry { number: 2, index: 0 },
                RenderCall::RevisionEntry { number: 3, index: 0 },
            ]
        );
        assert_eq!(session.revisions().len(), 3);
    }

    #[test]
    fn revision_refresh_failure_shows_error() {
        let mut session = loaded(true);
        let ticket = session.begin_revision_refresh().unwrap();
        let outcome = session.apply_revision_refresh(ticket, Err::<Vec<Revision>, _>("down"));
        assert_eq!(outcome, ApplyOutcome::Failed);
        assert_eq!(session.renderer().errors(), vec![REVISION_LOG_ERROR]);
    }

    #[test]
    fn user_directory_grows_and_keeps_first_record() {
        let mut session = loaded(true);
        let ticket = session.begin_load(Some(1), LoadOrigin::User);
        session.apply_load(
            ticket,
            Ok::<_, String>(SeatingSnapshot {
                seated: vec![],
                unseated: vec![UserInfo::new(A, "renamed", ""), UserInfo::new(400, "D", "")],
            }),
        );

        assert_eq!(session.known_user_count(), 4);
        assert_eq!(session.known_user(A).map(|u| u.nickname.as_str()), Some("A"));
        assert!(session.store().user(B).is_none());
    }

    #[test]
    fn invariant_violation_surfaces_error() {
        let mut session = loaded(false);
        session.report_core_error(CoreError::InvariantViolation {
            user_id: A,
            seat_id: 1,
            other: "seat 2".to_string(),
        });
        assert_eq!(session.errors(), [INVARIANT_ERROR.to_string()]);
    }
}
