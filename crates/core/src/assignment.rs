//! Seat assignment store.
//!
//! [`AssignmentStore`] owns the seat→user mapping and the sorted list of
//! unassigned users for the snapshot currently on screen. Every mutation
//! keeps the invariant that a user occupies at most one location, and
//! returns a [`StoreChange`] naming exactly what the renderer has to
//! refresh.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::error::CoreError;
use crate::snapshot::{SeatAssignment, SeatingSnapshot, UserInfo};
use crate::types::{SeatId, UserId};

/// Where a user currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Seat(SeatId),
    Unassigned,
}

/// Description of what a mutation touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChange {
    /// Seats whose occupant changed (vacated or filled), ascending.
    pub seats: BTreeSet<SeatId>,
    /// Whether the unassigned list changed.
    pub unassigned: bool,
}

impl StoreChange {
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty() && !self.unassigned
    }
}

/// Result of [`AssignmentStore::assign_seat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned(StoreChange),
    /// The seat was already taken; nothing changed.
    Rejected { occupant: UserId },
}

#[derive(Debug, Default)]
pub struct AssignmentStore {
    seats: BTreeMap<SeatId, UserId>,
    unassigned: Vec<UserInfo>,
    /// Users of the loaded snapshot, seated or not.
    roster: HashMap<UserId, UserInfo>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, seat_id: SeatId) -> Option<UserId> {
        self.seats.get(&seat_id).copied()
    }

    pub fn user(&self, user_id: UserId) -> Option<&UserInfo> {
        self.roster.get(&user_id)
    }

    /// Unassigned users sorted by nickname.
    pub fn unassigned(&self) -> &[UserInfo] {
        &self.unassigned
    }

    /// Occupied seats in ascending seat order.
    pub fn occupied(&self) -> impl Iterator<Item = (SeatId, UserId)> + '_ {
        self.seats.iter().map(|(&seat, &user)| (seat, user))
    }

    /// Find the single location of `user_id`.
    ///
    /// Returns `Ok(None)` for users not in the roster and an
    /// [`CoreError::InvariantViolation`] if the user is found twice.
    pub fn locate(&self, user_id: UserId) -> Result<Option<Location>, CoreError> {
        let mut seats = self
            .seats
            .iter()
            .filter(|(_, &occupant)| occupant == user_id)
            .map(|(&seat, _)| seat);
        let seat = seats.next();
        let in_unassigned = self.unassigned.iter().any(|u| u.user_id == user_id);

        match (seat, seats.next(), in_unassigned) {
            (Some(first), Some(second), _) => Err(CoreError::InvariantViolation {
                user_id,
                seat_id: first,
                other: format!("seat {second}"),
            }),
            (Some(first), None, true) => Err(CoreError::InvariantViolation {
                user_id,
                seat_id: first,
                other: "the unassigned list".to_string(),
            }),
            (Some(first), None, false) => Ok(Some(Location::Seat(first))),
            (None, _, true) => Ok(Some(Location::Unassigned)),
            (None, _, false) => Ok(None),
        }
    }

    /// Seat `user_id` in the empty seat `seat_id`.
    ///
    /// An occupied seat is never overwritten: the call is rejected and
    /// the mapping is left untouched.
    pub fn assign_seat(
        &mut self,
        seat_id: SeatId,
        user_id: UserId,
    ) -> Result<AssignOutcome, CoreError> {
        if let Some(occupant) = self.occupant(seat_id) {
            tracing::debug!(seat_id, user_id, occupant, "Seat occupied, assignment rejected");
            return Ok(AssignOutcome::Rejected { occupant });
        }
        if !self.roster.contains_key(&user_id) {
            return Err(CoreError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        let mut change = self.vacate(user_id)?;
        self.seats.insert(seat_id, user_id);
        change.seats.insert(seat_id);

        tracing::debug!(seat_id, user_id, "Seat assigned");
        Ok(AssignOutcome::Assigned(change))
    }

    /// Move `user_id` to the unassigned list.
    pub fn unassign_user(&mut self, user_id: UserId) -> Result<StoreChange, CoreError> {
        let user = self.roster.get(&user_id).cloned().ok_or(CoreError::NotFound {
            entity: "user",
            id: user_id,
        })?;

        if self.locate(user_id)? == Some(Location::Unassigned) {
            return Ok(StoreChange::default());
        }

        let mut change = self.vacate(user_id)?;
        let at = self
            .unassigned
            .partition_point(|u| u.nickname.as_str() <= user.nickname.as_str());
        self.unassigned.insert(at, user);
        change.unassigned = true;

        tracing::debug!(user_id, "User unassigned");
        Ok(change)
    }

    /// Replace the whole state from a snapshot payload.
    ///
    /// The snapshot is validated first; on error the previous state is
    /// kept. The returned change covers every seat that was occupied
    /// before or after the load.
    pub fn load_snapshot(&mut self, snapshot: &SeatingSnapshot) -> Result<StoreChange, CoreError> {
        validate_snapshot(snapshot)?;

        let mut change = StoreChange {
            seats: self.seats.keys().copied().collect(),
            unassigned: true,
        };

        self.seats = snapshot
            .seated
            .iter()
            .map(|s| (s.seat_id, s.user_id))
            .collect();
        self.roster = snapshot.users().map(|u| (u.user_id, u)).collect();

        let mut unassigned = snapshot.unseated.clone();
        unassigned.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        self.unassigned = unassigned;

        change.seats.extend(self.seats.keys().copied());
        Ok(change)
    }

    /// Occupied seats in submission form.
    pub fn serialize(&self) -> Vec<SeatAssignment> {
        self.occupied()
            .map(|(seat_id, user_id)| SeatAssignment { seat_id, user_id })
            .collect()
    }

    // ---- private helpers ----

    /// Remove `user_id` from wherever it currently is.
    fn vacate(&mut self, user_id: UserId) -> Result<StoreChange, CoreError> {
        let mut change = StoreChange::default();
        match self.locate(user_id)? {
            Some(Location::Seat(seat_id)) => {
                self.seats.remove(&seat_id);
                change.seats.insert(seat_id);
            }
            Some(Location::Unassigned) => {
                self.unassigned.retain(|u| u.user_id != user_id);
                change.unassigned = true;
            }
            None => {}
        }
        Ok(change)
    }
}

/// Reject snapshots that would break the one-location invariant.
pub fn validate_snapshot(snapshot: &SeatingSnapshot) -> Result<(), CoreError> {
    let mut seats = HashSet::new();
    let mut users = HashSet::new();

    for seated in &snapshot.seated {
        if !seats.insert(seated.seat_id) {
            return Err(CoreError::Validation(format!(
                "seat {} listed more than once",
                seated.seat_id
            )));
        }
        if !users.insert(seated.user_id) {
            return Err(CoreError::Validation(format!(
                "user {} seated more than once",
                seated.user_id
            )));
        }
    }
    for user in &snapshot.unseated {
        if !users.insert(user.user_id) {
            return Err(CoreError::Validation(format!(
                "user {} is both seated and unseated, or listed twice",
                user.user_id
            )));
        }
    }
    Ok(())
}
