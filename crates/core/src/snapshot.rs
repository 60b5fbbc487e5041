//! Wire types exchanged with the remote seating store.
//!
//! These mirror the JSON bodies of the `/seating/api/*` endpoints and are
//! shared by the session (which loads them) and the client crate (which
//! fetches and submits them).

use serde::{Deserialize, Serialize};

use crate::types::{RevisionNumber, SeatId, UserId};

/// A user known to the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: UserId,
    /// Display name; also the unassigned-list sort key.
    pub nickname: String,
    /// Opaque avatar URL, passed through to the renderer untouched.
    pub avatar: String,
}

impl UserInfo {
    pub fn new(user_id: UserId, nickname: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            user_id,
            nickname: nickname.into(),
            avatar: avatar.into(),
        }
    }
}

/// One occupied seat in a snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatedUser {
    pub seat_id: SeatId,
    pub user_id: UserId,
    pub nickname: String,
    pub avatar: String,
}

impl SeatedUser {
    pub fn user(&self) -> UserInfo {
        UserInfo::new(self.user_id, self.nickname.clone(), self.avatar.clone())
    }
}

/// Body of `GET /seating/api/seats/{event}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingSnapshot {
    #[serde(default)]
    pub seated: Vec<SeatedUser>,
    #[serde(default)]
    pub unseated: Vec<UserInfo>,
}

impl SeatingSnapshot {
    /// Every user mentioned by the snapshot, seated first.
    pub fn users(&self) -> impl Iterator<Item = UserInfo> + '_ {
        self.seated
            .iter()
            .map(SeatedUser::user)
            .chain(self.unseated.iter().cloned())
    }
}

/// A published revision as listed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub number: RevisionNumber,
    pub name: String,
}

impl Revision {
    pub fn new(number: RevisionNumber, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
        }
    }
}

/// Body of `GET /seating/api/revisions/{event}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevisionList {
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

/// One occupied seat in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub seat_id: SeatId,
    pub user_id: UserId,
}

/// The `json=` payload of `POST /seating/api/submit/{event}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitLayout {
    pub seats: Vec<SeatAssignment>,
}

/// Body returned by a submit. `revision` is present only when the
/// submission published a new revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub revision: Option<Revision>,
}
