//! In-memory seating store for demo mode and tests.
//!
//! [`LocalSeatingStore`] keeps the live snapshot plus every published
//! revision in memory. Each submit from a publisher freezes the submitted
//! layout as a new revision named after the current local time.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use seating_core::assignment::validate_snapshot;
use seating_core::snapshot::{Revision, SeatedUser, SeatingSnapshot, SubmitLayout, UserInfo};
use seating_core::types::{RevisionNumber, UserId};
use tokio::sync::Mutex;

use crate::remote::{RemoteError, SeatingRemote};

/// Timestamp format used for demo revision names.
const REVISION_NAME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

struct LocalState {
    /// Every attendee of the event, seated or not.
    attendees: BTreeMap<UserId, UserInfo>,
    live: SeatingSnapshot,
    revisions: Vec<(Revision, SeatingSnapshot)>,
}

pub struct LocalSeatingStore {
    state: Mutex<LocalState>,
    publisher: bool,
    available: AtomicBool,
}

impl LocalSeatingStore {
    /// Start from `live`. Every user it mentions becomes an attendee.
    pub fn new(live: SeatingSnapshot, publisher: bool) -> Self {
        let attendees = live.users().map(|u| (u.user_id, u)).collect();
        Self {
            state: Mutex::new(LocalState {
                attendees,
                live,
                revisions: Vec::new(),
            }),
            publisher,
            available: AtomicBool::new(true),
        }
    }

    /// A small event with two seated and three unseated attendees.
    pub fn with_sample_data(publisher: bool) -> Self {
        let seated = [(1, 101, "ada"), (2, 102, "brian")]
            .into_iter()
            .map(|(seat_id, user_id, nickname)| SeatedUser {
                seat_id,
                user_id,
                nickname: nickname.to_string(),
                avatar: sample_avatar(user_id),
            })
            .collect();
        let unseated = [(103, "carmen"), (104, "dmitri"), (105, "erin")]
            .into_iter()
            .map(|(user_id, nickname)| UserInfo::new(user_id, nickname, sample_avatar(user_id)))
            .collect();

        Self::new(SeatingSnapshot { seated, unseated }, publisher)
    }

    /// Simulate an outage: while unavailable every call fails with
    /// [`RemoteError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// The current live snapshot.
    pub async fn live(&self) -> SeatingSnapshot {
        self.state.lock().await.live.clone()
    }

    /// Replace the live snapshot, as if another user had edited it.
    pub async fn replace_live(&self, live: SeatingSnapshot) {
        let mut state = self.state.lock().await;
        for user in live.users() {
            state.attendees.entry(user.user_id).or_insert(user);
        }
        state.live = live;
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("local store offline".to_string()))
        }
    }
}

fn sample_avatar(user_id: UserId) -> String {
    format!("https://avatars.example/{user_id}.png")
}

/// Rebuild a full snapshot from a submitted layout. Attendees not seated
/// by the layout become unseated, sorted by nickname.
fn snapshot_from_layout(
    attendees: &BTreeMap<UserId, UserInfo>,
    layout: &SubmitLayout,
) -> Result<SeatingSnapshot, RemoteError> {
    let rejected = |body: String| RemoteError::Status { status: 400, body };

    let mut seated = Vec::with_capacity(layout.seats.len());
    let mut placed = HashSet::new();
    for assignment in &layout.seats {
        let user = attendees
            .get(&assignment.user_id)
            .ok_or_else(|| rejected(format!("unknown user {}", assignment.user_id)))?;
        placed.insert(user.user_id);
        seated.push(SeatedUser {
            seat_id: assignment.seat_id,
            user_id: user.user_id,
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
        });
    }

    let mut unseated: Vec<UserInfo> = attendees
        .values()
        .filter(|u| !placed.contains(&u.user_id))
        .cloned()
        .collect();
    unseated.sort_by(|a, b| a.nickname.cmp(&b.nickname));

    let snapshot = SeatingSnapshot { seated, unseated };
    validate_snapshot(&snapshot).map_err(|e| rejected(e.to_string()))?;
    Ok(snapshot)
}

#[async_trait]
impl SeatingRemote for LocalSeatingStore {
    async fn fetch_seats(
        &self,
        revision: Option<RevisionNumber>,
    ) -> Result<SeatingSnapshot, RemoteError> {
        self.check_available()?;
        let state = self.state.lock().await;
        match revision {
            None => Ok(state.live.clone()),
            Some(number) => state
                .revisions
                .iter()
                .find(|(r, _)| r.number == number)
                .map(|(_, snapshot)| snapshot.clone())
                .ok_or_else(|| RemoteError::Status {
                    status: 404,
                    body: format!("no revision {number}"),
                }),
        }
    }

    async fn fetch_revisions(&self) -> Result<Vec<Revision>, RemoteError> {
        self.check_available()?;
        if !self.publisher {
            return Err(RemoteError::Status {
                status: 403,
                body: "revision log requires publisher rights".to_string(),
            });
        }
        let state = self.state.lock().await;
        Ok(state.revisions.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn submit(&self, layout: &SubmitLayout) -> Result<Option<Revision>, RemoteError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let snapshot = snapshot_from_layout(&state.attendees, layout)?;
        state.live = snapshot.clone();

        if !self.publisher {
            return Ok(None);
        }

        let number = state.revisions.iter().map(|(r, _)| r.number).max().unwrap_or(0) + 1;
        let name = chrono::Local::now().format(REVISION_NAME_FORMAT).to_string();
        let revision = Revision::new(number, name);
        state.revisions.push((revision.clone(), snapshot));
        tracing::info!(revision = number, seats = layout.seats.len(), "Local revision published");
        Ok(Some(revision))
    }
}
