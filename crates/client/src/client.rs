//! Async driver tying a [`SeatingSession`] to a [`SeatingRemote`].
//!
//! Every operation follows the same three steps:
//!
//! 1. Lock the session briefly and `begin_*` the request.
//! 2. Release the lock and await the remote call.
//! 3. Lock again and `apply_*` the result, which drops it if it went stale.
//!
//! The lock is never held across a network await, so gestures keep
//! flowing while requests are in flight. Once [`SeatingClient::shutdown`]
//! has been called, results that arrive are discarded without touching
//! the session.

use std::sync::Arc;

use seating_core::interaction::{HitTester, PointerGesture};
use seating_core::render::RenderAdapter;
use seating_core::session::{
    ApplyOutcome, CommitTicket, LoadOrigin, PollDecision, SeatingSession,
};
use seating_core::types::RevisionNumber;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::remote::SeatingRemote;

/// What one background tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub decision: PollDecision,
    /// Outcome of the live refresh, when the decision allowed one.
    pub live: Option<ApplyOutcome>,
    /// Outcome of the revision log refresh (publishers only).
    pub revision_log: Option<ApplyOutcome>,
}

/// Result of [`SeatingClient::handle_gesture`].
#[derive(Debug)]
pub struct GestureHandled {
    /// The host should suppress the platform default for the event.
    pub suppress_default: bool,
    /// Autosave submission spawned by a live-view edit.
    pub autosave: Option<JoinHandle<Option<ApplyOutcome>>>,
}

/// Shared handle to one seating session and its remote store.
///
/// Cheap to clone; clones drive the same session.
pub struct SeatingClient<R: RenderAdapter> {
    session: Arc<Mutex<SeatingSession<R>>>,
    remote: Arc<dyn SeatingRemote>,
    cancel: CancellationToken,
}

impl<R: RenderAdapter> Clone for SeatingClient<R> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            remote: Arc::clone(&self.remote),
            cancel: self.cancel.clone(),
        }
    }
}

impl<R: RenderAdapter + 'static> SeatingClient<R> {
    pub fn new(session: SeatingSession<R>, remote: Arc<dyn SeatingRemote>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            remote,
            cancel: CancellationToken::new(),
        }
    }

    /// The session, for inspection or host-side calls such as
    /// `dismiss_errors`. Do not hold the guard across an await.
    pub fn session(&self) -> &Arc<Mutex<SeatingSession<R>>> {
        &self.session
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Tear down: pending and future results are discarded.
    pub fn shutdown(&self) {
        tracing::info!("Seating client shutting down");
        self.cancel.cancel();
    }

    /// Initial page load: the live snapshot, then the revision log.
    pub async fn open(&self) -> Option<ApplyOutcome> {
        let outcome = self.load(None, LoadOrigin::User).await;
        self.refresh_revision_log().await;
        outcome
    }

    /// Show `revision`, or the live state for `None`.
    ///
    /// Returns `None` when the client was shut down before the result
    /// arrived.
    pub async fn load_revision(&self, revision: Option<RevisionNumber>) -> Option<ApplyOutcome> {
        self.load(revision, LoadOrigin::User).await
    }

    /// Background refresh of the live snapshot.
    pub async fn refresh_live(&self) -> Option<ApplyOutcome> {
        self.load(None, LoadOrigin::Poll).await
    }

    /// Merge the remote revision log. `None` for non-publishers.
    pub async fn refresh_revision_log(&self) -> Option<ApplyOutcome> {
        let ticket = self.session.lock().await.begin_revision_refresh()?;
        let result = self.remote.fetch_revisions().await;
        if self.discard_after_shutdown("revision log") {
            return None;
        }
        Some(self.session.lock().await.apply_revision_refresh(ticket, result))
    }

    /// Submit the current assignment. `None` when there is nothing to
    /// save or the client shut down first.
    pub async fn commit(&self) -> Option<ApplyOutcome> {
        let ticket = self.session.lock().await.begin_commit()?;
        self.submit(ticket).await
    }

    /// Feed one pointer gesture. A live-view edit spawns its autosave so
    /// the caller is never blocked on the network.
    pub async fn handle_gesture(
        &self,
        gesture: PointerGesture,
        hit_tester: &(dyn HitTester + Sync),
    ) -> GestureHandled {
        let response = self.session.lock().await.handle_gesture(gesture, hit_tester);

        let autosave = response.commit.map(|ticket| {
            let client = self.clone();
            tokio::spawn(async move { client.submit(ticket).await })
        });

        GestureHandled {
            suppress_default: response.suppress_default,
            autosave,
        }
    }

    /// One poll tick: refresh the live snapshot when nothing local is in
    /// the way, then refresh the revision log.
    pub async fn poll_once(&self) -> PollReport {
        let decision = self.session.lock().await.poll_decision();
        let live = match decision {
            PollDecision::LoadLive => self.refresh_live().await,
            skip => {
                tracing::trace!(decision = ?skip, "Skipping live refresh");
                None
            }
        };
        let revision_log = self.refresh_revision_log().await;

        PollReport {
            decision,
            live,
            revision_log,
        }
    }

    // ---- private helpers ----

    async fn load(
        &self,
        revision: Option<RevisionNumber>,
        origin: LoadOrigin,
    ) -> Option<ApplyOutcome> {
        let ticket = self.session.lock().await.begin_load(revision, origin);
        let result = self.remote.fetch_seats(revision).await;
        if self.discard_after_shutdown("snapshot") {
            return None;
        }
        Some(self.session.lock().await.apply_load(ticket, result))
    }

    async fn submit(&self, ticket: CommitTicket) -> Option<ApplyOutcome> {
        tracing::debug!(seats = ticket.layout().seats.len(), "Submitting seating");
        let result = self.remote.submit(ticket.layout()).await;
        if self.discard_after_shutdown("commit") {
            return None;
        }
        Some(self.session.lock().await.apply_commit(ticket, result))
    }

    fn discard_after_shutdown(&self, what: &'static str) -> bool {
        let shut_down = self.cancel.is_cancelled();
        if shut_down {
            tracing::debug!(result = what, "Discarding result after shutdown");
        }
        shut_down
    }
}
