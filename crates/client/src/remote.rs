//! The remote seating store contract.

use async_trait::async_trait;
use seating_core::snapshot::{Revision, SeatingSnapshot, SubmitLayout};
use seating_core::types::RevisionNumber;

/// Errors from any [`SeatingRemote`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-2xx status code.
    #[error("Seating API error ({status}): {body}")]
    Status {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The body was not the JSON shape we expected.
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The store cannot be reached right now.
    #[error("Seating store unavailable: {0}")]
    Unavailable(String),
}

/// Where snapshots come from and where submissions go.
///
/// Implemented over HTTP by [`SeatingApi`](crate::api::SeatingApi) and in
/// memory by [`LocalSeatingStore`](crate::local::LocalSeatingStore).
#[async_trait]
pub trait SeatingRemote: Send + Sync {
    /// Fetch the snapshot of `revision`, or the live state for `None`.
    async fn fetch_seats(
        &self,
        revision: Option<RevisionNumber>,
    ) -> Result<SeatingSnapshot, RemoteError>;

    /// Fetch every published revision, in any order.
    async fn fetch_revisions(&self) -> Result<Vec<Revision>, RemoteError>;

    /// Submit the full assignment. Returns the revision it published, if
    /// the caller was allowed to publish one.
    async fn submit(&self, layout: &SubmitLayout) -> Result<Option<Revision>, RemoteError>;
}
