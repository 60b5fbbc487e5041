//! Background live-state and revision-log refresh.
//!
//! [`RevisionPoller`] ticks on a fixed period and calls
//! [`SeatingClient::poll_once`]. The loop exits when either the token
//! passed to [`run`](RevisionPoller::run) or the client's own shutdown
//! token is cancelled.

use std::time::Duration;

use seating_core::render::RenderAdapter;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::SeatingClient;

/// How often the live snapshot and revision log are refreshed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct RevisionPoller<R: RenderAdapter> {
    client: SeatingClient<R>,
    period: Duration,
}

impl<R: RenderAdapter + 'static> RevisionPoller<R> {
    pub fn new(client: SeatingClient<R>, period: Duration) -> Self {
        Self { client, period }
    }

    /// Run the poll loop until cancelled.
    ///
    /// The first tick fires one period after start; the initial load is
    /// the caller's job ([`SeatingClient::open`]).
    pub async fn run(&self, cancel: CancellationToken) {
        let shutdown = self.client.cancel_token();
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(period_ms = self.period.as_millis() as u64, "Revision poller started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Revision poller cancelled");
                    break;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Revision poller stopped by client shutdown");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.client.poll_once().await;
                    tracing::debug!(
                        decision = ?report.decision,
                        live = ?report.live,
                        revision_log = ?report.revision_log,
                        "Poll tick complete",
                    );
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime, stopping with
    /// the client's shutdown token.
    pub fn spawn(self) -> JoinHandle<()> {
        let cancel = self.client.cancel_token();
        tokio::spawn(async move { self.run(cancel).await })
    }
}
