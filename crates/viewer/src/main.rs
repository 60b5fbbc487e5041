//! `seating-viewer` -- keeps one event's seating plan in sync and draws
//! it into the log.
//!
//! Loads the live plan (and the revision log for publishers), then polls
//! the remote store until Ctrl-C. With `SEATING_DEMO` set, an in-memory
//! store with sample attendees replaces the HTTP API and one scripted
//! drag exercises the save path.
//!
//! See [`ViewerConfig::from_env`] for the environment variables.

use std::sync::Arc;

use anyhow::Context;
use seating_client::api::SeatingApi;
use seating_client::client::SeatingClient;
use seating_client::local::LocalSeatingStore;
use seating_client::poller::RevisionPoller;
use seating_client::remote::SeatingRemote;
use seating_core::session::SeatingSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seating_viewer::config::ViewerConfig;
use seating_viewer::demo;
use seating_viewer::render::LogRenderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seating_viewer=info,seating_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ViewerConfig::from_env().context("Failed to load seating viewer configuration")?;
    tracing::info!(
        event_id = config.event_id,
        base_url = %config.base_url,
        publisher = config.is_publisher,
        demo = config.demo,
        poll_interval_secs = config.poll_interval_secs,
        "Starting seating-viewer",
    );

    let remote = build_remote(&config)?;
    let session = SeatingSession::new(config.session_config(), LogRenderer::new());
    let client = SeatingClient::new(session, remote);

    client.open().await;
    if config.demo {
        let outcome = demo::seat_first_unassigned(&client).await;
        tracing::info!(outcome = ?outcome, "Demo drag finished");
    }

    let poller = RevisionPoller::new(client.clone(), config.poll_interval()).spawn();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown signal received");

    client.shutdown();
    poller.await.context("Revision poller task panicked")?;

    let session = client.session().lock().await;
    for line in session.renderer().notification() {
        tracing::warn!(error = %line, "Unresolved notification at exit");
    }
    tracing::info!(
        revisions = session.revisions().len(),
        save_state = ?session.save_state(),
        "seating-viewer stopped",
    );
    Ok(())
}

fn build_remote(config: &ViewerConfig) -> anyhow::Result<Arc<dyn SeatingRemote>> {
    if config.demo {
        tracing::info!("Demo mode: using in-memory sample store");
        return Ok(Arc::new(LocalSeatingStore::with_sample_data(config.is_publisher)));
    }

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let mut api = SeatingApi::with_client(http, config.base_url.clone(), config.event_id);
    if let Some(token) = &config.csrf_token {
        api = api.with_csrf_token(token.clone());
    }
    if let Some(cookie) = &config.session_cookie {
        api = api.with_session_cookie(cookie.clone());
    }
    Ok(Arc::new(api))
}
