//! Remote seating store client and sync driver.
//!
//! Provides the [`SeatingRemote`](remote::SeatingRemote) contract, an
//! HTTP implementation over [`reqwest`], an in-memory store for demo
//! mode, the async [`SeatingClient`](client::SeatingClient) that drives a
//! [`SeatingSession`](seating_core::session::SeatingSession) against a
//! remote, and the background [`RevisionPoller`](poller::RevisionPoller).

pub mod api;
pub mod client;
pub mod local;
pub mod poller;
pub mod remote;
