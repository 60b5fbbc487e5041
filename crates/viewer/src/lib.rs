//! Terminal host for a seating session.
//!
//! Loads [`config::ViewerConfig`] from the environment, wires a
//! [`render::LogRenderer`] into a session, and keeps it in sync with the
//! remote store until interrupted.

pub mod config;
pub mod demo;
pub mod render;
