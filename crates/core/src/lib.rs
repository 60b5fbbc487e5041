//! Seat assignment domain logic.
//!
//! Everything in this crate is synchronous and IO-free so it can be
//! driven by any event loop and tested without a network:
//!
//! - [`assignment`]: the seat→user mapping and unassigned list.
//! - [`interaction`]: the drag-and-drop state machine for mouse and touch.
//! - [`geometry`]: drag preview placement.
//! - [`revision`]: the newest-first revision log.
//! - [`session`]: the owned session state tying the above together.
//! - [`render`]: the trait through which the session draws.
//! - [`snapshot`]: wire types shared with the remote store.

pub mod assignment;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod render;
pub mod revision;
pub mod session;
pub mod snapshot;
pub mod types;
