use crate::types::{SeatId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A user was found in two places at once. Never repaired in place.
    #[error("Invariant violated: user {user_id} found in seat {seat_id} and {other}")]
    InvariantViolation {
        user_id: UserId,
        seat_id: SeatId,
        other: String,
    },
}
