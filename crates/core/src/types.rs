/// Seat identifiers match the `data-seat-id` attribute of the venue diagram.
pub type SeatId = i64;

/// Remote user primary key.
pub type UserId = i64;

/// Server-assigned, monotonically increasing revision number.
pub type RevisionNumber = i64;
