//! Scripted interaction for demo mode.
//!
//! With no pointer to drive it, demo mode seats the first unassigned
//! attendee on the next free seat, so the whole drag, autosave and
//! publish path runs once at start-up.

use seating_client::client::SeatingClient;
use seating_core::geometry::Point;
use seating_core::interaction::{GesturePhase, HitTarget, PointerGesture};
use seating_core::render::RenderAdapter;
use seating_core::session::ApplyOutcome;
use seating_core::types::{SeatId, UserId};

/// Drag the first unassigned user onto the seat after the highest
/// occupied one. Returns the autosave outcome, or `None` when everyone is
/// already seated or nothing was saved.
pub async fn seat_first_unassigned<R: RenderAdapter + 'static>(
    client: &SeatingClient<R>,
) -> Option<ApplyOutcome> {
    let (user_id, seat_id) = next_move(client).await?;
    tracing::info!(user_id, seat_id, "Demo: seating first unassigned attendee");

    // Mouse releases carry their own target, so no hit-testing is needed.
    let elsewhere = |_: Point| HitTarget::Elsewhere;
    let origin = Point::new(1.0, 1.0);
    let press = PointerGesture::mouse(
        GesturePhase::Start,
        origin,
        Some(HitTarget::UnassignedUser(user_id)),
    );
    let release = PointerGesture::mouse(GesturePhase::End, origin, Some(HitTarget::Seat(seat_id)));

    client.handle_gesture(press, &elsewhere).await;
    let handled = client.handle_gesture(release, &elsewhere).await;
    match handled.autosave {
        Some(task) => match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Demo autosave task failed");
                None
            }
        },
        None => None,
    }
}

async fn next_move<R: RenderAdapter + 'static>(
    client: &SeatingClient<R>,
) -> Option<(UserId, SeatId)> {
    let session = client.session().lock().await;
    let store = session.store();
    let user_id = store.unassigned().first()?.user_id;
    let seat_id = store.occupied().map(|(seat, _)| seat).max().unwrap_or(0) + 1;
    Some((user_id, seat_id))
}
