//! Renderer that draws the seating plan into the log.
//!
//! Every visual change becomes one structured `tracing` event. The
//! renderer also keeps the error notification's text so the host can
//! print it on demand.

use seating_core::geometry::Point;
use seating_core::render::RenderAdapter;
use seating_core::snapshot::{Revision, UserInfo};
use seating_core::types::SeatId;

#[derive(Debug, Default)]
pub struct LogRenderer {
    notification: Vec<String>,
    commit_control: Option<(bool, String)>,
    revision_entries: usize,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines currently shown in the error notification.
    pub fn notification(&self) -> &[String] {
        &self.notification
    }

    /// Last `(enabled, label)` set on the commit control.
    pub fn commit_control(&self) -> Option<(bool, &str)> {
        self.commit_control
            .as_ref()
            .map(|(enabled, label)| (*enabled, label.as_str()))
    }

    pub fn revision_entries(&self) -> usize {
        self.revision_entries
    }
}

impl RenderAdapter for LogRenderer {
    fn render_seat(&mut self, seat_id: SeatId, occupant: Option<&UserInfo>, is_self: bool) {
        match occupant {
            Some(user) => tracing::info!(
                seat_id,
                user_id = user.user_id,
                nickname = %user.nickname,
                is_self,
                "Seat occupied",
            ),
            None => tracing::info!(seat_id, "Seat empty"),
        }
    }

    fn render_unassigned_list(&mut self, users: &[UserInfo]) {
        let names: Vec<&str> = users.iter().map(|u| u.nickname.as_str()).collect();
        tracing::info!(count = users.len(), users = ?names, "Unassigned");
    }

    fn render_drag_preview(&mut self, user: &UserInfo, position: Option<Point>) {
        match position {
            Some(p) => tracing::debug!(user_id = user.user_id, x = p.x, y = p.y, "Drag preview"),
            None => tracing::debug!(user_id = user.user_id, "Drag preview hidden"),
        }
    }

    fn append_revision_log_entry(&mut self, revision: &Revision, index: usize) {
        self.revision_entries += 1;
        tracing::info!(revision = revision.number, name = %revision.name, index, "Revision listed");
    }

    fn set_commit_control_state(&mut self, enabled: bool, label: &str) {
        tracing::info!(enabled, label, "Commit control");
        self.commit_control = Some((enabled, label.to_string()));
    }

    fn show_error(&mut self, text: &str) {
        tracing::warn!(error = text, "Notification");
        self.notification.push(text.to_string());
    }

    fn clear_error(&mut self) {
        if !self.notification.is_empty() {
            tracing::info!(dismissed = self.notification.len(), "Notification cleared");
        }
        self.notification.clear();
    }
}
