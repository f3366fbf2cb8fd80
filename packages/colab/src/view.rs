//! Display collaborators for server-side sessions.

use edit_core::View;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::session::SessionId;

/// Server default: reports each refresh through tracing.
pub struct LogView {
    session: SessionId,
    refreshes: u64,
}

impl LogView {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            refreshes: 0,
        }
    }
}

impl View for LogView {
    fn refresh(&mut self, text: &str) {
        self.refreshes += 1;
        info!(
            session = %self.session,
            lines = text.split('\n').count(),
            chars = text.chars().filter(|&c| c != '\n').count(),
            "document updated"
        );
        debug!(session = %self.session, "document text:\n{}", text);
    }

    fn close(&mut self) {
        info!(
            session = %self.session,
            refreshes = self.refreshes,
            "view closed"
        );
    }
}

/// Publishes every refresh on a watch channel.
pub struct SnapshotView {
    sender: Option<watch::Sender<String>>,
}

impl SnapshotView {
    /// Create a view and the receiver observing it. The receiver starts at
    /// the empty document.
    pub fn channel() -> (Self, watch::Receiver<String>) {
        let (sender, receiver) = watch::channel(String::new());
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }
}

impl View for SnapshotView {
    fn refresh(&mut self, text: &str) {
        if let Some(sender) = &self.sender {
            sender.send_replace(text.to_string());
        }
    }

    fn close(&mut self) {
        // Dropping the sender tells receivers the view is gone.
        self.sender = None;
    }
}
