//! Application context
//!
//! One object owns all shared mutable state: the session registry, the
//! conversation log, and the latest-frame cell. It is passed into the
//! dispatcher at construction and lives from process start to stop;
//! [`AppContext::reset`] exists for tests.

use video_agent_core::{ConversationLog, FrameCell};

use crate::session::SessionStore;

/// Shared application state for the orchestration core
#[derive(Default)]
pub struct AppContext {
    /// Session profile registry
    pub sessions: SessionStore,
    /// Append-only conversation history
    pub conversation: ConversationLog,
    /// Most recently received video frame, process-wide
    pub latest_frame: FrameCell,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all sessions, history, and the stored frame
    pub fn reset(&self) {
        self.sessions.clear();
        self.conversation.clear();
        self.latest_frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_everything() {
        let ctx = AppContext::new();
        ctx.sessions.get_or_create(Some("s"));
        ctx.conversation.push_user("hello");
        ctx.latest_frame.store("frame-data");

        ctx.reset();

        assert_eq!(ctx.sessions.count(), 0);
        assert!(ctx.conversation.is_empty());
        assert!(ctx.latest_frame.load().is_none());
    }
}
