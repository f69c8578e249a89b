//! Conversation types and the append-only turn log

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// User message
    User,
    /// Assistant reply
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }

    /// Label used when serializing history into a prompt
    pub fn display_name(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new turn
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Append-only conversation history for the process lifetime.
///
/// Turns are appended strictly in arrival order. Prompt construction only
/// ever reads the trailing window via [`ConversationLog::recent`]; older
/// turns stay stored but are not resurfaced, which bounds prompt size.
#[derive(Default)]
pub struct ConversationLog {
    turns: RwLock<Vec<Turn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&self, turn: Turn) {
        self.turns.write().push(turn);
    }

    /// Append a user turn
    pub fn push_user(&self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    /// Append an assistant turn
    pub fn push_assistant(&self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// Total number of stored turns
    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }

    /// The most recent `window` turns, in arrival order
    pub fn recent(&self, window: usize) -> Vec<Turn> {
        let turns = self.turns.read();
        let start = turns.len().saturating_sub(window);
        turns[start..].to_vec()
    }

    /// Drop all stored turns
    pub fn clear(&self) {
        self.turns.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("hello");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "hello");

        let turn = Turn::assistant("hi there");
        assert_eq!(turn.role, TurnRole::Assistant);
    }

    #[test]
    fn test_append_order() {
        let log = ConversationLog::new();
        log.push_user("first");
        log.push_assistant("second");
        log.push_user("third");

        let turns = log.recent(10);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "first");
        assert_eq!(turns[1].content, "second");
        assert_eq!(turns[2].content, "third");
    }

    #[test]
    fn test_recent_window() {
        let log = ConversationLog::new();
        for i in 0..10 {
            log.push_user(format!("msg-{i}"));
        }

        let window = log.recent(6);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].content, "msg-4");
        assert_eq!(window[5].content, "msg-9");

        // Older turns remain stored even though they are not resurfaced
        assert_eq!(log.len(), 10);
    }

    #[test]
    fn test_recent_smaller_than_window() {
        let log = ConversationLog::new();
        log.push_user("only");
        assert_eq!(log.recent(6).len(), 1);
    }

    #[test]
    fn test_clear() {
        let log = ConversationLog::new();
        log.push_user("x");
        log.clear();
        assert!(log.is_empty());
    }
}
