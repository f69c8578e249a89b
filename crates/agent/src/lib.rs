//! Response orchestration
//!
//! The dispatcher sequences one turn across the language model, speech
//! synthesis, and avatar generation, with deterministic fallbacks at each
//! provider boundary. Session profiles, the conversation log and the
//! latest-frame cell live in an explicit [`AppContext`] passed in at
//! construction.

pub mod context;
pub mod dispatcher;
pub mod generator;
pub mod session;
pub mod vision;

pub use context::AppContext;
pub use dispatcher::{Dispatcher, TurnReply};
pub use generator::{ResponseGenerator, FALLBACK_REPLY, HISTORY_WINDOW_TURNS};
pub use session::{SessionProfile, SessionStore, DEFAULT_SESSION_KEY};
pub use vision::{KeywordVisionCue, VisionCue};

use thiserror::Error;

/// Agent errors.
///
/// Provider failures are absorbed inside the components that own them;
/// only failures the dispatcher cannot degrade around (speech fully
/// unavailable, internal invariant breaks) surface here and become the
/// client-facing error event.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Speech synthesis failed: {0}")]
    Speech(#[from] video_agent_speech::SpeechError),

    #[error("Internal error: {0}")]
    Internal(String),
}
