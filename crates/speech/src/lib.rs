//! Speech synthesis
//!
//! Turns reply text into audio bytes. A session with a cloned voice uses
//! the voice-clone provider; everything else (including any clone-path
//! failure) falls back to the default synthesis engine. Synthesis never
//! silently returns empty audio: if every path fails the caller gets a
//! typed [`SpeechError::Unavailable`].

pub mod clone;
pub mod fallback;
pub mod synthesizer;

pub use clone::{ElevenLabsClient, ElevenLabsConfig, VoiceCloneApi};
pub use fallback::{SpeechEngine, TranslateTts, TranslateTtsConfig};
pub use synthesizer::SpeechSynthesizer;

use thiserror::Error;

/// Speech synthesis errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("All synthesis paths failed")]
    Unavailable,
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Network(err.to_string())
        }
    }
}
