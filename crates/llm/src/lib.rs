//! Language/vision model integration
//!
//! Provides the [`LanguageModel`] trait and the Gemini REST backend used
//! for both text-only and vision-grounded reply generation.

pub mod backend;
pub mod gemini;
pub mod prompt;

pub use backend::{ImagePart, LanguageModel};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use prompt::{text_prompt, vision_prompt, TEXT_PERSONA};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
