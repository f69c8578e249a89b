//! Talking-avatar video generation
//!
//! Submits a still image + reply text to an asynchronous avatar provider
//! and drives a bounded poll-until-terminal loop to obtain the rendered
//! video URL. Every terminal-without-result outcome is non-fatal: callers
//! proceed without a video reference.

pub mod image_host;
pub mod job;
pub mod talks;

pub use image_host::{ImageHostClient, ImageHostConfig};
pub use job::{AvatarJobConfig, AvatarJobManager, JobOutcome, JobStatus};
pub use talks::{DidTalksClient, DidTalksConfig, TalkState, TalkStatus, TalksApi};

use thiserror::Error;

/// Avatar provider errors
#[derive(Error, Debug)]
pub enum AvatarError {
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

impl From<reqwest::Error> for AvatarError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AvatarError::Timeout
        } else {
            AvatarError::Network(err.to_string())
        }
    }
}
