//! Configuration for the video agent
//!
//! Settings are layered: `config/default.yaml` < `config/{env}.yaml` <
//! `VIDEO_AGENT_*` environment variables. Provider credentials come from
//! their conventional environment variables and their absence is a valid
//! configuration that selects fallback behavior.

pub mod settings;

pub use settings::{
    load_settings, AvatarConfig, GeminiProviderConfig, ImageHostConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, SpeechConfig, UploadsConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
