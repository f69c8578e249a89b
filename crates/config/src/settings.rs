//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language/vision model provider
    #[serde(default)]
    pub gemini: GeminiProviderConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Talking-avatar provider configuration
    #[serde(default)]
    pub avatar: AvatarConfig,

    /// Upload handling
    #[serde(default)]
    pub uploads: UploadsConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP/WebSocket server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS origin restrictions
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (empty = localhost default)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Gemini-style language/vision model provider.
///
/// An empty API key means the model is not configured; the response
/// generator then returns its deterministic placeholder without any
/// network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiProviderConfig {
    /// API key (from GEMINI_API_KEY)
    #[serde(default = "default_gemini_api_key")]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API endpoint
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_gemini_timeout")]
    pub timeout_seconds: u64,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_gemini_api_key() -> String {
    std::env::var("GEMINI_API_KEY").unwrap_or_default()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_timeout() -> u64 {
    60
}

fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        Self {
            api_key: default_gemini_api_key(),
            model: default_gemini_model(),
            endpoint: default_gemini_endpoint(),
            timeout_seconds: default_gemini_timeout(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Speech synthesis configuration.
///
/// The voice-clone provider is optional; the default engine needs no
/// credential and is always available as the last-resort path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Voice-clone provider API key (from ELEVENLABS_API_KEY)
    #[serde(default = "default_elevenlabs_api_key")]
    pub elevenlabs_api_key: String,

    /// Voice-clone provider endpoint
    #[serde(default = "default_elevenlabs_endpoint")]
    pub elevenlabs_endpoint: String,

    /// Synthesis model for cloned voices
    #[serde(default = "default_elevenlabs_model")]
    pub model_id: String,

    /// Voice stability setting
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// Voice similarity boost setting
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    /// Language for the default synthesis engine
    #[serde(default = "default_speech_language")]
    pub fallback_language: String,

    /// Per-request character cap of the default engine
    #[serde(default = "default_chunk_chars")]
    pub fallback_chunk_chars: usize,

    /// Request timeout in seconds
    #[serde(default = "default_speech_timeout")]
    pub timeout_seconds: u64,
}

fn default_elevenlabs_api_key() -> String {
    std::env::var("ELEVENLABS_API_KEY").unwrap_or_default()
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_speech_language() -> String {
    "en".to_string()
}

fn default_chunk_chars() -> usize {
    200
}

fn default_speech_timeout() -> u64 {
    30
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            elevenlabs_api_key: default_elevenlabs_api_key(),
            elevenlabs_endpoint: default_elevenlabs_endpoint(),
            model_id: default_elevenlabs_model(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            fallback_language: default_speech_language(),
            fallback_chunk_chars: default_chunk_chars(),
            timeout_seconds: default_speech_timeout(),
        }
    }
}

/// Talking-avatar provider configuration.
///
/// An empty API key disables avatar generation entirely; every turn then
/// completes with `avatar_video: null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Avatar provider API key (from DID_API_KEY)
    #[serde(default = "default_did_api_key")]
    pub did_api_key: String,

    /// Avatar provider endpoint
    #[serde(default = "default_did_endpoint")]
    pub did_endpoint: String,

    /// Source image used when a session has no uploaded avatar
    #[serde(default = "default_source_url")]
    pub default_source_url: String,

    /// Delay between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of status polls before giving up
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Provider limit on script text length (characters)
    #[serde(default = "default_script_cap")]
    pub script_cap_chars: usize,

    /// Request timeout in seconds
    #[serde(default = "default_avatar_timeout")]
    pub timeout_seconds: u64,

    /// Public image host used for uploaded avatar images
    #[serde(default)]
    pub image_host: ImageHostConfig,
}

fn default_did_api_key() -> String {
    std::env::var("DID_API_KEY").unwrap_or_default()
}

fn default_did_endpoint() -> String {
    "https://api.d-id.com".to_string()
}

fn default_source_url() -> String {
    "https://d-id-public-bucket.s3.amazonaws.com/alice.jpg".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_poll_attempts() -> u32 {
    30
}

fn default_script_cap() -> usize {
    300
}

fn default_avatar_timeout() -> u64 {
    30
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            did_api_key: default_did_api_key(),
            did_endpoint: default_did_endpoint(),
            default_source_url: default_source_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            script_cap_chars: default_script_cap(),
            timeout_seconds: default_avatar_timeout(),
            image_host: ImageHostConfig::default(),
        }
    }
}

/// Public image host (ImgBB-style) for avatar images.
///
/// The avatar provider only accepts publicly reachable image URLs, so
/// uploaded avatars are re-published here first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    /// Image host API key (from IMGBB_API_KEY); empty disables publishing
    #[serde(default = "default_imgbb_api_key")]
    pub api_key: String,

    /// Upload endpoint
    #[serde(default = "default_imgbb_endpoint")]
    pub endpoint: String,

    /// Upload attempts before giving up
    #[serde(default = "default_upload_attempts")]
    pub max_attempts: u32,

    /// Pause between retries in milliseconds
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
}

fn default_imgbb_api_key() -> String {
    std::env::var("IMGBB_API_KEY").unwrap_or_default()
}

fn default_imgbb_endpoint() -> String {
    "https://api.imgbb.com/1/upload".to_string()
}

fn default_upload_attempts() -> u32 {
    3
}

fn default_retry_pause_ms() -> u64 {
    1000
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            api_key: default_imgbb_api_key(),
            endpoint: default_imgbb_endpoint(),
            max_attempts: default_upload_attempts(),
            retry_pause_ms: default_retry_pause_ms(),
        }
    }
}

/// Upload handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Directory where uploaded media is persisted
    #[serde(default = "default_uploads_dir")]
    pub dir: String,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            dir: default_uploads_dir(),
            max_bytes: default_max_upload_bytes(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted logs
    #[serde(default)]
    pub log_json: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.avatar.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "avatar.max_poll_attempts".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.avatar.script_cap_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "avatar.script_cap_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.speech.fallback_chunk_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "speech.fallback_chunk_chars".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.speech.stability) {
            return Err(ConfigError::InvalidValue {
                field: "speech.stability".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", self.speech.stability),
            });
        }

        if !(0.0..=1.0).contains(&self.speech.similarity_boost) {
            return Err(ConfigError::InvalidValue {
                field: "speech.similarity_boost".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.speech.similarity_boost
                ),
            });
        }

        if self.uploads.max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "uploads.max_bytes".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        // Missing provider credentials are valid (fallbacks apply), but
        // worth flagging loudly outside development.
        if self.environment.is_strict() {
            if self.gemini.api_key.is_empty() {
                tracing::warn!("GEMINI_API_KEY not set - replies will use the placeholder text");
            }
            if self.avatar.did_api_key.is_empty() {
                tracing::warn!("DID_API_KEY not set - avatar video generation is disabled");
            }
        }

        Ok(())
    }

    /// Whether the language/vision model is configured
    pub fn llm_configured(&self) -> bool {
        !self.gemini.api_key.is_empty()
    }

    /// Whether the voice-clone provider is configured
    pub fn voice_clone_configured(&self) -> bool {
        !self.speech.elevenlabs_api_key.is_empty()
    }

    /// Whether the avatar provider is configured
    pub fn avatar_configured(&self) -> bool {
        !self.avatar.did_api_key.is_empty()
    }
}

/// Load settings from files and environment.
///
/// Priority: env vars > config/{env}.yaml > config/default.yaml > defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    let config = builder
        .add_source(
            Environment::with_prefix("VIDEO_AGENT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.avatar.max_poll_attempts, 30);
        assert_eq!(settings.avatar.poll_interval_ms, 2000);
        assert_eq!(settings.avatar.script_cap_chars, 300);
        assert_eq!(settings.speech.model_id, "eleven_monolingual_v1");
    }

    #[test]
    fn test_invalid_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_stability() {
        let mut settings = Settings::default();
        settings.speech.stability = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let mut settings = Settings::default();
        settings.avatar.max_poll_attempts = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_provider_flags() {
        let mut settings = Settings::default();
        settings.gemini.api_key = String::new();
        settings.avatar.did_api_key = String::new();
        settings.speech.elevenlabs_api_key = String::new();
        assert!(!settings.llm_configured());
        assert!(!settings.avatar_configured());
        assert!(!settings.voice_clone_configured());

        settings.gemini.api_key = "key".to_string();
        assert!(settings.llm_configured());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let yaml = r#"
environment: production
server:
  port: 8080
avatar:
  max_poll_attempts: 10
  poll_interval_ms: 500
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.environment, RuntimeEnvironment::Production);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.avatar.max_poll_attempts, 10);
        assert_eq!(settings.avatar.poll_interval_ms, 500);
        // Untouched sections keep defaults
        assert_eq!(settings.speech.fallback_chunk_chars, 200);
    }
}
