//! Avatar provider client
//!
//! Implements the D-ID talks API: create a talk from a publicly reachable
//! source image and a text script, then query its status by id. The script
//! always uses the provider's built-in synthetic voice; lip-sync audio is
//! rendered provider-side.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::AvatarError;

/// Avatar provider interface.
///
/// Implementations:
/// - `DidTalksClient` - D-ID talks API
#[async_trait]
pub trait TalksApi: Send + Sync + 'static {
    /// Submit a talk job, returning the provider job id
    async fn create_talk(&self, source_url: &str, script_text: &str)
        -> Result<String, AvatarError>;

    /// Query job status by id
    async fn get_talk(&self, id: &str) -> Result<TalkStatus, AvatarError>;
}

/// Provider-side job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TalkState {
    Created,
    Started,
    Done,
    Error,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TalkState {
    /// Whether this state ends the job on the provider side
    pub fn is_terminal(&self) -> bool {
        matches!(self, TalkState::Done | TalkState::Error | TalkState::Rejected)
    }
}

/// Status of a submitted talk job
#[derive(Debug, Clone, Deserialize)]
pub struct TalkStatus {
    /// Current provider state
    pub status: TalkState,
    /// Rendered video URL, set only when status is done
    #[serde(default)]
    pub result_url: Option<String>,
    /// Provider error detail, if any
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl TalkStatus {
    pub fn done(result_url: impl Into<String>) -> Self {
        Self {
            status: TalkState::Done,
            result_url: Some(result_url.into()),
            error: None,
        }
    }

    pub fn processing() -> Self {
        Self {
            status: TalkState::Started,
            result_url: None,
            error: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            status: TalkState::Error,
            result_url: None,
            error: None,
        }
    }
}

/// Configuration for the D-ID client
#[derive(Debug, Clone)]
pub struct DidTalksConfig {
    /// API key (from DID_API_KEY or direct), used as Basic auth
    pub api_key: String,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for DidTalksConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("DID_API_KEY").unwrap_or_default(),
            endpoint: "https://api.d-id.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DidTalksConfig {
    /// Create config with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// D-ID talks API client
pub struct DidTalksClient {
    config: DidTalksConfig,
    client: Client,
}

impl DidTalksClient {
    /// Create a new client
    pub fn new(config: DidTalksConfig) -> Result<Self, AvatarError> {
        if config.api_key.is_empty() {
            return Err(AvatarError::Configuration(
                "DID_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AvatarError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TalksApi for DidTalksClient {
    async fn create_talk(
        &self,
        source_url: &str,
        script_text: &str,
    ) -> Result<String, AvatarError> {
        let request = CreateTalkRequest {
            source_url: source_url.to_string(),
            script: Script {
                kind: "text".to_string(),
                input: script_text.to_string(),
                provider: ScriptProvider {
                    kind: "microsoft".to_string(),
                    voice_id: "en-US-JennyNeural".to_string(),
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/talks", self.config.endpoint))
            .header("authorization", format!("Basic {}", self.config.api_key))
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AvatarError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let body: CreateTalkResponse = response
            .json()
            .await
            .map_err(|e| AvatarError::InvalidResponse(e.to_string()))?;

        Ok(body.id)
    }

    async fn get_talk(&self, id: &str) -> Result<TalkStatus, AvatarError> {
        let id = urlencoding::encode(id);
        let response = self
            .client
            .get(format!("{}/talks/{}", self.config.endpoint, id))
            .header("authorization", format!("Basic {}", self.config.api_key))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AvatarError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let body: TalkStatus = response
            .json()
            .await
            .map_err(|e| AvatarError::InvalidResponse(e.to_string()))?;

        Ok(body)
    }
}

// =============================================================================
// D-ID API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateTalkRequest {
    source_url: String,
    script: Script,
}

#[derive(Debug, Serialize)]
struct Script {
    #[serde(rename = "type")]
    kind: String,
    input: String,
    provider: ScriptProvider,
}

#[derive(Debug, Serialize)]
struct ScriptProvider {
    #[serde(rename = "type")]
    kind: String,
    voice_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateTalkResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let config = DidTalksConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            DidTalksClient::new(config),
            Err(AvatarError::Configuration(_))
        ));
    }

    #[test]
    fn test_create_talk_request_serialization() {
        let request = CreateTalkRequest {
            source_url: "https://example.com/face.jpg".to_string(),
            script: Script {
                kind: "text".to_string(),
                input: "Hello!".to_string(),
                provider: ScriptProvider {
                    kind: "microsoft".to_string(),
                    voice_id: "en-US-JennyNeural".to_string(),
                },
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""source_url":"https://example.com/face.jpg""#));
        assert!(json.contains(r#""type":"text""#));
        assert!(json.contains(r#""voice_id":"en-US-JennyNeural""#));
    }

    #[test]
    fn test_status_parsing() {
        let json = r#"{"status": "done", "result_url": "https://cdn.example.com/talk.mp4"}"#;
        let status: TalkStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, TalkState::Done);
        assert_eq!(
            status.result_url.as_deref(),
            Some("https://cdn.example.com/talk.mp4")
        );

        let json = r#"{"status": "started"}"#;
        let status: TalkStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, TalkState::Started);
        assert!(status.result_url.is_none());

        let json = r#"{"status": "something_new"}"#;
        let status: TalkStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, TalkState::Unknown);
    }

    #[test]
    fn test_terminal_states() {
        assert!(TalkState::Done.is_terminal());
        assert!(TalkState::Error.is_terminal());
        assert!(TalkState::Rejected.is_terminal());
        assert!(!TalkState::Created.is_terminal());
        assert!(!TalkState::Started.is_terminal());
        assert!(!TalkState::Unknown.is_terminal());
    }
}
