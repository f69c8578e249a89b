//! Language model backend trait

use async_trait::async_trait;

use crate::LlmError;

/// An image handed to the vision path of a model
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// MIME type of the image bytes
    pub mime_type: String,
    /// Raw image bytes
    pub data: Vec<u8>,
}

impl ImagePart {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Language/vision model interface.
///
/// Implementations:
/// - `GeminiBackend` - Google Gemini REST API
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a completion for a text prompt
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Generate a completion conditioned on a prompt and an image
    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImagePart,
    ) -> Result<String, LlmError>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
