//! Response generation
//!
//! Picks the text or vision path for one message, builds the prompt, and
//! invokes the language model. All provider failures are absorbed here:
//! the caller always gets reply text, never an error. History mutation is
//! the caller's responsibility.

use std::sync::Arc;

use video_agent_core::{decode_frame, Turn};
use video_agent_llm::{text_prompt, vision_prompt, ImagePart, LanguageModel};

use crate::vision::VisionCue;

/// Turns of trailing history used for prompt construction (3 exchanges)
pub const HISTORY_WINDOW_TURNS: usize = 6;

/// User-safe reply when a provider call fails
pub const FALLBACK_REPLY: &str =
    "I'm having trouble analyzing the video right now. Could you please try again?";

/// Response generator
pub struct ResponseGenerator {
    llm: Option<Arc<dyn LanguageModel>>,
    cue: Box<dyn VisionCue>,
}

impl ResponseGenerator {
    /// Create a generator. `llm: None` means no model is configured; every
    /// message then gets the deterministic placeholder.
    pub fn new(llm: Option<Arc<dyn LanguageModel>>, cue: Box<dyn VisionCue>) -> Self {
        Self { llm, cue }
    }

    /// Whether a model is configured
    pub fn llm_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Generate reply text for `message`.
    ///
    /// The vision path is taken only when the message is vision-seeking
    /// AND a frame is available AND the frame decodes as an image; a
    /// malformed frame falls back to the text path rather than failing
    /// the turn.
    pub async fn generate(
        &self,
        message: &str,
        history: &[Turn],
        latest_frame: Option<&str>,
    ) -> String {
        let llm = match &self.llm {
            Some(llm) => llm,
            None => return placeholder_reply(message),
        };

        if self.cue.is_vision_seeking(message) {
            if let Some(payload) = latest_frame {
                match decode_frame(payload) {
                    Ok(frame) => {
                        tracing::debug!(
                            mime = %frame.mime_type,
                            width = frame.width,
                            height = frame.height,
                            "Analyzing video frame"
                        );
                        let image = ImagePart::new(frame.mime_type, frame.bytes);
                        let prompt = vision_prompt(message);
                        return match llm.generate_with_image(&prompt, &image).await {
                            Ok(text) => text.trim().to_string(),
                            Err(e) => {
                                tracing::warn!(error = %e, "Vision model call failed");
                                FALLBACK_REPLY.to_string()
                            }
                        };
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stored frame is not decodable, using text path");
                    }
                }
            }
        }

        let prompt = text_prompt(history, message);
        match llm.generate(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Model call failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Deterministic reply when no model is configured; embeds the original
/// message so the flow stays demonstrable end to end.
pub fn placeholder_reply(message: &str) -> String {
    format!(
        "I received your message: '{message}'. Set GEMINI_API_KEY to enable intelligent responses."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::KeywordVisionCue;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use parking_lot::Mutex;
    use video_agent_llm::LlmError;

    /// 1x1 transparent PNG
    const PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[derive(Default)]
    struct MockLlm {
        fail: bool,
        text_calls: Mutex<Vec<String>>,
        vision_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for MockLlm {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.text_calls.lock().push(prompt.to_string());
            if self.fail {
                Err(LlmError::Api("HTTP 500".to_string()))
            } else {
                Ok("text reply".to_string())
            }
        }

        async fn generate_with_image(
            &self,
            prompt: &str,
            _image: &ImagePart,
        ) -> Result<String, LlmError> {
            self.vision_calls.lock().push(prompt.to_string());
            if self.fail {
                Err(LlmError::Api("HTTP 500".to_string()))
            } else {
                Ok("vision reply".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    fn generator(llm: Option<Arc<MockLlm>>) -> ResponseGenerator {
        ResponseGenerator::new(
            llm.map(|l| l as Arc<dyn LanguageModel>),
            Box::new(KeywordVisionCue::new()),
        )
    }

    #[tokio::test]
    async fn test_unconfigured_model_returns_placeholder() {
        let gen = generator(None);
        let reply = gen.generate("hello", &[], None).await;
        assert!(reply.contains("'hello'"));
    }

    #[tokio::test]
    async fn test_text_path_for_plain_message() {
        let llm = Arc::new(MockLlm::default());
        let gen = generator(Some(llm.clone()));

        let reply = gen.generate("tell me a joke", &[], None).await;
        assert_eq!(reply, "text reply");
        assert_eq!(llm.text_calls.lock().len(), 1);
        assert!(llm.vision_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_vision_path_needs_keyword_and_frame() {
        let llm = Arc::new(MockLlm::default());
        let gen = generator(Some(llm.clone()));

        // Vision-seeking but no frame: text path
        let reply = gen.generate("what do you see?", &[], None).await;
        assert_eq!(reply, "text reply");
        assert!(llm.vision_calls.lock().is_empty());

        // Vision-seeking with a frame: vision path
        let reply = gen.generate("what do you see?", &[], Some(PNG_B64)).await;
        assert_eq!(reply, "vision reply");
        assert_eq!(llm.vision_calls.lock().len(), 1);
        assert!(llm.vision_calls.lock()[0].contains("\"what do you see?\""));
    }

    #[tokio::test]
    async fn test_malformed_frame_falls_back_to_text() {
        let llm = Arc::new(MockLlm::default());
        let gen = generator(Some(llm.clone()));

        let payload = BASE64.encode(b"not an image");
        let reply = gen
            .generate("what is this?", &[], Some(payload.as_str()))
            .await;
        assert_eq!(reply, "text reply");
        assert!(llm.vision_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_yields_apology() {
        let llm = Arc::new(MockLlm {
            fail: true,
            ..Default::default()
        });
        let gen = generator(Some(llm));

        let reply = gen.generate("hello there friend", &[], None).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_history_window_reaches_prompt() {
        let llm = Arc::new(MockLlm::default());
        let gen = generator(Some(llm.clone()));

        let history = vec![Turn::user("earlier question"), Turn::assistant("earlier answer")];
        gen.generate("follow-up please", &history, None).await;

        let prompt = llm.text_calls.lock()[0].clone();
        assert!(prompt.contains("earlier question"));
        assert!(prompt.contains("earlier answer"));
        assert!(prompt.contains("follow-up please"));
    }
}
