//! Speech synthesizer with explicit fallback selection
//!
//! Preference order: cloned voice (when the session has a voice id and the
//! clone provider is configured), then the default engine. Each provider
//! call's outcome is a `Result`; fallback selection is an explicit branch
//! on that result so every path is independently testable.

use std::sync::Arc;

use crate::clone::VoiceCloneApi;
use crate::fallback::SpeechEngine;
use crate::SpeechError;

/// Speech synthesizer
pub struct SpeechSynthesizer {
    clone_api: Option<Arc<dyn VoiceCloneApi>>,
    fallback: Arc<dyn SpeechEngine>,
}

impl SpeechSynthesizer {
    /// Create a synthesizer with only the default engine
    pub fn new(fallback: Arc<dyn SpeechEngine>) -> Self {
        Self {
            clone_api: None,
            fallback,
        }
    }

    /// Attach a voice-clone provider
    pub fn with_clone_api(mut self, clone_api: Arc<dyn VoiceCloneApi>) -> Self {
        self.clone_api = Some(clone_api);
        self
    }

    /// Whether a voice-clone provider is configured
    pub fn clone_configured(&self) -> bool {
        self.clone_api.is_some()
    }

    /// Synthesize `text`, preferring the session's cloned voice.
    ///
    /// Returns audio bytes or [`SpeechError::Unavailable`] when every path
    /// failed. Never returns empty bytes on success.
    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<Vec<u8>, SpeechError> {
        if let (Some(api), Some(voice_id)) = (&self.clone_api, voice_id) {
            match api.synthesize(voice_id, text).await {
                Ok(bytes) if !bytes.is_empty() => {
                    tracing::debug!(voice_id, bytes = bytes.len(), "Synthesized with cloned voice");
                    return Ok(bytes);
                }
                Ok(_) => {
                    tracing::warn!(voice_id, "Cloned voice returned empty audio, falling back");
                }
                Err(e) => {
                    tracing::warn!(voice_id, error = %e, "Cloned voice synthesis failed, falling back");
                }
            }
        }

        match self.fallback.synthesize(text).await {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => {
                tracing::error!("Default engine returned empty audio");
                Err(SpeechError::Unavailable)
            }
            Err(e) => {
                tracing::error!(error = %e, "Default engine synthesis failed");
                Err(SpeechError::Unavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockCloneApi {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VoiceCloneApi for MockCloneApi {
        async fn clone_voice(&self, _name: &str, _path: &Path) -> Result<String, SpeechError> {
            Ok("mock-voice".to_string())
        }

        async fn synthesize(&self, _voice_id: &str, _text: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SpeechError::Provider("boom".to_string()))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    struct MockEngine {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SpeechEngine for MockEngine {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SpeechError::Provider("down".to_string()))
            } else {
                Ok(vec![9, 9])
            }
        }
    }

    fn engine(fail: bool) -> Arc<MockEngine> {
        Arc::new(MockEngine {
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_cloned_voice_preferred() {
        let clone = Arc::new(MockCloneApi {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let fb = engine(false);
        let synth = SpeechSynthesizer::new(fb.clone()).with_clone_api(clone.clone());

        let bytes = synth.synthesize("hi", Some("v1")).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(clone.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fb.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_voice_id_uses_default_engine() {
        let clone = Arc::new(MockCloneApi {
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let fb = engine(false);
        let synth = SpeechSynthesizer::new(fb.clone()).with_clone_api(clone.clone());

        let bytes = synth.synthesize("hi", None).await.unwrap();
        assert_eq!(bytes, vec![9, 9]);
        assert_eq!(clone.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clone_failure_falls_back() {
        let clone = Arc::new(MockCloneApi {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let fb = engine(false);
        let synth = SpeechSynthesizer::new(fb.clone()).with_clone_api(clone);

        let bytes = synth.synthesize("hi", Some("v1")).await.unwrap();
        assert_eq!(bytes, vec![9, 9]);
        assert_eq!(fb.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_paths_failed_is_typed_error() {
        let clone = Arc::new(MockCloneApi {
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let synth = SpeechSynthesizer::new(engine(true)).with_clone_api(clone);

        let err = synth.synthesize("hi", Some("v1")).await.unwrap_err();
        assert!(matches!(err, SpeechError::Unavailable));
    }

    #[tokio::test]
    async fn test_repeated_calls_are_independent() {
        let fb = engine(false);
        let synth = SpeechSynthesizer::new(fb.clone());

        let a = synth.synthesize("same text", None).await.unwrap();
        let b = synth.synthesize("same text", None).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(fb.calls.load(Ordering::SeqCst), 2);
    }
}
