//! Default synthesis engine
//!
//! Free translate-TTS endpoint that needs no credential. The endpoint caps
//! input length per request, so longer text is split on whitespace into
//! bounded chunks and the resulting MP3 segments are concatenated.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::SpeechError;

/// Default synthesis engine interface.
///
/// Implementations:
/// - `TranslateTts` - free translate-TTS endpoint
#[async_trait]
pub trait SpeechEngine: Send + Sync + 'static {
    /// Synthesize text, returning audio bytes (MP3)
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Configuration for the default engine
#[derive(Debug, Clone)]
pub struct TranslateTtsConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// Synthesis language
    pub language: String,
    /// Per-request character cap
    pub chunk_chars: usize,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for TranslateTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.google.com/translate_tts".to_string(),
            language: "en".to_string(),
            chunk_chars: 200,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Free translate-TTS engine
pub struct TranslateTts {
    config: TranslateTtsConfig,
    client: Client,
}

impl TranslateTts {
    /// Create a new engine
    pub fn new(config: TranslateTtsConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> Result<Vec<u8>, SpeechError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.config.language.as_str()),
                ("q", chunk),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Provider(format!(
                "HTTP {} from default engine",
                status
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechEngine for TranslateTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::Provider("Empty text".to_string()));
        }

        let chunks = chunk_text(text, self.config.chunk_chars);
        let total = chunks.len();

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, idx, total).await?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(SpeechError::Provider(
                "Default engine returned no audio".to_string(),
            ));
        }

        Ok(audio)
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// whitespace boundaries. A single word longer than the cap is split hard.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            // Flush what we have, then hard-split the oversized word
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let cs: Vec<char> = word.chars().collect();
            for piece in cs.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let sep = usize::from(!current.is_empty());
        if current_len + sep + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
