//! Turn dispatcher
//!
//! Orchestrates one inbound message end to end: resolve the session, run
//! response generation, append history, synthesize speech, optionally
//! request a talking-avatar video, and assemble the outbound reply. A
//! single provider failure never aborts the whole turn; components own
//! their fallbacks, and only failures nothing can degrade around surface
//! as an error the transport layer reports instead of the reply.

use std::sync::Arc;

use video_agent_avatar::AvatarJobManager;
use video_agent_speech::SpeechSynthesizer;

use crate::context::AppContext;
use crate::generator::{ResponseGenerator, HISTORY_WINDOW_TURNS};
use crate::AgentError;

/// Route prefix for the same-origin video proxy indirection
pub const VIDEO_PROXY_ROUTE: &str = "/api/video_proxy?url=";

/// Assembled reply for one accepted message
#[derive(Debug, Clone)]
pub struct TurnReply {
    /// Reply text
    pub text: String,
    /// Synthesized audio bytes (codec is provider-defined, passed through)
    pub audio: Vec<u8>,
    /// Proxied avatar video URL, when one was generated
    pub avatar_video: Option<String>,
}

/// Turn dispatcher
pub struct Dispatcher {
    context: Arc<AppContext>,
    generator: ResponseGenerator,
    synthesizer: SpeechSynthesizer,
    avatar: Option<AvatarJobManager>,
}

impl Dispatcher {
    pub fn new(
        context: Arc<AppContext>,
        generator: ResponseGenerator,
        synthesizer: SpeechSynthesizer,
        avatar: Option<AvatarJobManager>,
    ) -> Self {
        Self {
            context,
            generator,
            synthesizer,
            avatar,
        }
    }

    /// Shared application context
    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Handle one inbound user message.
    ///
    /// Returns `Ok(None)` for empty messages (silently dropped: no reply,
    /// no error). Returns `Ok(Some(reply))` for an accepted message, even
    /// when providers degraded. Returns `Err` only when the turn cannot
    /// produce a usable reply at all; the transport layer maps that to the
    /// error event. Exactly one of those three happens per message.
    pub async fn handle_message(
        &self,
        session_key: Option<&str>,
        message: &str,
    ) -> Result<Option<TurnReply>, AgentError> {
        let message = message.trim();
        if message.is_empty() {
            tracing::debug!("Dropping empty message");
            return Ok(None);
        }

        let profile = self.context.sessions.get_or_create(session_key);
        let history = self.context.conversation.recent(HISTORY_WINDOW_TURNS);
        let frame = self.context.latest_frame.load();

        let reply_text = self
            .generator
            .generate(message, &history, frame.as_deref())
            .await;

        // History records what the user saw, fallback text included
        self.context.conversation.push_user(message);
        self.context.conversation.push_assistant(reply_text.as_str());

        let audio = self
            .synthesizer
            .synthesize(&reply_text, profile.voice_id().as_deref())
            .await?;

        let avatar_video = match &self.avatar {
            Some(manager) => {
                let source = profile.avatar_public_url();
                match manager
                    .request_talking_video(source.as_deref(), &reply_text)
                    .await
                {
                    Some(url) => {
                        profile.set_last_avatar_video(url.clone());
                        Some(proxied_url(&url))
                    }
                    None => None,
                }
            }
            None => None,
        };

        tracing::info!(
            session = %profile.id,
            reply_chars = reply_text.len(),
            audio_bytes = audio.len(),
            has_avatar = avatar_video.is_some(),
            "Turn complete"
        );

        Ok(Some(TurnReply {
            text: reply_text,
            audio,
            avatar_video,
        }))
    }

    /// Handle one inbound frame: overwrite the latest-frame cell.
    ///
    /// This path never blocks on, or is blocked by, the message path; the
    /// transport layer echoes the frame back for display itself.
    pub fn ingest_frame(&self, payload: &str) {
        self.context.latest_frame.store(payload);
    }
}

/// Build the same-origin indirection URL for an upstream video.
///
/// Clients never receive the raw provider URL; the proxy route forwards
/// the bytes with permissive CORS headers.
pub fn proxied_url(upstream: &str) -> String {
    format!("{}{}", VIDEO_PROXY_ROUTE, urlencoding::encode(upstream))
}
