//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use video_agent_agent::{AppContext, Dispatcher};
use video_agent_avatar::ImageHostClient;
use video_agent_config::Settings;
use video_agent_speech::VoiceCloneApi;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Settings>,
    /// Shared orchestration context (sessions, history, latest frame)
    pub context: Arc<AppContext>,
    /// Turn dispatcher
    pub dispatcher: Arc<Dispatcher>,
    /// Public image host for uploaded avatar images
    pub image_host: Arc<ImageHostClient>,
    /// Voice-clone provider, when configured
    pub voice_clone: Option<Arc<dyn VoiceCloneApi>>,
    /// HTTP client for the video proxy
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        config: Settings,
        context: Arc<AppContext>,
        dispatcher: Dispatcher,
        image_host: ImageHostClient,
        voice_clone: Option<Arc<dyn VoiceCloneApi>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            context,
            dispatcher: Arc::new(dispatcher),
            image_host: Arc::new(image_host),
            voice_clone,
            http: reqwest::Client::new(),
        }
    }
}
