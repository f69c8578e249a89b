//! Video Agent Server Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use video_agent_agent::{AppContext, Dispatcher, KeywordVisionCue, ResponseGenerator};
use video_agent_avatar::{
    AvatarJobConfig, AvatarJobManager, DidTalksClient, DidTalksConfig, ImageHostClient,
    ImageHostConfig,
};
use video_agent_config::{load_settings, Settings};
use video_agent_llm::{GeminiBackend, GeminiConfig, LanguageModel};
use video_agent_server::{create_router, init_metrics, AppState};
use video_agent_speech::{
    ElevenLabsClient, ElevenLabsConfig, SpeechSynthesizer, TranslateTts, TranslateTtsConfig,
    VoiceCloneApi,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("VIDEO_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Video Agent Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_env = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let _metrics_handle = init_metrics();
    tracing::info!("Initialized Prometheus metrics at /metrics");

    // Language/vision model (optional; placeholder replies without it)
    let llm: Option<Arc<dyn LanguageModel>> = if config.llm_configured() {
        let llm_config = GeminiConfig::new(config.gemini.api_key.clone())
            .with_model(config.gemini.model.clone())
            .with_endpoint(config.gemini.endpoint.clone())
            .with_timeout(Duration::from_secs(config.gemini.timeout_seconds))
            .with_max_output_tokens(config.gemini.max_output_tokens);
        match GeminiBackend::new(llm_config) {
            Ok(backend) => {
                tracing::info!(model = %config.gemini.model, "Language model initialized");
                Some(Arc::new(backend))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create language model, using placeholder replies");
                None
            }
        }
    } else {
        tracing::warn!("GEMINI_API_KEY not set, replies will use the placeholder text");
        None
    };

    // Voice-clone provider (optional; default engine without it)
    let voice_clone: Option<Arc<dyn VoiceCloneApi>> = if config.voice_clone_configured() {
        let clone_config = ElevenLabsConfig {
            api_key: config.speech.elevenlabs_api_key.clone(),
            endpoint: config.speech.elevenlabs_endpoint.clone(),
            model_id: config.speech.model_id.clone(),
            stability: config.speech.stability,
            similarity_boost: config.speech.similarity_boost,
            timeout: Duration::from_secs(config.speech.timeout_seconds),
        };
        match ElevenLabsClient::new(clone_config) {
            Ok(client) => {
                tracing::info!("Voice-clone provider initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create voice-clone client");
                None
            }
        }
    } else {
        None
    };

    // Default synthesis engine is always available
    let fallback_tts = TranslateTts::new(TranslateTtsConfig {
        language: config.speech.fallback_language.clone(),
        chunk_chars: config.speech.fallback_chunk_chars,
        timeout: Duration::from_secs(config.speech.timeout_seconds),
        ..Default::default()
    })?;

    let mut synthesizer = SpeechSynthesizer::new(Arc::new(fallback_tts));
    if let Some(ref clone_api) = voice_clone {
        synthesizer = synthesizer.with_clone_api(clone_api.clone());
    }

    // Avatar provider (optional; turns complete without video when absent)
    let avatar = if config.avatar_configured() {
        let talks_config = DidTalksConfig {
            api_key: config.avatar.did_api_key.clone(),
            endpoint: config.avatar.did_endpoint.clone(),
            timeout: Duration::from_secs(config.avatar.timeout_seconds),
        };
        match DidTalksClient::new(talks_config) {
            Ok(client) => {
                tracing::info!("Avatar provider initialized");
                Some(AvatarJobManager::new(
                    Arc::new(client),
                    AvatarJobConfig {
                        default_source_url: config.avatar.default_source_url.clone(),
                        poll_interval: Duration::from_millis(config.avatar.poll_interval_ms),
                        max_attempts: config.avatar.max_poll_attempts,
                        script_cap_chars: config.avatar.script_cap_chars,
                    },
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create avatar client, avatar videos disabled");
                None
            }
        }
    } else {
        tracing::info!("DID_API_KEY not set, avatar video generation disabled");
        None
    };

    let image_host = ImageHostClient::new(ImageHostConfig {
        api_key: config.avatar.image_host.api_key.clone(),
        endpoint: config.avatar.image_host.endpoint.clone(),
        max_attempts: config.avatar.image_host.max_attempts,
        retry_pause: Duration::from_millis(config.avatar.image_host.retry_pause_ms),
        ..Default::default()
    });

    let context = Arc::new(AppContext::new());
    let generator = ResponseGenerator::new(llm, Box::new(KeywordVisionCue::new()));
    let dispatcher = Dispatcher::new(context.clone(), generator, synthesizer, avatar);

    let port = config.server.port;
    let state = AppState::new(config, context, dispatcher, image_host, voice_clone);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("video_agent={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
