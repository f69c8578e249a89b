//! WebSocket Handler
//!
//! The realtime relay channel: frames and messages in, echo and replies
//! out. Exactly one of `ai_response` or `error` goes out per accepted
//! message; empty messages produce neither.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::metrics;
use crate::state::AppState;

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Camera frame from the client (base64 or data URL)
    VideoFrame { frame: String },
    /// Frame echoed back for display
    VideoProcessed { frame: String },
    /// User text message
    UserMessage {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    /// Assembled reply for one message
    AiResponse {
        text: String,
        audio: String,
        avatar_video: Option<String>,
    },
    /// Error notice, emitted instead of a reply
    Error { message: String },
}

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// WebSocket handler
pub struct WsHandler;

impl WsHandler {
    /// Handle WebSocket upgrade
    pub async fn handle(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
        ws.on_upgrade(move |socket| Self::handle_socket(socket, state))
    }

    /// Handle WebSocket connection
    async fn handle_socket(socket: WebSocket, state: AppState) {
        let (sender, mut receiver) = socket.split();
        let sender: WsSender = Arc::new(Mutex::new(sender));

        tracing::info!("WebSocket client connected");

        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let ws_msg = match serde_json::from_str::<WsMessage>(&text) {
                        Ok(msg) => msg,
                        Err(e) => {
                            tracing::debug!(error = %e, "Ignoring unparseable message");
                            continue;
                        }
                    };

                    match ws_msg {
                        WsMessage::VideoFrame { frame } => {
                            state.dispatcher.ingest_frame(&frame);
                            // Echo back for display, independent of the message path
                            send(&sender, &WsMessage::VideoProcessed { frame }).await;
                        }
                        WsMessage::UserMessage {
                            message,
                            session_id,
                        } => {
                            Self::handle_user_message(&state, &sender, session_id.as_deref(), &message)
                                .await;
                        }
                        _ => {}
                    }
                }
                Ok(Message::Ping(data)) => {
                    let mut s = sender.lock().await;
                    let _ = s.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }

        tracing::info!("WebSocket client disconnected");
    }

    async fn handle_user_message(
        state: &AppState,
        sender: &WsSender,
        session_id: Option<&str>,
        message: &str,
    ) {
        let start = Instant::now();

        match state.dispatcher.handle_message(session_id, message).await {
            Ok(Some(reply)) => {
                metrics::record_turn(start.elapsed());
                let out = WsMessage::AiResponse {
                    text: reply.text,
                    audio: BASE64.encode(&reply.audio),
                    avatar_video: reply.avatar_video,
                };
                send(sender, &out).await;
            }
            // Empty message: dropped silently, nothing goes out
            Ok(None) => {}
            Err(e) => {
                metrics::record_turn_error();
                tracing::error!(error = %e, "Turn failed");
                send(
                    sender,
                    &WsMessage::Error {
                        message: e.to_string(),
                    },
                )
                .await;
            }
        }
    }
}

async fn send(sender: &WsSender, msg: &WsMessage) {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize outbound message");
            return;
        }
    };
    let mut s = sender.lock().await;
    if let Err(e) = s.send(Message::Text(json)).await {
        tracing::debug!(error = %e, "Failed to send WebSocket message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_parsing() {
        let json = r#"{"type": "user_message", "message": "hello", "session_id": "s1"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        match msg {
            WsMessage::UserMessage {
                message,
                session_id,
            } => {
                assert_eq!(message, "hello");
                assert_eq!(session_id.as_deref(), Some("s1"));
            }
            _ => panic!("wrong variant"),
        }

        // session_id is optional
        let json = r#"{"type": "user_message", "message": "hi"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, WsMessage::UserMessage { session_id: None, .. }));
    }

    #[test]
    fn test_frame_event_parsing() {
        let json = r#"{"type": "video_frame", "frame": "data:image/png;base64,AAAA"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, WsMessage::VideoFrame { .. }));
    }

    #[test]
    fn test_outbound_response_serialization() {
        let msg = WsMessage::AiResponse {
            text: "hi".to_string(),
            audio: "QUJD".to_string(),
            avatar_video: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"ai_response""#));
        assert!(json.contains(r#""avatar_video":null"#));

        let msg = WsMessage::Error {
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"error""#));
    }
}
