//! Upload endpoints
//!
//! Multipart upload of a session's avatar image and voice sample. Files
//! are persisted under `uploads/{session}/` with sanitized names, then
//! wired into the session profile: avatar images are re-published to the
//! public image host, voice samples are sent to the clone provider. Both
//! follow-up steps may fail without failing the upload; the response
//! reports what succeeded.

use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::state::AppState;
use crate::ServerError;

struct UploadRequest {
    session_id: Option<String>,
    file_name: Option<String>,
    data: Option<Vec<u8>>,
}

async fn read_multipart(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadRequest, ServerError> {
    let mut out = UploadRequest {
        session_id: None,
        file_name: None,
        data: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "session_id" => {
                out.session_id = field.text().await.ok().filter(|s| !s.is_empty());
            }
            "file" => {
                out.file_name = field.file_name().map(|n| n.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    ServerError::InvalidRequest(format!("Failed reading file field: {e}"))
                })?;
                if bytes.len() > max_bytes {
                    return Err(ServerError::PayloadTooLarge);
                }
                out.data = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(out)
}

async fn persist_upload(
    uploads_dir: &str,
    session_key: &str,
    file_name: Option<&str>,
    fallback_name: &str,
    data: &[u8],
) -> Result<PathBuf, std::io::Error> {
    let dir = Path::new(uploads_dir).join(sanitize_filename(session_key));
    tokio::fs::create_dir_all(&dir).await?;

    let name = file_name
        .map(sanitize_filename)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    let path = dir.join(name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Upload a session's avatar image.
///
/// Persists the file, records it on the profile, and attempts to publish
/// it to the public image host. A failed publish is a valid outcome: the
/// session keeps the default avatar.
pub async fn upload_avatar(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ServerError> {
    let req = read_multipart(multipart, state.config.uploads.max_bytes).await?;
    let data = req
        .data
        .ok_or_else(|| ServerError::InvalidRequest("Missing file field".to_string()))?;

    let profile = state.context.sessions.get_or_create(req.session_id.as_deref());
    let path = persist_upload(
        &state.config.uploads.dir,
        &profile.id,
        req.file_name.as_deref(),
        "avatar.jpg",
        &data,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to persist avatar upload");
        ServerError::Upload(e.to_string())
    })?;

    profile.set_avatar_image(&path);
    tracing::info!(session = %profile.id, path = %path.display(), "Avatar image uploaded");

    let public_url = state.image_host.publish(&path).await;
    if let Some(ref url) = public_url {
        profile.set_avatar_public_url(url.clone());
    }

    Ok(Json(json!({
        "session_id": profile.id,
        "saved": true,
        "public_url": public_url,
    })))
}

/// Upload a session's voice sample.
///
/// Persists the file and attempts a voice clone. A failed or unconfigured
/// clone is a valid outcome: synthesis falls back to the default engine.
pub async fn upload_voice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ServerError> {
    let req = read_multipart(multipart, state.config.uploads.max_bytes).await?;
    let data = req
        .data
        .ok_or_else(|| ServerError::InvalidRequest("Missing file field".to_string()))?;

    let profile = state.context.sessions.get_or_create(req.session_id.as_deref());
    let path = persist_upload(
        &state.config.uploads.dir,
        &profile.id,
        req.file_name.as_deref(),
        "voice.mp3",
        &data,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to persist voice upload");
        ServerError::Upload(e.to_string())
    })?;

    profile.set_voice_sample(&path);
    tracing::info!(session = %profile.id, path = %path.display(), "Voice sample uploaded");

    let voice_id = match &state.voice_clone {
        Some(api) => {
            let name = format!("session-{}", profile.id);
            match api.clone_voice(&name, &path).await {
                Ok(id) => {
                    profile.set_voice_id(id.clone());
                    Some(id)
                }
                Err(e) => {
                    tracing::warn!(session = %profile.id, error = %e, "Voice clone failed");
                    None
                }
            }
        }
        None => {
            tracing::debug!("Voice-clone provider not configured");
            None
        }
    };

    Ok(Json(json!({
        "session_id": profile.id,
        "saved": true,
        "voice_id": voice_id,
    })))
}

/// Reduce a client-supplied filename to a safe `[A-Za-z0-9._-]` subset.
///
/// Path separators and anything else exotic become underscores; leading
/// dots are stripped so the result is never hidden or a traversal.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_names() {
        assert_eq!(sanitize_filename("face.jpg"), "face.jpg");
        assert_eq!(sanitize_filename("My Photo (1).png"), "My_Photo__1_.png");
    }

    #[test]
    fn test_sanitize_traversal_attempts() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("..\\windows"), "_windows");
        assert!(!sanitize_filename("....///").starts_with('.'));
    }

    #[test]
    fn test_sanitize_hidden_files() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[tokio::test]
    async fn test_persist_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_string_lossy().to_string();

        let path = persist_upload(&base, "sess/../x", Some("a b.jpg"), "avatar.jpg", b"bytes")
            .await
            .unwrap();

        // Session key is sanitized into a single directory component
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.file_name().unwrap(), "a_b.jpg");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"bytes");
    }
}
