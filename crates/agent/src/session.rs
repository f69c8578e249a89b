//! Session profiles
//!
//! A session holds a user's avatar/voice preferences across messages.
//! Profiles are created lazily on first use and live for the process
//! lifetime. A cloned-voice id is only ever set after a successful clone
//! call, and a public avatar URL only after a successful upload; absence
//! of either is a common, valid state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

/// Session key used when the client does not supply one
pub const DEFAULT_SESSION_KEY: &str = "default";

/// Per-session profile data
pub struct SessionProfile {
    /// Session key
    pub id: String,
    /// Creation time
    pub created_at: Instant,
    avatar_image_path: RwLock<Option<PathBuf>>,
    avatar_public_url: RwLock<Option<String>>,
    voice_sample_path: RwLock<Option<PathBuf>>,
    voice_id: RwLock<Option<String>>,
    last_avatar_video: RwLock<Option<String>>,
}

impl SessionProfile {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Instant::now(),
            avatar_image_path: RwLock::new(None),
            avatar_public_url: RwLock::new(None),
            voice_sample_path: RwLock::new(None),
            voice_id: RwLock::new(None),
            last_avatar_video: RwLock::new(None),
        }
    }

    pub fn set_avatar_image(&self, path: impl Into<PathBuf>) {
        *self.avatar_image_path.write() = Some(path.into());
    }

    pub fn avatar_image(&self) -> Option<PathBuf> {
        self.avatar_image_path.read().clone()
    }

    pub fn set_avatar_public_url(&self, url: impl Into<String>) {
        *self.avatar_public_url.write() = Some(url.into());
    }

    pub fn avatar_public_url(&self) -> Option<String> {
        self.avatar_public_url.read().clone()
    }

    pub fn set_voice_sample(&self, path: impl Into<PathBuf>) {
        *self.voice_sample_path.write() = Some(path.into());
    }

    pub fn voice_sample(&self) -> Option<PathBuf> {
        self.voice_sample_path.read().clone()
    }

    pub fn set_voice_id(&self, voice_id: impl Into<String>) {
        *self.voice_id.write() = Some(voice_id.into());
    }

    pub fn voice_id(&self) -> Option<String> {
        self.voice_id.read().clone()
    }

    pub fn set_last_avatar_video(&self, url: impl Into<String>) {
        *self.last_avatar_video.write() = Some(url.into());
    }

    pub fn last_avatar_video(&self) -> Option<String> {
        self.last_avatar_video.read().clone()
    }
}

/// In-memory session registry, keyed by opaque session key
#[derive(Default)]
pub struct SessionStore {
    profiles: RwLock<HashMap<String, Arc<SessionProfile>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an existing profile
    pub fn get(&self, key: &str) -> Option<Arc<SessionProfile>> {
        self.profiles.read().get(key).cloned()
    }

    /// Get or lazily create the profile for `key`.
    ///
    /// `None` maps to [`DEFAULT_SESSION_KEY`].
    pub fn get_or_create(&self, key: Option<&str>) -> Arc<SessionProfile> {
        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => DEFAULT_SESSION_KEY,
        };

        if let Some(profile) = self.profiles.read().get(key) {
            return profile.clone();
        }

        let mut profiles = self.profiles.write();
        profiles
            .entry(key.to_string())
            .or_insert_with(|| {
                tracing::info!(session = %key, "Created session profile");
                Arc::new(SessionProfile::new(key))
            })
            .clone()
    }

    /// Number of known sessions
    pub fn count(&self) -> usize {
        self.profiles.read().len()
    }

    /// List all session keys
    pub fn list(&self) -> Vec<String> {
        self.profiles.read().keys().cloned().collect()
    }

    /// Drop all profiles
    pub fn clear(&self) {
        self.profiles.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation() {
        let store = SessionStore::new();
        assert_eq!(store.count(), 0);

        let profile = store.get_or_create(Some("abc"));
        assert_eq!(profile.id, "abc");
        assert_eq!(store.count(), 1);

        // Same key resolves to the same profile
        let again = store.get_or_create(Some("abc"));
        assert!(Arc::ptr_eq(&profile, &again));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_default_key() {
        let store = SessionStore::new();
        let a = store.get_or_create(None);
        let b = store.get_or_create(Some(""));
        assert_eq!(a.id, DEFAULT_SESSION_KEY);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_profile_fields_default_absent() {
        let store = SessionStore::new();
        let profile = store.get_or_create(Some("s"));

        assert!(profile.avatar_public_url().is_none());
        assert!(profile.voice_id().is_none());
        assert!(profile.last_avatar_video().is_none());

        profile.set_voice_id("voice-1");
        profile.set_avatar_public_url("https://img.example.com/a.jpg");
        assert_eq!(profile.voice_id().as_deref(), Some("voice-1"));
        assert_eq!(
            profile.avatar_public_url().as_deref(),
            Some("https://img.example.com/a.jpg")
        );
    }

    #[test]
    fn test_avatar_image_path() {
        let store = SessionStore::new();
        let profile = store.get_or_create(Some("s"));
        profile.set_avatar_image(Path::new("uploads/s/face.jpg"));
        assert_eq!(
            profile.avatar_image(),
            Some(PathBuf::from("uploads/s/face.jpg"))
        );
    }
}
