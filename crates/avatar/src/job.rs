//! Avatar job state machine
//!
//! Drives one submit-then-poll job to a terminal state. Transitions are
//! monotonic: Submitted -> Processing -> {Done | Error}, or TimedOut after
//! exhausting the attempt budget. There is no transition out of a terminal
//! state and no external cancel signal; the attempt budget is the only
//! bound on the loop.

use std::sync::Arc;
use std::time::Duration;

use crate::talks::{TalkState, TalksApi};

/// Local job status, tracked per call (not persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Processing,
    Done,
    Error,
    TimedOut,
}

/// Terminal outcome of one job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Terminal status reached
    pub status: JobStatus,
    /// Rendered video URL when status is Done
    pub result_url: Option<String>,
    /// Status polls performed
    pub polls: u32,
}

/// Configuration for the job manager
#[derive(Debug, Clone)]
pub struct AvatarJobConfig {
    /// Source image used when the caller has none
    pub default_source_url: String,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Maximum number of status polls before giving up
    pub max_attempts: u32,
    /// Provider limit on script text length (characters)
    pub script_cap_chars: usize,
}

impl Default for AvatarJobConfig {
    fn default() -> Self {
        Self {
            default_source_url: "https://d-id-public-bucket.s3.amazonaws.com/alice.jpg".to_string(),
            poll_interval: Duration::from_secs(2),
            max_attempts: 30,
            script_cap_chars: 300,
        }
    }
}

/// Talking-avatar job manager
pub struct AvatarJobManager {
    api: Arc<dyn TalksApi>,
    config: AvatarJobConfig,
}

impl AvatarJobManager {
    pub fn new(api: Arc<dyn TalksApi>, config: AvatarJobConfig) -> Self {
        Self { api, config }
    }

    /// Request a talking-avatar video for `text`.
    ///
    /// `source_url` is the session's public avatar image; when absent the
    /// configured default image is used. Returns the rendered video URL,
    /// or `None` for every terminal-without-result outcome (submission
    /// failure, provider error, attempt exhaustion). Never panics and
    /// never propagates provider errors.
    pub async fn request_talking_video(
        &self,
        source_url: Option<&str>,
        text: &str,
    ) -> Option<String> {
        let outcome = self.run_job(source_url, text).await;
        match outcome.status {
            JobStatus::Done => outcome.result_url,
            JobStatus::TimedOut => {
                tracing::warn!(
                    polls = outcome.polls,
                    "Avatar job did not finish within the attempt budget"
                );
                None
            }
            _ => None,
        }
    }

    /// Run one job to a terminal state.
    ///
    /// Exposed separately so tests can assert on the terminal status and
    /// poll count with scripted provider sequences.
    pub async fn run_job(&self, source_url: Option<&str>, text: &str) -> JobOutcome {
        let source = source_url.unwrap_or(&self.config.default_source_url);
        let script = truncate_chars(text, self.config.script_cap_chars);

        let talk_id = match self.api.create_talk(source, &script).await {
            Ok(id) => {
                tracing::info!(talk_id = %id, source_url = %source, "Avatar job submitted");
                id
            }
            Err(e) => {
                tracing::warn!(error = %e, "Avatar job submission failed");
                return JobOutcome {
                    status: JobStatus::Error,
                    result_url: None,
                    polls: 0,
                };
            }
        };

        let mut polls = 0u32;
        while polls < self.config.max_attempts {
            if !self.config.poll_interval.is_zero() {
                tokio::time::sleep(self.config.poll_interval).await;
            }
            polls += 1;

            let status = match self.api.get_talk(&talk_id).await {
                Ok(status) => status,
                Err(e) => {
                    // A failed poll burns an attempt but is not terminal
                    tracing::debug!(talk_id = %talk_id, error = %e, "Status poll failed");
                    continue;
                }
            };

            match status.status {
                TalkState::Done => {
                    return match status.result_url {
                        Some(url) => {
                            tracing::info!(talk_id = %talk_id, polls, "Avatar video ready");
                            JobOutcome {
                                status: JobStatus::Done,
                                result_url: Some(url),
                                polls,
                            }
                        }
                        None => {
                            tracing::warn!(talk_id = %talk_id, "Job done but no result URL");
                            JobOutcome {
                                status: JobStatus::Error,
                                result_url: None,
                                polls,
                            }
                        }
                    };
                }
                TalkState::Error | TalkState::Rejected => {
                    tracing::warn!(
                        talk_id = %talk_id,
                        detail = ?status.error,
                        "Avatar job failed on the provider side"
                    );
                    return JobOutcome {
                        status: JobStatus::Error,
                        result_url: None,
                        polls,
                    };
                }
                _ => {
                    tracing::debug!(talk_id = %talk_id, polls, "Avatar job still processing");
                }
            }
        }

        JobOutcome {
            status: JobStatus::TimedOut,
            result_url: None,
            polls,
        }
    }

    /// The configured script cap, for callers that want to pre-truncate
    pub fn script_cap_chars(&self) -> usize {
        self.config.script_cap_chars
    }
}

/// Truncate to at most `cap` characters, respecting char boundaries
fn truncate_chars(text: &str, cap: usize) -> String {
    if text.chars().count() <= cap {
        text.to_string()
    } else {
        text.chars().take(cap).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::talks::TalkStatus;
    use crate::AvatarError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted provider: a fixed status sequence, no real delays
    struct ScriptedTalks {
        submit_fails: bool,
        statuses: Mutex<VecDeque<TalkStatus>>,
        submitted_scripts: Mutex<Vec<String>>,
        poll_count: AtomicU32,
    }

    impl ScriptedTalks {
        fn new(statuses: Vec<TalkStatus>) -> Self {
            Self {
                submit_fails: false,
                statuses: Mutex::new(statuses.into()),
                submitted_scripts: Mutex::new(Vec::new()),
                poll_count: AtomicU32::new(0),
            }
        }

        fn failing_submit() -> Self {
            Self {
                submit_fails: true,
                statuses: Mutex::new(VecDeque::new()),
                submitted_scripts: Mutex::new(Vec::new()),
                poll_count: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TalksApi for ScriptedTalks {
        async fn create_talk(
            &self,
            _source_url: &str,
            script_text: &str,
        ) -> Result<String, AvatarError> {
            if self.submit_fails {
                return Err(AvatarError::Network("connection refused".to_string()));
            }
            self.submitted_scripts.lock().push(script_text.to_string());
            Ok("talk-1".to_string())
        }

        async fn get_talk(&self, _id: &str) -> Result<TalkStatus, AvatarError> {
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .statuses
                .lock()
                .pop_front()
                .unwrap_or_else(TalkStatus::processing))
        }
    }

    fn manager(api: Arc<ScriptedTalks>, max_attempts: u32) -> AvatarJobManager {
        AvatarJobManager::new(
            api,
            AvatarJobConfig {
                poll_interval: Duration::ZERO,
                max_attempts,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_done_after_three_polls() {
        let api = Arc::new(ScriptedTalks::new(vec![
            TalkStatus::processing(),
            TalkStatus::processing(),
            TalkStatus::done("https://cdn.example.com/talk.mp4"),
        ]));
        let mgr = manager(api.clone(), 30);

        let outcome = mgr.run_job(None, "hello").await;
        assert_eq!(outcome.status, JobStatus::Done);
        assert_eq!(
            outcome.result_url.as_deref(),
            Some("https://cdn.example.com/talk.mp4")
        );
        assert_eq!(outcome.polls, 3);
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_times_out() {
        let api = Arc::new(ScriptedTalks::new(vec![]));
        let mgr = manager(api.clone(), 5);

        let outcome = mgr.run_job(None, "hello").await;
        assert_eq!(outcome.status, JobStatus::TimedOut);
        assert!(outcome.result_url.is_none());
        assert_eq!(outcome.polls, 5);

        // The public wrapper maps the timeout to None, not a panic
        assert!(mgr.request_talking_video(None, "hello").await.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_is_terminal() {
        let api = Arc::new(ScriptedTalks::new(vec![
            TalkStatus::processing(),
            TalkStatus::failed(),
        ]));
        let mgr = manager(api.clone(), 30);

        let outcome = mgr.run_job(None, "hello").await;
        assert_eq!(outcome.status, JobStatus::Error);
        assert_eq!(outcome.polls, 2);
    }

    #[tokio::test]
    async fn test_submit_failure_returns_none_without_polling() {
        let api = Arc::new(ScriptedTalks::failing_submit());
        let mgr = manager(api.clone(), 30);

        assert!(mgr.request_talking_video(None, "hello").await.is_none());
        assert_eq!(api.poll_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_script_is_truncated() {
        let api = Arc::new(ScriptedTalks::new(vec![TalkStatus::done("u")]));
        let mgr = manager(api.clone(), 30);

        let long_text = "x".repeat(1000);
        mgr.run_job(None, &long_text).await;

        let scripts = api.submitted_scripts.lock();
        assert_eq!(scripts[0].chars().count(), 300);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 300), "short");
    }
}
