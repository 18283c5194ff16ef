use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A transient notification. `source` ties it to a download job.
#[derive(Debug, Clone)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub source: Option<String>,
    pub expires_at: Instant,
}

impl Alert {
    pub fn notify(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_timeout(title, message, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        title: impl Into<String>,
        message: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            source: None,
            expires_at: Instant::now() + timeout,
        }
    }

    pub fn for_job(mut self, id: &str) -> Self {
        self.source = Some(id.to_string());
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
