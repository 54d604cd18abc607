//! Runtime settings shared by the resolvers and the download streamer.

use std::path::PathBuf;
use std::time::Duration;

use crate::browser::{DEFAULT_MAX_SESSIONS, DEFAULT_WEBDRIVER_URL};
use crate::extractor::DEFAULT_YTDLP_BINARY;
use crate::http_client::HttpTimeouts;

/// Default wait for the 9gag video element.
pub const DEFAULT_ELEMENT_TIMEOUT_SECS: u64 = 10;

/// Upper bound accepted for concurrent browser sessions.
pub const MAX_BROWSER_SESSIONS: usize = 16;

/// Resolved service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Extractor/downloader executable (looked up on `PATH` when bare).
    pub ytdlp_path: PathBuf,
    /// WebDriver endpoint used for browser-automation resolvers.
    pub webdriver_url: String,
    pub max_browser_sessions: usize,
    pub element_timeout: Duration,
    pub http_timeouts: HttpTimeouts,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from(DEFAULT_YTDLP_BINARY),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            max_browser_sessions: DEFAULT_MAX_SESSIONS,
            element_timeout: Duration::from_secs(DEFAULT_ELEMENT_TIMEOUT_SECS),
            http_timeouts: HttpTimeouts::default(),
        }
    }
}

impl AppConfig {
    /// Clamps the browser session bound into `1..=16`.
    #[must_use]
    pub fn with_max_browser_sessions(mut self, sessions: usize) -> Self {
        self.max_browser_sessions = sessions.clamp(1, MAX_BROWSER_SESSIONS);
        self
    }
}
