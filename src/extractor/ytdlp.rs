//! yt-dlp backed metadata extraction.
//!
//! Runs `yt-dlp --dump-single-json` and parses the document it prints.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::resolver::ResolveError;
use crate::user_agent::BROWSER_USER_AGENT;

use super::{MetadataExtractor, RawVideoInfo};

/// Default executable name, looked up on `PATH`.
pub const DEFAULT_YTDLP_BINARY: &str = "yt-dlp";

/// Metadata extractor that shells out to yt-dlp.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl YtDlpExtractor {
    /// Creates an extractor running the given executable.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The executable this extractor runs.
    #[must_use]
    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    fn command(&self, url: &str, format_selection: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-single-json")
            .arg("--no-download")
            .arg("--flat-playlist")
            .arg("--no-warnings")
            .arg("--quiet")
            .arg("-f")
            .arg(format_selection)
            .arg("--user-agent")
            .arg(BROWSER_USER_AGENT)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_YTDLP_BINARY)
    }
}

#[async_trait]
impl MetadataExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    #[instrument(skip(self), fields(extractor = "yt-dlp"))]
    async fn extract(
        &self,
        url: &str,
        format_selection: &str,
    ) -> Result<RawVideoInfo, ResolveError> {
        let output = self
            .command(url, format_selection)
            .output()
            .await
            .map_err(|e| {
                ResolveError::extraction(
                    url,
                    format!("could not run {}: {e}", self.binary.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = ?output.status.code(), stderr = %stderr, "yt-dlp extraction failed");
            let reason = if stderr.is_empty() {
                format!("extractor exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ResolveError::extraction(url, reason));
        }

        debug!(bytes = output.stdout.len(), "yt-dlp returned info document");
        serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolveError::parse(url, format!("unreadable info document: {e}")))
    }
}
