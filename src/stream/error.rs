//! Error types for the download module.

use thiserror::Error;

use crate::resolver::ResolveError;

/// Errors raised while planning or streaming one download.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Refreshed metadata has no format with the requested id.
    #[error("format '{format_id}' is not available for {url}")]
    InvalidFormatSelected {
        /// The requested format id.
        format_id: String,
        /// The media page URL.
        url: String,
    },

    /// The proxied upstream answered with a non-success status.
    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamFetch {
        /// The media URL being proxied.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Transport failure on the proxy path, before or during the body.
    #[error("network error streaming {url}: {source}")]
    Network {
        /// The media URL being proxied.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The downloader process could not be started or its pipes read.
    #[error("could not run downloader '{program}': {source}")]
    Spawn {
        /// Executable that was launched.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The downloader process exited non-zero.
    #[error("downloader exited with {}: {stderr}", exit_label(*code))]
    SubprocessFailure {
        /// Exit code; `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// Locating the format failed during resolution.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
}

impl StreamError {
    /// Creates an `InvalidFormatSelected` error.
    #[must_use]
    pub fn invalid_format(format_id: &str, url: &str) -> Self {
        Self::InvalidFormatSelected {
            format_id: format_id.to_string(),
            url: url.to_string(),
        }
    }

    /// Creates a `Network` error.
    #[must_use]
    pub fn network(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            source,
        }
    }

    /// Stable code reported to clients alongside the message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormatSelected { .. } => "invalid_format_selected",
            Self::UpstreamFetch { .. } => "upstream_fetch_error",
            Self::Network { .. } => "network_error",
            Self::Spawn { .. } => "spawn_failed",
            Self::SubprocessFailure { .. } => "subprocess_failure",
            Self::Resolve(inner) => inner.code(),
        }
    }
}
