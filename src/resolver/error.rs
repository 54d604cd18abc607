//! Error types for resolver operations.
//!
//! Every variant maps to a stable machine-readable code (see
//! [`ResolveError::code`]) so the HTTP boundary can report more than a
//! free-text message.

use thiserror::Error;

/// Errors that can occur while turning a platform URL into [`VideoMetadata`].
///
/// [`VideoMetadata`]: crate::model::VideoMetadata
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// An HTTP dependency answered with a non-success status.
    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamFetch {
        /// The URL that was fetched.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("network error fetching {url}: {message}")]
    Network {
        /// The URL that was fetched.
        url: String,
        /// Rendered transport error.
        message: String,
    },

    /// A config endpoint returned a body that does not have the expected shape.
    #[error("malformed response from {url}: {reason}")]
    Parse {
        /// The URL whose body failed to parse.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Browser automation could not find the expected page content in time.
    #[error(
        "no '{selector}' element appeared on {url} within {timeout_secs}s\n  Suggestion: Check that the post contains a video and is publicly visible"
    )]
    ElementNotFoundTimeout {
        /// The page URL.
        url: String,
        /// CSS selector that was awaited.
        selector: String,
        /// The bound that expired.
        timeout_secs: u64,
    },

    /// The generic metadata extractor rejected the URL or failed to run.
    #[error("metadata extraction failed for {url}: {reason}")]
    Extraction {
        /// The URL being extracted.
        url: String,
        /// Extractor diagnostics.
        reason: String,
    },

    /// The headless browser could not be driven (session start, navigation, teardown).
    #[error("browser automation unavailable: {reason}")]
    Browser {
        /// What failed.
        reason: String,
    },

    /// The URL lacks the structure a platform strategy needs (e.g. a numeric id).
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A resolver could not set up its networking.
    #[error("HTTP client construction failed for {resolver}: {reason}")]
    ClientSetup {
        /// Resolver that failed to build its client.
        resolver: String,
        /// Underlying builder failure.
        reason: String,
    },
}

impl ResolveError {
    /// Creates an `UpstreamFetch` error.
    #[must_use]
    pub fn upstream(url: &str, status: u16) -> Self {
        Self::UpstreamFetch {
            url: url.to_string(),
            status,
        }
    }

    /// Creates a `Network` error from a transport failure.
    #[must_use]
    pub fn network(url: &str, error: &reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    /// Creates a `Parse` error.
    #[must_use]
    pub fn parse(url: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an `ElementNotFoundTimeout` error.
    #[must_use]
    pub fn element_timeout(url: &str, selector: &str, timeout_secs: u64) -> Self {
        Self::ElementNotFoundTimeout {
            url: url.to_string(),
            selector: selector.to_string(),
            timeout_secs,
        }
    }

    /// Creates an `Extraction` error.
    #[must_use]
    pub fn extraction(url: &str, reason: impl Into<String>) -> Self {
        Self::Extraction {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `Browser` error.
    #[must_use]
    pub fn browser(reason: impl Into<String>) -> Self {
        Self::Browser {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidUrl` error.
    #[must_use]
    pub fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `ClientSetup` error.
    #[must_use]
    pub fn client_setup(resolver: &str, reason: impl Into<String>) -> Self {
        Self::ClientSetup {
            resolver: resolver.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable code reported to clients alongside the message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UpstreamFetch { .. } => "upstream_fetch_error",
            Self::Network { .. } => "network_error",
            Self::Parse { .. } => "parse_error",
            Self::ElementNotFoundTimeout { .. } => "element_not_found_timeout",
            Self::Extraction { .. } => "extraction_failed",
            Self::Browser { .. } => "browser_unavailable",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::ClientSetup { .. } => "client_setup_failed",
        }
    }
}
