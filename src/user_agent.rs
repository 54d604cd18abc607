//! Shared browser-identifying request headers.
//!
//! Single source for the User-Agent sent by the HTTP client, the metadata
//! extractor and the downloader subprocess, so every upstream sees the same
//! browser fingerprint.

/// Desktop Chrome User-Agent presented to every upstream platform.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// `Accept` header matching what the browser sends for page navigations.
pub const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// `Accept-Language` header matching the browser profile.
pub const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
