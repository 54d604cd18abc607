//! Vimeo resolver - reads the player config endpoint directly.
//!
//! The config document lists progressive MP4 renditions with direct URLs, so
//! downloads of Vimeo formats are proxied rather than re-acquired through the
//! external downloader.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::extractor::lenient_u64;
use crate::http_client::{HttpTimeouts, build_http_client};
use crate::model::{FormatDescriptor, PlatformKind, VideoMetadata};

use super::{ResolveError, Resolver};

/// Default player host serving `/video/{id}/config`.
const DEFAULT_CONFIG_BASE_URL: &str = "https://player.vimeo.com";

/// Thumbnail size key preferred from the `thumbs` map.
const THUMBNAIL_SIZE: &str = "640";

// ==================== Config Response Types ====================

#[derive(Debug, Deserialize)]
struct VimeoConfig {
    video: VimeoVideo,
    #[serde(default)]
    request: Option<VimeoRequest>,
}

#[derive(Debug, Deserialize)]
struct VimeoVideo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    duration: Option<u64>,
    #[serde(default)]
    thumbs: HashMap<String, String>,
    /// Older config documents list renditions here instead of under `request.files`.
    #[serde(default)]
    progressive: Option<Vec<VimeoFile>>,
}

#[derive(Debug, Deserialize)]
struct VimeoRequest {
    #[serde(default)]
    files: Option<VimeoFiles>,
}

#[derive(Debug, Deserialize)]
struct VimeoFiles {
    #[serde(default)]
    progressive: Option<Vec<VimeoFile>>,
}

#[derive(Debug, Deserialize)]
struct VimeoFile {
    quality: String,
    url: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    width: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    height: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: Option<u64>,
}

impl VimeoConfig {
    fn progressive(&self) -> &[VimeoFile] {
        self.request
            .as_ref()
            .and_then(|r| r.files.as_ref())
            .and_then(|f| f.progressive.as_deref())
            .or(self.video.progressive.as_deref())
            .unwrap_or_default()
    }

    fn into_metadata(self) -> VideoMetadata {
        let formats = self
            .progressive()
            .iter()
            .map(|file| {
                FormatDescriptor::new(
                    format!("vimeo_{}", file.quality),
                    Some("mp4"),
                    file.width,
                    file.height,
                )
                .with_filesize(file.size)
                .with_source_url(Some(file.url.clone()))
            })
            .collect();

        VideoMetadata::new(
            self.video.title,
            PlatformKind::Vimeo.fallback_title(),
            self.video.duration.unwrap_or(0),
            self.video.thumbs.get(THUMBNAIL_SIZE).cloned(),
            formats,
        )
    }
}

// ==================== VimeoResolver ====================

/// Resolves Vimeo pages via `https://player.vimeo.com/video/{id}/config`.
pub struct VimeoResolver {
    client: Client,
    base_url: String,
}

impl VimeoResolver {
    /// Creates a resolver against the public player host.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if HTTP client construction fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ResolveError> {
        Self::with_config_base_url(DEFAULT_CONFIG_BASE_URL, timeouts)
    }

    /// Creates a resolver with a custom config host (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if HTTP client construction fails.
    pub fn with_config_base_url(
        base_url: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_http_client("vimeo", timeouts)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn config_url(&self, video_id: &str) -> String {
        format!("{}/video/{video_id}/config", self.base_url)
    }
}

impl std::fmt::Debug for VimeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VimeoResolver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Resolver for VimeoResolver {
    fn name(&self) -> &'static str {
        "vimeo"
    }

    #[tracing::instrument(skip(self), fields(resolver = "vimeo"))]
    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError> {
        let video_id = video_id(url)?;
        let config_url = self.config_url(video_id);
        debug!(config_url = %config_url, "Fetching Vimeo player config");

        let response = self.client.get(&config_url).send().await.map_err(|e| {
            warn!(error = %e, "Vimeo config request failed");
            ResolveError::network(&config_url, &e)
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(status = status.as_u16(), "Vimeo config endpoint refused");
            return Err(ResolveError::upstream(&config_url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::network(&config_url, &e))?;
        let config: VimeoConfig = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, "Unexpected Vimeo config shape");
            ResolveError::parse(&config_url, e.to_string())
        })?;

        let metadata = config.into_metadata();
        debug!(formats = metadata.formats.len(), "Parsed Vimeo config");
        Ok(metadata)
    }
}

/// Extracts the numeric video id from the last path segment.
///
/// Query strings, fragments and a trailing slash are ignored.
fn video_id(url: &str) -> Result<&str, ResolveError> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ResolveError::invalid_url(
            url,
            "expected a numeric Vimeo video id as the last path segment",
        ));
    }
    Ok(segment)
}
