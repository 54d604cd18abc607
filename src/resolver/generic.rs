//! Extractor-backed resolver shared by every platform without a dedicated strategy.
//!
//! Platforms differ only in their [`GenericProfile`]: the fallback title, the
//! extractor's format selection, and whether the list is bounded by the
//! [selector](crate::selector).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::extractor::{
    BEST_FORMAT, BEST_VIDEO_AUDIO_FORMAT, MetadataExtractor, RawFormat, RawVideoInfo,
};
use crate::model::{FormatDescriptor, PlatformKind, VideoMetadata};
use crate::selector::{DEFAULT_FORMAT_LIMIT, select};

use super::{DownloadSource, DownloadTarget, ResolveError, Resolver};

/// Per-platform parameters of the generic strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericProfile {
    pub platform: PlatformKind,
    pub fallback_title: &'static str,
    /// Extractor format expression used for metadata.
    pub format_selection: &'static str,
    /// Bound applied through the selector; `None` lists every video format.
    pub max_formats: Option<usize>,
}

impl GenericProfile {
    /// Profile for a named platform: best single format, unbounded list.
    #[must_use]
    pub fn platform(platform: PlatformKind) -> Self {
        Self {
            platform,
            fallback_title: platform.fallback_title(),
            format_selection: BEST_FORMAT,
            max_formats: None,
        }
    }

    /// Profile for URLs no pattern matched: best video+audio, top ten formats.
    #[must_use]
    pub fn unclassified() -> Self {
        Self {
            platform: PlatformKind::Unknown,
            fallback_title: PlatformKind::Unknown.fallback_title(),
            format_selection: BEST_VIDEO_AUDIO_FORMAT,
            max_formats: Some(DEFAULT_FORMAT_LIMIT),
        }
    }
}

/// Resolver delegating to a [`MetadataExtractor`].
pub struct GenericResolver {
    extractor: Arc<dyn MetadataExtractor>,
    profile: GenericProfile,
    name: String,
}

impl GenericResolver {
    /// Creates a resolver for the given profile.
    #[must_use]
    pub fn new(extractor: Arc<dyn MetadataExtractor>, profile: GenericProfile) -> Self {
        let name = format!("generic:{}", profile.platform);
        Self {
            extractor,
            profile,
            name,
        }
    }

    /// The profile this resolver runs with.
    #[must_use]
    pub fn profile(&self) -> &GenericProfile {
        &self.profile
    }
}

impl GenericResolver {
    /// Maps an info document into the metadata this profile lists.
    fn metadata_from(&self, info: &RawVideoInfo) -> VideoMetadata {
        let formats: Vec<FormatDescriptor> = match self.profile.max_formats {
            Some(limit) => select(&info.formats, limit),
            None => info.video_formats().map(RawFormat::to_descriptor).collect(),
        };
        debug!(
            raw = info.formats.len(),
            kept = formats.len(),
            "Mapped extractor formats"
        );

        VideoMetadata::new(
            info.title.clone(),
            self.profile.fallback_title,
            info.duration.unwrap_or(0),
            info.thumbnail_url(),
            formats,
        )
    }
}

impl std::fmt::Debug for GenericResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericResolver")
            .field("extractor", &self.extractor.name())
            .field("profile", &self.profile)
            .finish()
    }
}

#[async_trait]
impl Resolver for GenericResolver {
    fn name(&self) -> &str {
        &self.name
    }

    #[tracing::instrument(skip(self), fields(resolver = %self.name))]
    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError> {
        let info = self
            .extractor
            .extract(url, self.profile.format_selection)
            .await?;

        let metadata = self.metadata_from(&info);
        info!(title = %metadata.title, formats = metadata.formats.len(), "Resolved metadata");
        Ok(metadata)
    }

    /// Asks the extractor about the exact selection the downloader will run
    /// (`{format_id}+bestaudio/best`), so the merged extension is known.
    #[tracing::instrument(skip(self), fields(resolver = %self.name))]
    async fn locate_format(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<Option<DownloadTarget>, ResolveError> {
        let selection = download_selection(format_id);
        let info = self.extractor.extract(url, &selection).await?;

        let metadata = self.metadata_from(&info);
        let (Some(descriptor), Some(format)) = (
            metadata.find_format(format_id),
            info.video_formats().find(|f| f.format_id == format_id),
        ) else {
            debug!(format_id, "Format not among the listed formats");
            return Ok(None);
        };

        let ext = info
            .ext
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or(descriptor.ext.clone(), str::to_ascii_lowercase);

        Ok(Some(DownloadTarget {
            title: metadata.title.clone(),
            ext,
            format_id: format_id.to_string(),
            estimated_size: format.best_known_size().or(info.filesize_approx),
            source: DownloadSource::Subprocess,
        }))
    }
}

/// Downloader format expression for a chosen format.
#[must_use]
pub fn download_selection(format_id: &str) -> String {
    format!("{format_id}+bestaudio/best")
}
