//! Platform resolution: turning a media URL into normalized metadata.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait each platform strategy implements
//! - [`ResolverRegistry`] - Lookup table keyed by [`PlatformKind`] with a generic fallback
//! - [`GenericResolver`] - Extractor-backed strategy shared by most platforms
//! - [`VimeoResolver`] - Player config endpoint strategy
//! - [`NineGagResolver`] - Headless browser page scrape
//!
//! # Example
//!
//! ```no_run
//! use clipstream::AppConfig;
//! use clipstream::resolver::build_default_resolver_registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_resolver_registry(&AppConfig::default());
//! let metadata = registry.resolve("https://vimeo.com/76979871").await?;
//! println!("{} ({} formats)", metadata.title, metadata.formats.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod generic;
mod ninegag;
mod registry;
mod vimeo;

pub use error::ResolveError;
pub use generic::{GenericProfile, GenericResolver, download_selection};
pub use ninegag::NineGagResolver;
pub use registry::{ResolverRegistry, build_default_resolver_registry, build_resolver_registry};
pub use vimeo::VimeoResolver;

use async_trait::async_trait;

use crate::model::{FormatDescriptor, VideoMetadata};

/// How the bytes of a chosen format reach the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// Forward an upstream HTTP response from this URL.
    Direct(String),
    /// Re-acquire through the external downloader process.
    Subprocess,
}

/// Everything the streamer needs to deliver one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub title: String,
    /// Extension of the delivered file (may differ from the format's own after merging).
    pub ext: String,
    pub format_id: String,
    pub estimated_size: Option<u64>,
    pub source: DownloadSource,
}

impl DownloadTarget {
    /// Builds a target from a descriptor; direct when the descriptor has a source URL.
    #[must_use]
    pub fn from_descriptor(title: &str, format: &FormatDescriptor) -> Self {
        Self {
            title: title.to_string(),
            ext: format.ext.clone(),
            format_id: format.format_id.clone(),
            estimated_size: format.filesize_bytes,
            source: format
                .source_url
                .clone()
                .map_or(DownloadSource::Subprocess, DownloadSource::Direct),
        }
    }

    /// `"{title}.{ext}"`, the name offered to the client.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("{}.{}", self.title, self.ext)
    }
}

/// A platform strategy: given a URL, produce normalized metadata.
///
/// Resolvers report failures as typed errors and never retry internally.
///
/// # Object Safety
///
/// This trait uses `async_trait` so the registry can hold `Arc<dyn Resolver>`.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver's name (e.g. "vimeo", "9gag", "generic:youtube").
    fn name(&self) -> &str;

    /// Resolves the URL into metadata listing its downloadable formats.
    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError>;

    /// Re-resolves the URL and locates `format_id` for download.
    ///
    /// Returns `Ok(None)` when the refreshed metadata has no such format.
    async fn locate_format(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<Option<DownloadTarget>, ResolveError> {
        let metadata = self.resolve(url).await?;
        Ok(metadata
            .find_format(format_id)
            .map(|format| DownloadTarget::from_descriptor(&metadata.title, format)))
    }
}
