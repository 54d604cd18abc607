//! Normalized metadata and format descriptors shared by every resolver.
//!
//! Values are built fresh for each request and never mutated afterwards.
//! Serialization produces the JSON document returned by `POST /process-video`.

use serde::{Deserialize, Serialize};

/// Resolution string used when either dimension is unavailable.
pub const UNKNOWN_RESOLUTION: &str = "unknown";

/// Extension used when the source omits one.
pub const UNKNOWN_EXT: &str = "unknown";

/// Media platform families recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Youtube,
    Twitter,
    Vimeo,
    #[serde(rename = "9gag")]
    Gag9,
    Instagram,
    Facebook,
    Twitch,
    /// Routes to the generic resolver.
    Unknown,
}

impl PlatformKind {
    /// Every variant, in classification order, followed by `Unknown`.
    pub const ALL: [Self; 8] = [
        Self::Youtube,
        Self::Twitter,
        Self::Vimeo,
        Self::Gag9,
        Self::Instagram,
        Self::Facebook,
        Self::Twitch,
        Self::Unknown,
    ];

    /// Short lowercase tag used in logs and resolver names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Twitter => "twitter",
            Self::Vimeo => "vimeo",
            Self::Gag9 => "9gag",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Twitch => "twitch",
            Self::Unknown => "unknown",
        }
    }

    /// Title reported when the source omits one.
    #[must_use]
    pub fn fallback_title(self) -> &'static str {
        match self {
            Self::Youtube => "YouTube Video",
            Self::Twitter => "Twitter Video",
            Self::Vimeo => "Vimeo Video",
            Self::Gag9 => "9gag video",
            Self::Instagram => "Instagram Video",
            Self::Facebook => "Facebook Video",
            Self::Twitch => "Twitch Video",
            Self::Unknown => "Video",
        }
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable rendition of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    /// Unique within one [`VideoMetadata`]; the key the download endpoint matches on.
    pub format_id: String,
    /// Lower-case container extension.
    pub ext: String,
    /// `"{width}x{height}"` or `"unknown"`.
    pub resolution: String,
    /// Size in bytes; `None` when unknown.
    #[serde(rename = "filesize")]
    pub filesize_bytes: Option<u64>,
    /// Direct fetch location, when the resolver can expose one.
    ///
    /// Never serialized: clients re-acquire through `format_id`.
    #[serde(skip)]
    pub source_url: Option<String>,
}

impl FormatDescriptor {
    /// Creates a descriptor, normalizing the extension and resolution.
    #[must_use]
    pub fn new(
        format_id: impl Into<String>,
        ext: Option<&str>,
        width: Option<u64>,
        height: Option<u64>,
    ) -> Self {
        Self {
            format_id: format_id.into(),
            ext: normalize_ext(ext),
            resolution: canonical_resolution(width, height),
            filesize_bytes: None,
            source_url: None,
        }
    }

    /// Sets the size estimate.
    #[must_use]
    pub fn with_filesize(mut self, filesize_bytes: Option<u64>) -> Self {
        self.filesize_bytes = filesize_bytes;
        self
    }

    /// Sets the direct fetch location.
    #[must_use]
    pub fn with_source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url.filter(|url| !url.trim().is_empty());
        self
    }
}

/// Normalized description of one video and its formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    /// Seconds; 0 when unknown.
    pub duration: u64,
    pub thumbnail_url: Option<String>,
    /// Presentation order.
    pub formats: Vec<FormatDescriptor>,
}

impl VideoMetadata {
    /// Builds metadata, substituting `fallback_title` for a missing or blank title.
    ///
    /// Formats repeating an earlier `format_id` are dropped so ids stay unique.
    #[must_use]
    pub fn new(
        title: Option<String>,
        fallback_title: &str,
        duration: u64,
        thumbnail_url: Option<String>,
        formats: Vec<FormatDescriptor>,
    ) -> Self {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback_title.to_string());

        let mut seen = std::collections::HashSet::new();
        let formats = formats
            .into_iter()
            .filter(|format| !format.format_id.is_empty() && seen.insert(format.format_id.clone()))
            .collect();

        Self {
            title,
            duration,
            thumbnail_url: thumbnail_url.filter(|url| !url.trim().is_empty()),
            formats,
        }
    }

    /// Looks up a format by id.
    #[must_use]
    pub fn find_format(&self, format_id: &str) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}

/// Renders `"{width}x{height}"`, or `"unknown"` when either side is missing.
#[must_use]
pub fn canonical_resolution(width: Option<u64>, height: Option<u64>) -> String {
    match (width, height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        _ => UNKNOWN_RESOLUTION.to_string(),
    }
}

fn normalize_ext(ext: Option<&str>) -> String {
    ext.map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| UNKNOWN_EXT.to_string())
}
