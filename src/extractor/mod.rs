//! Generic metadata-extraction capability.
//!
//! The generic resolver does not parse player pages itself; it asks a
//! [`MetadataExtractor`] for the raw info document and maps that into the
//! normalized model. [`YtDlpExtractor`] is the production implementation.

mod ytdlp;

pub use ytdlp::{DEFAULT_YTDLP_BINARY, YtDlpExtractor};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::model::FormatDescriptor;
use crate::resolver::ResolveError;

/// Format selection applied when extracting metadata for a named platform.
pub const BEST_FORMAT: &str = "best";

/// Format selection applied on the unclassified fallback path.
pub const BEST_VIDEO_AUDIO_FORMAT: &str = "bestvideo+bestaudio/best";

/// Extractor capability consumed by the generic resolver and the download planner.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Returns the extractor's name (for logs).
    fn name(&self) -> &str;

    /// Extracts the info document for `url` without downloading media.
    ///
    /// `format_selection` is the extractor's format expression; it decides which
    /// rendition the top-level `ext`/`filesize` fields describe.
    async fn extract(&self, url: &str, format_selection: &str)
    -> Result<RawVideoInfo, ResolveError>;
}

/// Info document as reported by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formats: Vec<RawFormat>,
    /// Extension of the rendition chosen by the format selection.
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
}

impl RawVideoInfo {
    /// Prefers the explicit thumbnail, else the first listed one.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<String> {
        self.thumbnail
            .clone()
            .filter(|url| !url.is_empty())
            .or_else(|| self.thumbnails.first().and_then(|t| t.url.clone()))
    }

    /// Formats that carry a video track, in extractor order.
    pub fn video_formats(&self) -> impl Iterator<Item = &RawFormat> {
        self.formats.iter().filter(|f| f.has_video())
    }

    /// Looks up a raw format by id.
    #[must_use]
    pub fn find_format(&self, format_id: &str) -> Option<&RawFormat> {
        self.formats.iter().find(|f| f.format_id == format_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

/// One rendition as reported by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub width: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
    /// `"none"` marks an audio-only rendition.
    #[serde(default)]
    pub vcodec: Option<String>,
}

impl RawFormat {
    /// False only when the extractor explicitly reports no video codec.
    #[must_use]
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    /// Exact size when known, else the extractor's estimate.
    #[must_use]
    pub fn best_known_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    /// Maps into a descriptor. The exact filesize only; estimates stay internal.
    ///
    /// No source URL is carried: extractor-backed formats are re-acquired
    /// through the downloader, never proxied.
    #[must_use]
    pub fn to_descriptor(&self) -> FormatDescriptor {
        FormatDescriptor::new(
            self.format_id.clone(),
            self.ext.as_deref(),
            self.width,
            self.height,
        )
        .with_filesize(self.filesize)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts integers, floats (truncated) and null; negative values become `None`.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(value.and_then(|number| {
        number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole = f as u64;
                    whole
                })
        })
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "title": "Sample",
        "duration": 212.6,
        "thumbnail": null,
        "thumbnails": [{"url": "https://img.example/0.jpg"}, {"url": "https://img.example/1.jpg"}],
        "ext": "mp4",
        "filesize_approx": 5000,
        "formats": [
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "filesize": 100},
            {"format_id": "18", "ext": "mp4", "width": 640, "height": 360, "vcodec": "avc1", "filesize": 2000, "url": "https://cdn.example/18"},
            {"format_id": "hls-1", "ext": "mp4", "width": null, "height": 720.0}
        ]
    }"#;

    #[test]
    fn test_parses_extractor_document() {
        let info: RawVideoInfo = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(info.title.as_deref(), Some("Sample"));
        assert_eq!(info.duration, Some(212));
        assert_eq!(info.formats.len(), 3);
        assert_eq!(info.formats[2].height, Some(720));
        assert_eq!(info.filesize_approx, Some(5000));
    }

    #[test]
    fn test_thumbnail_falls_back_to_first_listed() {
        let info: RawVideoInfo = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(info.thumbnail_url().as_deref(), Some("https://img.example/0.jpg"));

        let info = RawVideoInfo {
            thumbnail: Some("https://img.example/top.jpg".into()),
            ..info
        };
        assert_eq!(info.thumbnail_url().as_deref(), Some("https://img.example/top.jpg"));
    }

    #[test]
    fn test_video_formats_exclude_audio_only() {
        let info: RawVideoInfo = serde_json::from_str(SAMPLE).unwrap();
        let ids: Vec<&str> = info.video_formats().map(|f| f.format_id.as_str()).collect();
        assert_eq!(ids, vec!["18", "hls-1"]);
    }

    #[test]
    fn test_missing_vcodec_counts_as_video() {
        let format = RawFormat {
            format_id: "x".into(),
            ..RawFormat::default()
        };
        assert!(format.has_video());
    }

    #[test]
    fn test_to_descriptor_maps_fields() {
        let info: RawVideoInfo = serde_json::from_str(SAMPLE).unwrap();
        let descriptor = info.find_format("18").unwrap().to_descriptor();
        assert_eq!(descriptor.resolution, "640x360");
        assert_eq!(descriptor.filesize_bytes, Some(2000));
        assert_eq!(descriptor.source_url, None);

        let descriptor = info.find_format("hls-1").unwrap().to_descriptor();
        assert_eq!(descriptor.resolution, "unknown");
        assert_eq!(descriptor.filesize_bytes, None);
    }

    #[test]
    fn test_null_lists_deserialize_empty() {
        let info: RawVideoInfo =
            serde_json::from_str(r#"{"title": "t", "formats": null, "thumbnails": null}"#).unwrap();
        assert!(info.formats.is_empty());
        assert_eq!(info.thumbnail_url(), None);
    }
}
