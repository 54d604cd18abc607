//! Download streaming: re-resolve the chosen format and deliver its bytes.
//!
//! [`Streamer::open`] runs the resolving phase and returns a [`MediaStream`]
//! whose headers are final before the first body byte. The body comes from
//! one of two paths:
//!
//! - [`proxy`] forwards a direct upstream URL (Vimeo, 9gag).
//! - [`subprocess`] pipes the external downloader (every other platform).

mod error;
pub mod proxy;
pub mod subprocess;

pub use error::StreamError;
pub use subprocess::SubprocessDownloader;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::AppConfig;
use crate::http_client::build_http_client;
use crate::resolver::{DownloadSource, ResolverRegistry};

/// Upper bound on the size of each forwarded body chunk.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Content type sent on the proxy path.
pub const PROXY_CONTENT_TYPE: &str = "video/mp4";

/// Content type sent on the subprocess path.
pub const SUBPROCESS_CONTENT_TYPE: &str = "application/octet-stream";

/// A download whose headers are settled and whose body has not been sent.
pub struct MediaStream {
    /// `"{title}.{ext}"` before encoding.
    pub filename: String,
    pub content_type: &'static str,
    pub estimated_size: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, StreamError>>,
}

impl MediaStream {
    /// `attachment; filename*=UTF-8''{percent-encoded filename}`.
    #[must_use]
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }

    /// Percent-encoded filename for `X-Original-Filename`.
    #[must_use]
    pub fn encoded_filename(&self) -> String {
        encode_filename(&self.filename)
    }

    /// Value for `X-Estimated-FileSize`; empty when unknown.
    #[must_use]
    pub fn estimated_size_header(&self) -> String {
        self.estimated_size.map(|n| n.to_string()).unwrap_or_default()
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("estimated_size", &self.estimated_size)
            .finish_non_exhaustive()
    }
}

/// Percent-encodes a filename for header use.
#[must_use]
pub fn encode_filename(filename: &str) -> String {
    urlencoding::encode(filename).into_owned()
}

/// RFC 5987 attachment disposition for `filename`.
#[must_use]
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename*=UTF-8''{}", encode_filename(filename))
}

/// Plans and opens downloads.
#[derive(Clone)]
pub struct Streamer {
    registry: Arc<ResolverRegistry>,
    client: Client,
    downloader: SubprocessDownloader,
}

impl Streamer {
    /// Creates a streamer with an explicit proxy client and downloader.
    #[must_use]
    pub fn new(
        registry: Arc<ResolverRegistry>,
        client: Client,
        downloader: SubprocessDownloader,
    ) -> Self {
        Self {
            registry,
            client,
            downloader,
        }
    }

    /// Creates a streamer from runtime settings.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Resolve`] when the proxy client cannot be built.
    pub fn from_config(
        registry: Arc<ResolverRegistry>,
        config: &AppConfig,
    ) -> Result<Self, StreamError> {
        let client = build_http_client("proxy", config.http_timeouts)?;
        Ok(Self::new(
            registry,
            client,
            SubprocessDownloader::new(config.ytdlp_path.clone()),
        ))
    }

    /// The registry used to re-resolve formats.
    #[must_use]
    pub fn registry(&self) -> &Arc<ResolverRegistry> {
        &self.registry
    }

    /// Re-resolves `url`, locates `format_id` and opens its byte stream.
    ///
    /// On the subprocess path the first chunk is awaited before returning, so
    /// a downloader that fails without producing output is reported here
    /// rather than after the response has started.
    ///
    /// # Errors
    ///
    /// - [`StreamError::InvalidFormatSelected`] if the refreshed metadata lacks the id
    /// - [`StreamError::Resolve`] if re-resolution fails
    /// - [`StreamError::UpstreamFetch`] / [`StreamError::Network`] on the proxy path
    /// - [`StreamError::Spawn`] / [`StreamError::SubprocessFailure`] on the subprocess path
    #[instrument(skip(self))]
    pub async fn open(&self, url: &str, format_id: &str) -> Result<MediaStream, StreamError> {
        let target = self
            .registry
            .locate_format(url, format_id)
            .await?
            .ok_or_else(|| StreamError::invalid_format(format_id, url))?;
        let filename = target.filename();
        debug!(filename = %filename, source = ?target.source, "Located format");

        let (content_type, body) = match &target.source {
            DownloadSource::Direct(source_url) => (
                PROXY_CONTENT_TYPE,
                proxy::open_proxy_stream(&self.client, source_url).await?,
            ),
            DownloadSource::Subprocess => (
                SUBPROCESS_CONTENT_TYPE,
                prime(self.downloader.spawn(url, format_id)?).await?,
            ),
        };

        info!(
            filename = %filename,
            content_type,
            estimated_size = ?target.estimated_size,
            "Streaming download"
        );
        Ok(MediaStream {
            filename,
            content_type,
            estimated_size: target.estimated_size,
            body,
        })
    }
}

impl std::fmt::Debug for Streamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streamer")
            .field("registry", &self.registry)
            .field("downloader", &self.downloader)
            .finish_non_exhaustive()
    }
}

/// Waits for the first item; an immediate error is returned instead of streamed.
async fn prime(
    mut body: BoxStream<'static, Result<Bytes, StreamError>>,
) -> Result<BoxStream<'static, Result<Bytes, StreamError>>, StreamError> {
    match body.next().await {
        None => Ok(stream::empty().boxed()),
        Some(Err(error)) => Err(error),
        Some(Ok(first)) => Ok(stream::once(async move { Ok(first) }).chain(body).boxed()),
    }
}
