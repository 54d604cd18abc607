//! Proxy path: forwards an upstream HTTP body without buffering it.

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::{CHUNK_SIZE, StreamError};

/// Opens a streaming GET to `url` and returns its body in chunks of at most
/// [`CHUNK_SIZE`] bytes, in upstream order.
///
/// # Errors
///
/// Returns [`StreamError::UpstreamFetch`] on a non-success status and
/// [`StreamError::Network`] when the request fails. Transport failures after
/// the body has started surface as an `Err` item in the stream.
#[instrument(skip(client))]
pub async fn open_proxy_stream(
    client: &Client,
    url: &str,
) -> Result<BoxStream<'static, Result<Bytes, StreamError>>, StreamError> {
    let response = client.get(url).send().await.map_err(|e| {
        warn!(error = %e, "Upstream media request failed");
        StreamError::network(url, e)
    })?;

    let status = response.status();
    if !status.is_success() {
        debug!(status = status.as_u16(), "Upstream media refused");
        return Err(StreamError::UpstreamFetch {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    debug!(content_length = ?response.content_length(), "Proxying upstream body");

    let url = url.to_string();
    let body = response.bytes_stream().flat_map(move |item| {
        let pieces: Vec<Result<Bytes, StreamError>> = match item {
            Ok(bytes) => split_chunks(bytes).into_iter().map(Ok).collect(),
            Err(error) => {
                warn!(url = %url, error = %error, "Upstream body failed mid-stream");
                vec![Err(StreamError::network(&url, error))]
            }
        };
        stream::iter(pieces)
    });
    Ok(body.boxed())
}

/// Splits `bytes` into views of at most [`CHUNK_SIZE`] bytes without copying.
fn split_chunks(mut bytes: Bytes) -> Vec<Bytes> {
    let mut pieces = Vec::with_capacity(bytes.len().div_ceil(CHUNK_SIZE));
    while bytes.len() > CHUNK_SIZE {
        pieces.push(bytes.split_to(CHUNK_SIZE));
    }
    if !bytes.is_empty() {
        pieces.push(bytes);
    }
    pieces
}
