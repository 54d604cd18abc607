//! Cross-origin policy for browser clients.

use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;
use url::Url;

use super::{X_ESTIMATED_FILESIZE, X_ORIGINAL_FILENAME};

/// A configured origin that is not a valid `scheme://host[:port]`.
#[derive(Debug, Error)]
#[error("invalid allowed origin '{origin}': {reason}")]
pub struct InvalidOrigin {
    pub origin: String,
    pub reason: String,
}

/// Builds the CORS layer. An empty list allows any origin.
///
/// The download headers are exposed so browser clients can read the filename
/// and size estimate.
///
/// # Errors
///
/// Returns [`InvalidOrigin`] when an entry cannot be parsed as an origin.
pub fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, InvalidOrigin> {
    let allow_origin = if origins.is_empty() {
        info!("CORS allows any origin");
        AllowOrigin::from(Any)
    } else {
        let values = origins
            .iter()
            .map(|origin| normalize_origin(origin))
            .collect::<Result<Vec<_>, _>>()?;
        info!(origins = ?values, "CORS allow-list loaded");
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION, X_ESTIMATED_FILESIZE, X_ORIGINAL_FILENAME]))
}

fn normalize_origin(origin: &str) -> Result<HeaderValue, InvalidOrigin> {
    let invalid = |reason: String| InvalidOrigin {
        origin: origin.to_string(),
        reason,
    };
    let parsed = Url::parse(origin.trim()).map_err(|e| invalid(e.to_string()))?;
    let serialized = parsed.origin().ascii_serialization();
    if serialized == "null" {
        return Err(invalid("origin has no host".to_string()));
    }
    HeaderValue::from_str(&serialized).map_err(|e| invalid(e.to_string()))
}
