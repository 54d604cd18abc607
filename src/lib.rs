//! Clipstream Library
//!
//! Resolves media page URLs into normalized video metadata and streams a
//! chosen format back to the caller.
//!
//! # Architecture
//!
//! - [`classifier`] - URL to [`PlatformKind`] classification
//! - [`resolver`] - Per-platform metadata resolution and the dispatch registry
//! - [`extractor`] - yt-dlp backed metadata extraction
//! - [`browser`] - Headless browser sessions for page-scraping resolvers
//! - [`selector`] - Bounded format selection
//! - [`stream`] - Download streaming (HTTP proxy or downloader subprocess)
//! - [`server`] - axum router exposing the HTTP API

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod classifier;
pub mod config;
pub mod extractor;
pub mod http_client;
pub mod model;
pub mod resolver;
pub mod selector;
pub mod server;
pub mod stream;
pub mod user_agent;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use classifier::classify;
pub use config::AppConfig;
pub use model::{FormatDescriptor, PlatformKind, VideoMetadata};
pub use resolver::{ResolveError, Resolver, ResolverRegistry, build_default_resolver_registry};
pub use selector::{DEFAULT_FORMAT_LIMIT, select};
pub use server::{AppState, build_cors_layer, router};
pub use stream::{MediaStream, StreamError, Streamer};
