//! Shared HTTP client construction policy.
//!
//! Config-endpoint fetches, proxied media downloads and WebDriver calls all
//! build their clients here so timeout, browser headers, compression, cookies
//! and proxy handling stay consistent.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::resolver::ResolveError;
use crate::user_agent::{BROWSER_ACCEPT, BROWSER_ACCEPT_LANGUAGE, BROWSER_USER_AGENT};

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default per-read timeout in seconds.
///
/// Applies between body chunks, not to the whole transfer, so long media
/// streams are not cut off.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Timeout settings applied to every client built by [`build_http_client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds an HTTP client that presents itself as a desktop browser.
///
/// `name` is only used for error messages and logging.
///
/// # Errors
///
/// Returns [`ResolveError::ClientSetup`] when client construction fails.
pub fn build_http_client(name: &str, timeouts: HttpTimeouts) -> Result<Client, ResolveError> {
    match try_build_client(timeouts, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic when querying system
            // proxy settings; env proxies still apply on the fallback path.
            warn!(
                client = name,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(timeouts, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ResolveError::client_setup(
                    name,
                    "HTTP client construction panicked",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(ResolveError::client_setup(name, error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => {
            Err(ResolveError::client_setup(name, error.to_string()))
        }
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers
}

fn base_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(browser_headers())
        .cookie_store(true)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
