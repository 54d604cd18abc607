//! Resolver registry keyed by platform.
//!
//! The [`ResolverRegistry`] classifies a URL and hands it to the resolver
//! registered for that [`PlatformKind`], falling back to the generic strategy
//! for anything without a dedicated entry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::browser::{BrowserPool, WebDriverBrowser};
use crate::classifier::classify;
use crate::config::AppConfig;
use crate::extractor::{MetadataExtractor, YtDlpExtractor};
use crate::model::{PlatformKind, VideoMetadata};

use super::{
    DownloadTarget, GenericProfile, GenericResolver, NineGagResolver, ResolveError, Resolver,
    VimeoResolver,
};

/// Platforms served by the generic extractor strategy with a named profile.
const GENERIC_PLATFORMS: [PlatformKind; 5] = [
    PlatformKind::Youtube,
    PlatformKind::Twitter,
    PlatformKind::Instagram,
    PlatformKind::Facebook,
    PlatformKind::Twitch,
];

/// Platform lookup table with a fallback resolver.
pub struct ResolverRegistry {
    resolvers: HashMap<PlatformKind, Arc<dyn Resolver>>,
    fallback: Arc<dyn Resolver>,
}

impl ResolverRegistry {
    /// Creates a registry where every platform routes to `fallback`.
    #[must_use]
    pub fn new(fallback: Arc<dyn Resolver>) -> Self {
        Self {
            resolvers: HashMap::new(),
            fallback,
        }
    }

    /// Registers the resolver for one platform, replacing any previous entry.
    #[tracing::instrument(skip(self, resolver), fields(resolver_name))]
    pub fn register(&mut self, platform: PlatformKind, resolver: Arc<dyn Resolver>) {
        tracing::Span::current().record("resolver_name", resolver.name());
        debug!(%platform, name = resolver.name(), "Registering resolver");
        self.resolvers.insert(platform, resolver);
    }

    /// Returns the number of platform-specific entries.
    #[must_use]
    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    /// The resolver responsible for `platform`.
    #[must_use]
    pub fn resolver_for(&self, platform: PlatformKind) -> &dyn Resolver {
        self.resolvers
            .get(&platform)
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Classifies `url` and resolves it with the matching resolver.
    ///
    /// # Errors
    ///
    /// Returns the resolver's [`ResolveError`] unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError> {
        let platform = classify(url);
        let resolver = self.resolver_for(platform);
        debug!(%platform, resolver = resolver.name(), "Dispatching");

        let metadata = resolver.resolve(url).await?;
        info!(
            %platform,
            resolver = resolver.name(),
            formats = metadata.formats.len(),
            "Resolution successful"
        );
        Ok(metadata)
    }

    /// Classifies `url` and asks the matching resolver for `format_id`.
    ///
    /// # Errors
    ///
    /// Returns the resolver's [`ResolveError`] unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn locate_format(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<Option<DownloadTarget>, ResolveError> {
        let platform = classify(url);
        let resolver = self.resolver_for(platform);
        debug!(%platform, resolver = resolver.name(), "Locating format");
        resolver.locate_format(url, format_id).await
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .resolvers
            .iter()
            .map(|(platform, resolver)| (platform.as_str(), resolver.name()))
            .collect();
        names.sort_unstable();
        f.debug_struct("ResolverRegistry")
            .field("resolvers", &names)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// Builds the production registry: generic profiles for the extractor-backed
/// platforms, the config-endpoint resolver for Vimeo, browser scraping for
/// 9gag, and the unclassified profile as fallback.
///
/// Resolvers that cannot be constructed are skipped with a warning; their
/// platform then routes to the fallback.
#[must_use]
pub fn build_default_resolver_registry(config: &AppConfig) -> ResolverRegistry {
    let extractor: Arc<dyn MetadataExtractor> =
        Arc::new(YtDlpExtractor::new(config.ytdlp_path.clone()));
    build_resolver_registry(config, extractor)
}

/// Same as [`build_default_resolver_registry`] with a caller-supplied extractor.
#[must_use]
pub fn build_resolver_registry(
    config: &AppConfig,
    extractor: Arc<dyn MetadataExtractor>,
) -> ResolverRegistry {
    let mut registry = ResolverRegistry::new(Arc::new(GenericResolver::new(
        Arc::clone(&extractor),
        GenericProfile::unclassified(),
    )));

    for platform in GENERIC_PLATFORMS {
        registry.register(
            platform,
            Arc::new(GenericResolver::new(
                Arc::clone(&extractor),
                GenericProfile::platform(platform),
            )),
        );
    }

    match VimeoResolver::new(config.http_timeouts) {
        Ok(resolver) => registry.register(PlatformKind::Vimeo, Arc::new(resolver)),
        Err(error) => warn!(
            error = %error,
            "Vimeo resolver unavailable; vimeo URLs use the generic fallback"
        ),
    }

    match WebDriverBrowser::new(config.webdriver_url.clone(), config.http_timeouts) {
        Ok(browser) => {
            let pool = BrowserPool::new(Arc::new(browser), config.max_browser_sessions);
            registry.register(
                PlatformKind::Gag9,
                Arc::new(NineGagResolver::new(pool, config.element_timeout)),
            );
        }
        Err(error) => warn!(
            error = %error,
            "9gag resolver unavailable; 9gag URLs use the generic fallback"
        ),
    }

    registry
}
