//! 9gag resolver - scrapes the post page in a headless browser session.
//!
//! The video element is attached by client-side script, so the page has to be
//! rendered. Each request takes one session from the [`BrowserPool`] and
//! returns it before `resolve` completes, whether scraping succeeded or not.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::browser::{BrowserPool, BrowserSession, wait_for_element};
use crate::model::{FormatDescriptor, PlatformKind, VideoMetadata};

use super::{ResolveError, Resolver};

/// Selector for the post's video element.
const VIDEO_SELECTOR: &str = "video";

/// Selector for the post title.
const TITLE_SELECTOR: &str = "h1.post-title";

/// The single format a 9gag post exposes.
const FORMAT_ID: &str = "9gag_default";

/// Resolves 9gag posts through browser automation.
#[derive(Debug, Clone)]
pub struct NineGagResolver {
    pool: BrowserPool,
    element_timeout: Duration,
}

impl NineGagResolver {
    /// Creates a resolver drawing sessions from `pool` and waiting at most
    /// `element_timeout` for the video element.
    #[must_use]
    pub fn new(pool: BrowserPool, element_timeout: Duration) -> Self {
        Self {
            pool,
            element_timeout,
        }
    }

    async fn scrape(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<VideoMetadata, ResolveError> {
        session.navigate(url).await?;
        let video = wait_for_element(session, url, VIDEO_SELECTOR, self.element_timeout).await?;

        let mut src = session.attribute(&video, "src").await?;
        if src.as_deref().is_none_or(|s| s.trim().is_empty())
            && let Some(source) = session.find_child(&video, "source").await?
        {
            src = session.attribute(&source, "src").await?;
        }
        let src = src
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ResolveError::parse(url, "video element has no source URL"))?;

        let title = match session.find_element(TITLE_SELECTOR).await? {
            Some(element) => Some(session.text(&element).await?),
            None => None,
        };

        let format = FormatDescriptor::new(FORMAT_ID, Some("mp4"), None, None)
            .with_source_url(Some(src));
        Ok(VideoMetadata::new(
            title,
            PlatformKind::Gag9.fallback_title(),
            0,
            None,
            vec![format],
        ))
    }
}

#[async_trait]
impl Resolver for NineGagResolver {
    fn name(&self) -> &'static str {
        "9gag"
    }

    #[tracing::instrument(skip(self), fields(resolver = "9gag"))]
    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError> {
        let mut pooled = self.pool.acquire().await?;
        let result = match pooled.session() {
            Ok(session) => self.scrape(session, url).await,
            Err(error) => Err(error),
        };
        pooled.release().await;

        match &result {
            Ok(metadata) => info!(title = %metadata.title, "Scraped 9gag post"),
            Err(error) => debug!(error = %error, "9gag scrape failed"),
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::browser::tests::{FakeDriver, FakePage};
    use crate::resolver::DownloadSource;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    const POST: &str = "https://9gag.com/gag/aXYZ123";

    fn resolver_for(page: FakePage) -> (NineGagResolver, Arc<FakeDriver>) {
        let driver = Arc::new(FakeDriver {
            page,
            ..FakeDriver::default()
        });
        let pool = BrowserPool::new(driver.clone(), 1);
        (
            NineGagResolver::new(pool, Duration::from_secs(10)),
            driver,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrapes_video_src_and_title() {
        let (resolver, driver) = resolver_for(FakePage {
            appear_after: Some(2),
            video_src: Some("https://img-9gag-fun.9cache.com/photo/a_460sv.mp4".into()),
            title: Some("When the code compiles".into()),
            ..FakePage::default()
        });

        let metadata = resolver.resolve(POST).await.unwrap();
        assert_eq!(metadata.title, "When the code compiles");
        assert_eq!(metadata.duration, 0);
        assert_eq!(metadata.thumbnail_url, None);
        assert_eq!(metadata.formats.len(), 1);
        let format = &metadata.formats[0];
        assert_eq!(format.format_id, "9gag_default");
        assert_eq!(format.ext, "mp4");
        assert_eq!(format.resolution, "unknown");
        assert_eq!(format.filesize_bytes, None);

        assert_eq!(driver.navigated.lock().unwrap().as_slice(), [POST]);
        assert_eq!(driver.quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_source_child_and_default_title() {
        let (resolver, driver) = resolver_for(FakePage {
            appear_after: Some(0),
            source_child_src: Some("https://img-9gag-fun.9cache.com/photo/b.mp4".into()),
            ..FakePage::default()
        });

        let metadata = resolver.resolve(POST).await.unwrap();
        assert_eq!(metadata.title, "9gag video");
        assert_eq!(
            metadata.formats[0].source_url.as_deref(),
            Some("https://img-9gag-fun.9cache.com/photo/b.mp4")
        );
        assert_eq!(driver.quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_still_releases_session() {
        let (resolver, driver) = resolver_for(FakePage::default());

        let err = resolver.resolve(POST).await.unwrap_err();
        assert_eq!(err.code(), "element_not_found_timeout");
        assert_eq!(driver.opened.load(Ordering::SeqCst), 1);
        assert_eq!(driver.quit.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.pool.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_src_is_parse_error() {
        let (resolver, driver) = resolver_for(FakePage {
            appear_after: Some(0),
            ..FakePage::default()
        });

        let err = resolver.resolve(POST).await.unwrap_err();
        assert_eq!(err.code(), "parse_error");
        assert_eq!(driver.quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_format_proxies_scraped_src() {
        let (resolver, driver) = resolver_for(FakePage {
            appear_after: Some(0),
            video_src: Some("https://img-9gag-fun.9cache.com/photo/c.mp4".into()),
            title: Some("Cat".into()),
            ..FakePage::default()
        });

        let target = resolver
            .locate_format(POST, "9gag_default")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            target.source,
            DownloadSource::Direct("https://img-9gag-fun.9cache.com/photo/c.mp4".into())
        );
        assert_eq!(target.filename(), "Cat.mp4");
        assert_eq!(driver.quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_browser_unavailable_propagates() {
        let driver = Arc::new(FakeDriver {
            fail_open: true,
            ..FakeDriver::default()
        });
        let resolver =
            NineGagResolver::new(BrowserPool::new(driver, 1), Duration::from_secs(10));
        let err = resolver.resolve(POST).await.unwrap_err();
        assert_eq!(err.code(), "browser_unavailable");
    }
}
