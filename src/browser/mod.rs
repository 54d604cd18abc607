//! Headless browser capability used by page-scraping resolvers.
//!
//! - [`BrowserDriver`] opens isolated sessions (one per request).
//! - [`BrowserSession`] is the narrow set of page operations resolvers need.
//! - [`BrowserPool`] bounds how many sessions exist at once and hands out
//!   [`PooledSession`] guards that must be [`released`](PooledSession::release).
//! - [`WebDriverBrowser`] speaks the W3C WebDriver protocol to a
//!   chromedriver-compatible endpoint.

mod webdriver;

pub use webdriver::{DEFAULT_WEBDRIVER_URL, WebDriverBrowser};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::resolver::ResolveError;

/// Default bound on concurrent browser sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 2;

/// Interval between element lookups while waiting for a page to render.
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opaque reference to an element inside one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

/// Factory for browser sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Starts a fresh, isolated headless session.
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ResolveError>;
}

/// Page operations available on a live session.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url` and waits for the initial document load.
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError>;

    /// Finds the first element matching a CSS selector, `None` when absent.
    async fn find_element(&mut self, css: &str) -> Result<Option<ElementHandle>, ResolveError>;

    /// Finds the first descendant of `parent` matching a CSS selector.
    async fn find_child(
        &mut self,
        parent: &ElementHandle,
        css: &str,
    ) -> Result<Option<ElementHandle>, ResolveError>;

    /// Reads an attribute, `None` when the element does not carry it.
    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, ResolveError>;

    /// Reads the element's rendered text.
    async fn text(&mut self, element: &ElementHandle) -> Result<String, ResolveError>;

    /// Tears the session down. Later calls are no-ops.
    async fn quit(&mut self) -> Result<(), ResolveError>;
}

/// Polls for `css` until it appears or `timeout` elapses.
///
/// # Errors
///
/// Returns [`ResolveError::ElementNotFoundTimeout`] when the deadline passes,
/// or the session's own error if a lookup fails outright.
pub async fn wait_for_element(
    session: &mut dyn BrowserSession,
    url: &str,
    css: &str,
    timeout: Duration,
) -> Result<ElementHandle, ResolveError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = session.find_element(css).await? {
            return Ok(element);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(ResolveError::element_timeout(url, css, timeout.as_secs()));
        }
        sleep(ELEMENT_POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// Bounded source of browser sessions shared by all requests.
#[derive(Clone)]
pub struct BrowserPool {
    driver: Arc<dyn BrowserDriver>,
    permits: Arc<Semaphore>,
}

impl BrowserPool {
    /// Creates a pool allowing at most `max_sessions` live sessions (minimum 1).
    #[must_use]
    pub fn new(driver: Arc<dyn BrowserDriver>, max_sessions: usize) -> Self {
        Self {
            driver,
            permits: Arc::new(Semaphore::new(max_sessions.max(1))),
        }
    }

    /// Number of sessions that could be opened right now without waiting.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot, then opens a session in it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Browser`] if the pool is closed, or the driver's
    /// error if the session cannot start (the slot is freed again).
    pub async fn acquire(&self) -> Result<PooledSession, ResolveError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ResolveError::browser("browser pool is closed"))?;
        let session = self.driver.open_session().await?;
        debug!(available = self.available(), "Browser session opened");
        Ok(PooledSession {
            session: Some(session),
            _permit: permit,
        })
    }
}

impl std::fmt::Debug for BrowserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPool")
            .field("available", &self.available())
            .finish_non_exhaustive()
    }
}

/// A session holding one pool slot until released or dropped.
pub struct PooledSession {
    session: Option<Box<dyn BrowserSession>>,
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    /// Borrows the live session.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Browser`] if the session was already released.
    pub fn session(&mut self) -> Result<&mut dyn BrowserSession, ResolveError> {
        match self.session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(ResolveError::browser("browser session already released")),
        }
    }

    /// Quits the session and frees the slot. Teardown failures are logged, not returned.
    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take()
            && let Err(error) = session.quit().await
        {
            warn!(error = %error, "Browser session teardown failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted page: the element appears after `appear_after` lookups.
    #[derive(Clone, Default)]
    pub(crate) struct FakePage {
        pub(crate) appear_after: Option<usize>,
        pub(crate) video_src: Option<String>,
        pub(crate) source_child_src: Option<String>,
        pub(crate) title: Option<String>,
    }

    #[derive(Default)]
    pub(crate) struct FakeDriver {
        pub(crate) page: FakePage,
        pub(crate) opened: AtomicUsize,
        pub(crate) quit: Arc<AtomicUsize>,
        pub(crate) navigated: Arc<Mutex<Vec<String>>>,
        pub(crate) fail_open: bool,
    }

    struct FakeSession {
        page: FakePage,
        lookups: usize,
        quit: Arc<AtomicUsize>,
        navigated: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BrowserDriver for FakeDriver {
        async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ResolveError> {
            if self.fail_open {
                return Err(ResolveError::browser("no chromedriver"));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                page: self.page.clone(),
                lookups: 0,
                quit: Arc::clone(&self.quit),
                navigated: Arc::clone(&self.navigated),
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), ResolveError> {
            self.navigated.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn find_element(&mut self, css: &str) -> Result<Option<ElementHandle>, ResolveError> {
            match css {
                "video" => {
                    self.lookups += 1;
                    Ok(self
                        .page
                        .appear_after
                        .filter(|after| self.lookups > *after)
                        .map(|_| ElementHandle("video-1".into())))
                }
                "h1.post-title" => Ok(self
                    .page
                    .title
                    .as_ref()
                    .map(|_| ElementHandle("title-1".into()))),
                _ => Ok(None),
            }
        }

        async fn find_child(
            &mut self,
            _parent: &ElementHandle,
            css: &str,
        ) -> Result<Option<ElementHandle>, ResolveError> {
            Ok((css == "source" && self.page.source_child_src.is_some())
                .then(|| ElementHandle("source-1".into())))
        }

        async fn attribute(
            &mut self,
            element: &ElementHandle,
            name: &str,
        ) -> Result<Option<String>, ResolveError> {
            Ok(match (element.0.as_str(), name) {
                ("video-1", "src") => self.page.video_src.clone(),
                ("source-1", "src") => self.page.source_child_src.clone(),
                _ => None,
            })
        }

        async fn text(&mut self, _element: &ElementHandle) -> Result<String, ResolveError> {
            Ok(self.page.title.clone().unwrap_or_default())
        }

        async fn quit(&mut self) -> Result<(), ResolveError> {
            self.quit.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_element_polls_until_present() {
        let driver = FakeDriver {
            page: FakePage {
                appear_after: Some(3),
                ..FakePage::default()
            },
            ..FakeDriver::default()
        };
        let mut session = driver.open_session().await.unwrap();
        let element = wait_for_element(
            session.as_mut(),
            "https://9gag.com/gag/a",
            "video",
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert_eq!(element, ElementHandle("video-1".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_element_times_out() {
        let driver = FakeDriver::default();
        let mut session = driver.open_session().await.unwrap();
        let err = wait_for_element(
            session.as_mut(),
            "https://9gag.com/gag/a",
            "video",
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ElementNotFoundTimeout { timeout_secs: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_pool_bounds_sessions_and_frees_on_release() {
        let driver = Arc::new(FakeDriver::default());
        let quit = Arc::clone(&driver.quit);
        let pool = BrowserPool::new(driver, 1);

        let session = pool.acquire().await.unwrap();
        assert_eq!(pool.available(), 0);

        let pending = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(pending.is_err(), "second acquire should wait for the slot");

        session.release().await;
        assert_eq!(pool.available(), 1);
        assert_eq!(quit.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pool_frees_slot_when_open_fails() {
        let driver = Arc::new(FakeDriver {
            fail_open: true,
            ..FakeDriver::default()
        });
        let pool = BrowserPool::new(driver, 1);
        assert!(pool.acquire().await.is_err());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_pool_minimum_one_session() {
        let pool = BrowserPool::new(Arc::new(FakeDriver::default()), 0);
        assert_eq!(pool.available(), 1);
    }
}
