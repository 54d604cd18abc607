//! W3C WebDriver client for a chromedriver-compatible endpoint.
//!
//! Each [`WebDriverBrowser::open_session`] call creates a new headless Chrome
//! session; the returned handle deletes it on [`quit`](BrowserSession::quit),
//! and falls back to a background delete if it is dropped without quitting.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::http_client::{HttpTimeouts, build_http_client};
use crate::resolver::ResolveError;
use crate::user_agent::BROWSER_USER_AGENT;

use super::{BrowserDriver, BrowserSession, ElementHandle};

/// Default chromedriver endpoint.
pub const DEFAULT_WEBDRIVER_URL: &str = "http://127.0.0.1:9515";

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Browser driver backed by a remote WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct WebDriverBrowser {
    client: Client,
    base_url: String,
}

impl WebDriverBrowser {
    /// Creates a driver talking to `base_url` (e.g. `http://127.0.0.1:9515`).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when HTTP client construction fails.
    pub fn new(base_url: impl Into<String>, timeouts: HttpTimeouts) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_http_client("webdriver", timeouts)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn session_capabilities() -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            format!("--user-agent={BROWSER_USER_AGENT}"),
                        ]
                    }
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct NewSessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse<T> {
    value: T,
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    #[instrument(skip(self), fields(webdriver = %self.base_url))]
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ResolveError> {
        let value = send_command(
            &self.client,
            Method::POST,
            &format!("{}/session", self.base_url),
            Some(Self::session_capabilities()),
        )
        .await?
        .ok_or_else(|| ResolveError::browser("WebDriver refused to create a session"))?;

        let created: NewSessionValue = serde_json::from_value(value)
            .map_err(|e| ResolveError::browser(format!("unexpected new-session reply: {e}")))?;
        debug!(session_id = %created.session_id, "WebDriver session created");

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.base_url, created.session_id),
            closed: false,
        }))
    }
}

struct WebDriverSession {
    client: Client,
    session_url: String,
    closed: bool,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ResolveError> {
        send_command(
            &self.client,
            method,
            &format!("{}{path}", self.session_url),
            body,
        )
        .await
    }

    async fn locate(&self, path: &str, css: &str) -> Result<Option<ElementHandle>, ResolveError> {
        let body = json!({ "using": "css selector", "value": css });
        let Some(value) = self.command(Method::POST, path, Some(body)).await? else {
            return Ok(None);
        };
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| Some(ElementHandle(id.to_string())))
            .ok_or_else(|| ResolveError::browser("element reply carried no element reference"))
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    async fn find_element(&mut self, css: &str) -> Result<Option<ElementHandle>, ResolveError> {
        self.locate("/element", css).await
    }

    async fn find_child(
        &mut self,
        parent: &ElementHandle,
        css: &str,
    ) -> Result<Option<ElementHandle>, ResolveError> {
        self.locate(&format!("/element/{}/element", parent.0), css)
            .await
    }

    async fn attribute(
        &mut self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, ResolveError> {
        let value = self
            .command(
                Method::GET,
                &format!("/element/{}/attribute/{name}", element.0),
                None,
            )
            .await?;
        Ok(value.and_then(|v| v.as_str().map(ToString::to_string)))
    }

    async fn text(&mut self, element: &ElementHandle) -> Result<String, ResolveError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        Ok(value
            .and_then(|v| v.as_str().map(ToString::to_string))
            .unwrap_or_default())
    }

    async fn quit(&mut self) -> Result<(), ResolveError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.command(Method::DELETE, "", None).await.map(|_| ())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Dropped mid-request (cancelled future): delete the session in the background.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(session = %self.session_url, "Browser session leaked: no runtime for teardown");
            return;
        };
        let client = self.client.clone();
        let session_url = self.session_url.clone();
        handle.spawn(async move {
            if let Err(error) = client.delete(&session_url).send().await {
                warn!(session = %session_url, error = %error, "Background session teardown failed");
            }
        });
    }
}

/// Sends one WebDriver command and unwraps its `value`.
///
/// `no such element` replies become `Ok(None)`; other failures become
/// [`ResolveError::Browser`].
async fn send_command(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Option<Value>, ResolveError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request
        .send()
        .await
        .map_err(|e| ResolveError::browser(format!("WebDriver request to {url} failed: {e}")))?;

    let status = response.status();
    let reply: WireResponse<Value> = response
        .json()
        .await
        .map_err(|e| ResolveError::browser(format!("unreadable WebDriver reply: {e}")))?;

    if status.is_success() {
        return Ok(Some(reply.value).filter(|v| !v.is_null()));
    }

    let error = reply
        .value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if status == StatusCode::NOT_FOUND && error == "no such element" {
        return Ok(None);
    }
    let message = reply
        .value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(error);
    Err(ResolveError::browser(format!(
        "WebDriver returned HTTP {}: {message}",
        status.as_u16()
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_new_session(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_partial_json(json!({
                "capabilities": {"alwaysMatch": {"browserName": "chrome"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": {"sessionId": "s1", "capabilities": {}}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_session_roundtrip_reads_element_attribute_and_text() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_new_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .and(body_partial_json(json!({"url": "https://9gag.com/gag/a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .and(body_partial_json(json!({"using": "css selector", "value": "video"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"value": {ELEMENT_KEY: "e-video"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/e-video/attribute/src"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"value": "https://img-9gag-fun.9cache.com/a.mp4"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/e-video/text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "hello"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .expect(1)
            .mount(&server)
            .await;

        let browser = WebDriverBrowser::new(server.uri(), HttpTimeouts::default()).unwrap();
        let mut session = browser.open_session().await.unwrap();
        session.navigate("https://9gag.com/gag/a").await.unwrap();
        let video = session.find_element("video").await.unwrap().unwrap();
        assert_eq!(video, ElementHandle("e-video".into()));
        assert_eq!(
            session.attribute(&video, "src").await.unwrap().as_deref(),
            Some("https://img-9gag-fun.9cache.com/a.mp4")
        );
        assert_eq!(session.text(&video).await.unwrap(), "hello");
        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_no_such_element_is_none() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        mount_new_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {"error": "no such element", "message": "Unable to locate element"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
            .mount(&server)
            .await;

        let browser = WebDriverBrowser::new(server.uri(), HttpTimeouts::default()).unwrap();
        let mut session = browser.open_session().await.unwrap();
        assert_eq!(session.find_element("video").await.unwrap(), None);
        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_creation_failure_is_browser_error() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": {"error": "session not created", "message": "Chrome failed to start"}
            })))
            .mount(&server)
            .await;

        let browser = WebDriverBrowser::new(server.uri(), HttpTimeouts::default()).unwrap();
        let Err(err) = browser.open_session().await else {
            panic!("expected session creation to fail");
        };
        assert_eq!(err.code(), "browser_unavailable");
        assert!(err.to_string().contains("Chrome failed to start"));
    }
}
