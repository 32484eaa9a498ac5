use crate::error::Result;
use crate::robots::{RobotsGate, RobotsPolicy};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; SiteGraphCrawler/1.0)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the HTML of a page. `None` means the page is unusable for any
/// reason (disallowed, failed, non-HTML); it is never a hard error.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

/// `PageFetcher` over HTTP, gated by a robots policy.
pub struct HttpFetcher {
    client: Client,
    robots: Box<dyn RobotsPolicy + Send + Sync>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            robots: Box::new(RobotsGate::disabled()),
        })
    }

    pub fn with_robots<R>(mut self, robots: R) -> Self
    where
        R: RobotsPolicy + Send + Sync + 'static,
    {
        self.robots = Box::new(robots);
        self
    }

    /// Load robots.txt for `origin` with this fetcher's client and enforce it.
    pub async fn load_robots(self, origin: &Url) -> Self {
        let gate = RobotsGate::load(&self.client, origin).await;
        self.with_robots(gate)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        if !self.robots.can_fetch(url) {
            debug!("Blocked by robots.txt: {}", url);
            return None;
        }

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!("Error fetching {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!("Skipping {} (status {})", url, status.as_u16());
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        if !content_type.contains("text/html") {
            debug!("Skipping non-HTML content: {} ({})", url, content_type);
            return None;
        }

        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                debug!("Error reading body of {}: {}", url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    async fn serve(mock_server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html><title>Page</title></html>", "text/html; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/page", mock_server.uri())).await;

        assert_eq!(body.as_deref(), Some("<html><title>Page</title></html>"));
    }

    #[tokio::test]
    async fn test_content_type_match_is_case_insensitive() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/upper",
            ResponseTemplate::new(200)
                .set_body_raw("<p>hi</p>", "TEXT/HTML"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        assert!(fetcher.fetch(&format!("{}/upper", mock_server.uri())).await.is_some());
    }

    #[tokio::test]
    async fn test_non_html_is_discarded() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/feed.json",
            ResponseTemplate::new(200)
                .set_body_raw("{}", "application/json"),
        )
        .await;
        serve(&mock_server, "/bare", ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec())).await;

        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch(&format!("{}/feed.json", mock_server.uri())).await, None);
        assert_eq!(fetcher.fetch(&format!("{}/bare", mock_server.uri())).await, None);
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/missing",
            ResponseTemplate::new(404)
                .set_body_raw("<h1>Not found</h1>", "text/html"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch(&format!("{}/missing", mock_server.uri())).await, None);
    }

    #[tokio::test]
    async fn test_redirects_are_followed() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/old",
            ResponseTemplate::new(301).insert_header("location", "/new"),
        )
        .await;
        serve(
            &mock_server,
            "/new",
            ResponseTemplate::new(200)
                .set_body_raw("moved", "text/html"),
        )
        .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/old", mock_server.uri())).await;
        assert_eq!(body.as_deref(), Some("moved"));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/slow",
            ResponseTemplate::new(200)
                .set_body_raw("late", "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(50)).unwrap();
        assert_eq!(fetcher.fetch(&format!("{}/slow", mock_server.uri())).await, None);
    }

    #[tokio::test]
    async fn test_robots_disallow_skips_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/private/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("secret", "text/html"),
            )
            .expect(0)
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()
            .unwrap()
            .with_robots(RobotsGate::from_body(b"User-agent: *\nDisallow: /private/\n"));

        assert_eq!(fetcher.fetch(&format!("{}/private/page", mock_server.uri())).await, None);
    }

    #[tokio::test]
    async fn test_load_robots_from_origin() {
        let mock_server = MockServer::start().await;
        serve(
            &mock_server,
            "/robots.txt",
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"),
        )
        .await;

        let origin = Url::parse(&mock_server.uri()).unwrap();
        let fetcher = HttpFetcher::new().unwrap().load_robots(&origin).await;

        assert_eq!(fetcher.fetch(&format!("{}/anything", mock_server.uri())).await, None);
    }
}
