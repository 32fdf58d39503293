use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};

pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/120.0",
];

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream returned {status} for {url}")]
    Status { url: String, status: StatusCode },
}

/// Retrieves the raw HTML of a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub proxy_credentials: Option<ProxyCredentials>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy: None,
            proxy_credentials: None,
        }
    }
}

/// Fetches pages with a single plain GET, posing as a desktop browser.
///
/// Certificate validation is disabled so the upstream certificate is accepted
/// as served.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: FetcherOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

        let mut builder = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(true);

        if let Some(proxy_url) = &options.proxy {
            let mut proxy = Proxy::all(proxy_url).map_err(FetchError::Client)?;
            if let Some(credentials) = &options.proxy_credentials {
                proxy = proxy.basic_auth(&credentials.username, &credentials.password);
            }
            log::info!("Routing upstream requests through proxy {}", proxy_url);
            builder = builder.proxy(proxy);
        } else {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        log::info!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Upstream returned {} for {}", status, url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus, Uri};
    use axum::routing::get;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        format!("http://{}", addr)
    }

    async fn echo_headers(headers: AxumHeaders) -> String {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        format!(
            "{}\n{}\n{}",
            header("user-agent"),
            header("accept"),
            header("accept-language")
        )
    }

    #[test]
    fn test_random_user_agent_is_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_new_with_proxy_credentials() {
        let options = FetcherOptions {
            proxy: Some("http://127.0.0.1:3128".into()),
            proxy_credentials: Some(ProxyCredentials {
                username: "scraper".into(),
                password: "secret".into(),
            }),
            ..Default::default()
        };

        assert!(HttpFetcher::new(options).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_browser_headers() {
        let base = serve(Router::new().route("/", get(echo_headers))).await;
        let fetcher = HttpFetcher::new(FetcherOptions::default()).expect("Failed to build fetcher");

        let body = fetcher.fetch(&format!("{}/", base)).await.expect("Fetch failed");
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(USER_AGENTS.contains(&lines[0]));
        assert_eq!(lines[1], ACCEPT_HTML);
        assert_eq!(lines[2], ACCEPT_LANGUAGE_EN);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let router = Router::new().route(
            "/results/{date}",
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "down for maintenance") }),
        );
        let base = serve(router).await;
        let fetcher = HttpFetcher::new(FetcherOptions::default()).expect("Failed to build fetcher");

        let url = format!("{}/results/2024-05-01", base);
        let err = fetcher.fetch(&url).await.expect_err("Expected status error");

        match err {
            FetchError::Status { url: failed, status } => {
                assert_eq!(failed, url);
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_request_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        drop(listener);

        let fetcher = HttpFetcher::new(FetcherOptions {
            timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .expect("Failed to build fetcher");

        let err = fetcher
            .fetch(&format!("http://{}/", addr))
            .await
            .expect_err("Expected connection error");
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_request_error() {
        let router = Router::new().route(
            "/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let base = serve(router).await;
        let fetcher = HttpFetcher::new(FetcherOptions {
            timeout: Duration::from_secs(1),
            ..Default::default()
        })
        .expect("Failed to build fetcher");

        let started = std::time::Instant::now();
        let err = fetcher
            .fetch(&format!("{}/", base))
            .await
            .expect_err("Expected timeout");

        assert!(matches!(err, FetchError::Request(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_fetch_through_proxy_sends_credentials() {
        let proxy = Router::new().fallback(|uri: Uri, headers: AxumHeaders| async move {
            let auth = headers
                .get("proxy-authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            format!("{}\n{}", uri, auth)
        });
        let proxy_url = serve(proxy).await;
        let fetcher = HttpFetcher::new(FetcherOptions {
            proxy: Some(proxy_url),
            proxy_credentials: Some(ProxyCredentials {
                username: "u".into(),
                password: "p".into(),
            }),
            ..Default::default()
        })
        .expect("Failed to build fetcher");

        let body = fetcher
            .fetch("http://ablefast.test/results/2024-05-01")
            .await
            .expect("Fetch through proxy failed");
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines, vec!["http://ablefast.test/results/2024-05-01", "Basic dTpw"]);
    }
}
