//! Fetches a job-posting page on behalf of the browser, which cannot read
//! cross-origin HTML itself.

use std::time::Duration;

use reqwest::{header, Client, Url};
use thiserror::Error;
use tracing::debug;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("url is required")]
    MissingUrl,

    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Only HTTP/HTTPS URLs are supported")]
    UnsupportedScheme,

    #[error("Request timed out")]
    Timeout,

    #[error("Remote server returned {0}")]
    Status(u16),

    #[error("Fetch failed: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(err)
        }
    }
}

impl FetchError {
    /// Whether the caller sent a bad request, as opposed to the remote side failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FetchError::MissingUrl | FetchError::InvalidUrl | FetchError::UnsupportedScheme
        )
    }
}

/// Parses `raw` and accepts only http and https URLs.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::MissingUrl);
    }
    let url = Url::parse(raw).map_err(|_| FetchError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::UnsupportedScheme),
    }
}

#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn fetch_html(&self, raw_url: &str) -> Result<String, FetchError> {
        let url = validate_url(raw_url)?;
        debug!("Fetching {url}");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_rules() {
        assert!(matches!(validate_url(""), Err(FetchError::MissingUrl)));
        assert!(matches!(validate_url("not a url"), Err(FetchError::InvalidUrl)));
        assert!(matches!(
            validate_url("ftp://example.com/job.txt"),
            Err(FetchError::UnsupportedScheme)
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(FetchError::UnsupportedScheme)
        ));
        assert_eq!(
            validate_url(" https://jobs.example.com/123 ").unwrap().as_str(),
            "https://jobs.example.com/123"
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/jobs/42")
            .match_header("user-agent", USER_AGENT)
            .match_header("accept-language", "en-US,en;q=0.9")
            .with_status(200)
            .with_body("<html><h1>Rust Engineer</h1></html>")
            .create_async()
            .await;

        let html = PageFetcher::new(Client::new())
            .fetch_html(&format!("{}/jobs/42", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(html.contains("Rust Engineer"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_reported_with_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/gone").with_status(404).create_async().await;

        let err = PageFetcher::new(Client::new())
            .fetch_html(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Remote server returned 404");
        assert!(!err.is_client_error());
    }
}
