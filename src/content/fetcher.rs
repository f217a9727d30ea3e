//! Documentation page fetching.
//!
//! Retrieves raw HTML over HTTP(S), or from a saved file on disk.

use crate::config::FetchConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors raised while acquiring page HTML.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    #[error("Server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page returned no content")]
    Empty,
}

/// HTTP fetcher for documentation pages.
pub struct PageFetcher {
    client: reqwest::Client,
    timeout: u64,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout_seconds,
        })
    }

    /// Fetches the HTML body of `url`, following redirects.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        info!("Fetching {}", parsed);

        let response = self
            .client
            .get(parsed)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        timeout: self.timeout,
                    }
                } else {
                    FetchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        if html.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        debug!("Fetched {} bytes of HTML", html.len());
        Ok(html)
    }
}

/// Reads a saved HTML page from disk.
pub fn read_html_file(path: &Path) -> Result<String, FetchError> {
    if !path.exists() {
        return Err(FetchError::FileNotFound(path.to_path_buf()));
    }

    let html = std::fs::read_to_string(path)?;
    if html.trim().is_empty() {
        return Err(FetchError::Empty);
    }

    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_invalid_url() {
        let fetcher = PageFetcher::new(&FetchConfig::default()).unwrap();

        let result = tokio_test::block_on(fetcher.fetch("not-a-url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));

        let result = tokio_test::block_on(fetcher.fetch("file:///etc/hosts"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_read_html_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><body><p>Hi</p></body></html>").unwrap();

        assert!(read_html_file(&path).unwrap().contains("<p>Hi</p>"));

        std::fs::write(&path, "   \n").unwrap();
        assert!(matches!(read_html_file(&path), Err(FetchError::Empty)));
    }

    #[test]
    fn test_read_html_file_not_found() {
        let result = read_html_file(Path::new("/nonexistent/page.html"));
        assert!(matches!(result, Err(FetchError::FileNotFound(_))));
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::Timeout { timeout: 60 };
        assert!(err.to_string().contains("60"));

        let err = FetchError::Status {
            status: 404,
            url: "https://example.com".into(),
        };
        assert!(err.to_string().contains("404"));
    }
}
