use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::doc::parser::TocParser;
use crate::error::{Error, Result};

/// Anything that can hand back the raw TOC document stored at a URL.
#[async_trait]
pub trait TocSource: Send + Sync {
    async fn fetch_toc(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct TocFetcher {
    client: Client,
    timeout_duration: Duration,
    user_agent: String,
}

impl TocFetcher {
    pub fn new() -> Result<Self> {
        Self::with_settings(Duration::from_secs(30), default_user_agent())
    }

    pub fn with_settings(timeout_duration: Duration, user_agent: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout_duration)
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .map_err(|e| Error::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_duration,
            user_agent,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_duration
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn fetch_response(&self, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(format!("Request to {} timed out", url))
                } else {
                    Error::HttpError(format!("Request failed: {}", e))
                }
            })
    }
}

#[async_trait]
impl TocSource for TocFetcher {
    async fn fetch_toc(&self, url: &str) -> Result<String> {
        debug!("Fetching TOC from: {}", url);

        TocParser::new().validate_toc_url(url)?;

        let response = timeout(self.timeout_duration, self.fetch_response(url))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))??;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}: {}",
                response.status().as_u16(),
                url,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

pub fn default_user_agent() -> String {
    format!("sfref/{}", env!("CARGO_PKG_VERSION"))
}
