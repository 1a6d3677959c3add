//! HTTP fetching of catalog documents.

use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::{PlanError, Result};

/// Fetches catalog documents over HTTP/HTTPS.
///
/// Every transport failure and non-success status becomes
/// [`PlanError::NetworkFailure`]; nothing is retried here.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dotplan/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// Fetch a document body as text.
    pub fn fetch(&self, url: &str) -> Result<String> {
        let network = |source| PlanError::NetworkFailure {
            url: url.to_string(),
            source,
        };

        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(network)
    }
}
