//! Vendor price feed access.
//!
//! A [`FeedSource`] returns the raw vendor document; an [`OfferClient`] turns a
//! provider's feed into offer records.

use dbcost_core::{Error, Offer, Result};
use std::time::Duration;

/// Source of a raw vendor pricing document.
pub trait FeedSource {
    /// Fetch the document body. Transport failures are [`Error::Fetch`].
    fn fetch(&self) -> Result<String>;
}

/// Fetches and extracts one provider's offers.
pub trait OfferClient {
    /// Fetch failures are recoverable; extraction failures are not.
    fn get_offers(&self) -> Result<Vec<Offer>>;
}

/// Blocking HTTP GET of a vendor billing endpoint.
pub struct HttpFeedSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpFeedSource {
    /// Create a source for `endpoint` with no request timeout. The offer index
    /// is large and a slow download must not be cut off. The API key, when
    /// given, is sent as the `key` query parameter.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Self::with_timeout(endpoint, api_key, None)
    }

    /// Create a source whose requests fail after `timeout`.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::fetch(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self) -> Result<String> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        tracing::debug!(endpoint = %self.endpoint, "Fetching price feed");
        let resp = request
            .send()
            .map_err(|e| Error::fetch(format!("GET {} failed: {}", self.endpoint, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::fetch(format!(
                "GET {} returned HTTP {}",
                self.endpoint,
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| Error::fetch(format!("reading {} failed: {}", self.endpoint, e)))?;
        tracing::debug!(endpoint = %self.endpoint, bytes = body.len(), "Price feed fetched");
        Ok(body)
    }
}
