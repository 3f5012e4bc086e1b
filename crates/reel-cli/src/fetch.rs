//! HTTP image prefetching.

use std::time::Duration;

use anyhow::{Context, Result};
use reel_core::preload::ImageFetcher;
use reqwest::Client;

/// Fetches story images over HTTP so they are warm in the connection pool
/// and any caching proxy before the viewer reaches them.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client })
  }
}

impl ImageFetcher for HttpFetcher {
  type Error = reqwest::Error;

  /// `GET <url>`; non-2xx statuses are errors.
  async fn fetch(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let resp = self.client.get(url).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
  }
}
