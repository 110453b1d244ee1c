//! One-shot, bounded-timeout GTFS-RT feed fetching.

mod basic;
mod client;
mod endpoints;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use endpoints::{
    FeedEndpoints, FeedType, RTD_ALERTS, RTD_TRIP_UPDATES, RTD_VEHICLE_POSITIONS,
};

use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::parser::parse_live_feed;
use crate::realtime::LiveFeed;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// GETs `url` and reads the whole body. The timeout covers connecting,
/// waiting for the response and reading the body.
///
/// # Errors
///
/// [`Error::Timeout`] when `timeout` elapses, [`Error::Status`] on a
/// non-success status, [`Error::Fetch`] on any other transport failure.
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
    timeout: Duration,
) -> Result<Bytes> {
    let parsed = reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let mut req = reqwest::Request::new(reqwest::Method::GET, parsed);
    *req.timeout_mut() = Some(timeout);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| Error::fetch(url, timeout, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status,
        });
    }

    resp.bytes().await.map_err(|e| Error::fetch(url, timeout, e))
}

/// Fetches and decodes feeds by type.
#[derive(Clone)]
pub struct FeedClient<C = BasicClient> {
    http: C,
    endpoints: FeedEndpoints,
    timeout: Duration,
}

impl FeedClient<BasicClient> {
    pub fn basic(endpoints: FeedEndpoints, timeout: Duration) -> Self {
        Self::new(BasicClient::new(), endpoints, timeout)
    }
}

impl<C: HttpClient> FeedClient<C> {
    pub fn new(http: C, endpoints: FeedEndpoints, timeout: Duration) -> Self {
        Self {
            http,
            endpoints,
            timeout,
        }
    }

    pub fn endpoints(&self) -> &FeedEndpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the feed served for `feed_type` and decodes it. No retry.
    #[tracing::instrument(skip(self), fields(url = %self.endpoints.url(feed_type)))]
    pub async fn fetch(&self, feed_type: FeedType) -> Result<LiveFeed> {
        let url = self.endpoints.url(feed_type);

        let fetch_start = Instant::now();
        let bytes = fetch_bytes(&self.http, url, self.timeout).await?;
        let elapsed = fetch_start.elapsed();
        if elapsed > self.timeout / 2 {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Feed fetch was slow");
        }
        debug!(bytes = bytes.len(), "Feed bytes received, parsing");

        let feed = parse_live_feed(&bytes)?;
        debug!(entity_count = feed.entities.len(), "Feed parsed successfully");
        Ok(feed)
    }
}
