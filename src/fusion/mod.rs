//! Joins live feed entities against the published static indices.
//!
//! Fusion never fails on a missing reference. Unresolved trips, routes and
//! stops are reported in-band with a marker string and a `*_found` flag.

mod alert;
mod labels;
mod trip_update;
mod vehicle;

pub use alert::{ActivePeriod, AlertStatus, InformedEntity, LocalizedText, fuse_alert};
pub use labels::{UNKNOWN, current_status_label, not_found};
pub use trip_update::{StopTimeUpdateStatus, TripUpdateStatus, fuse_trip_update};
pub use vehicle::{VehicleStatus, fuse_vehicle};

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::bootstrap::Bootstrap;
use crate::error::Result;
use crate::fetch::{BasicClient, FeedClient, FeedType, HttpClient};
use crate::index::IndexStore;
use crate::realtime::{LiveFeed, Payload};

/// One fused entity of any feed type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusRecord {
    Vehicle(VehicleStatus),
    TripUpdate(TripUpdateStatus),
    Alert(AlertStatus),
}

impl StatusRecord {
    pub fn entity_id(&self) -> &str {
        match self {
            StatusRecord::Vehicle(v) => &v.entity_id,
            StatusRecord::TripUpdate(t) => &t.entity_id,
            StatusRecord::Alert(a) => &a.entity_id,
        }
    }
}

/// Fuses every entity of `feed`, keeping feed order.
pub fn fuse_feed(feed: &LiveFeed, store: &IndexStore) -> Vec<StatusRecord> {
    feed.entities
        .iter()
        .map(|e| match &e.payload {
            Payload::Vehicle(v) => StatusRecord::Vehicle(fuse_vehicle(&e.id, v, store)),
            Payload::TripUpdate(t) => {
                StatusRecord::TripUpdate(fuse_trip_update(&e.id, t, store))
            }
            Payload::Alert(a) => StatusRecord::Alert(fuse_alert(&e.id, a)),
        })
        .collect()
}

/// Fetches live feeds and fuses them against the indices owned by a
/// [`Bootstrap`].
pub struct FusionEngine<C = BasicClient> {
    client: FeedClient<C>,
    bootstrap: Arc<Bootstrap>,
}

impl<C: HttpClient> FusionEngine<C> {
    pub fn new(client: FeedClient<C>, bootstrap: Arc<Bootstrap>) -> Self {
        Self { client, bootstrap }
    }

    pub fn client(&self) -> &FeedClient<C> {
        &self.client
    }

    pub fn bootstrap(&self) -> &Arc<Bootstrap> {
        &self.bootstrap
    }

    /// Fetches `feed_type` and fuses every entity against one index snapshot.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotReady`] before the first publication, otherwise any
    /// fetch or decode error of the request.
    #[tracing::instrument(skip(self))]
    pub async fn fuse(&self, feed_type: FeedType) -> Result<FusedFeed> {
        let (store, feed) = self.fetch_with_store(feed_type).await?;
        let records = fuse_feed(&feed, &store);
        debug!(records = records.len(), "Feed fused");
        Ok(FusedFeed {
            feed_type,
            feed_timestamp: feed.timestamp,
            records,
        })
    }

    pub async fn vehicle_positions(&self) -> Result<Vec<VehicleStatus>> {
        let (store, feed) = self.fetch_with_store(FeedType::VehiclePositions).await?;
        Ok(feed
            .vehicles()
            .map(|(id, v)| fuse_vehicle(id, v, &store))
            .collect())
    }

    pub async fn trip_updates(&self) -> Result<Vec<TripUpdateStatus>> {
        let (store, feed) = self.fetch_with_store(FeedType::TripUpdates).await?;
        Ok(feed
            .trip_updates()
            .map(|(id, t)| fuse_trip_update(id, t, &store))
            .collect())
    }

    pub async fn alerts(&self) -> Result<Vec<AlertStatus>> {
        let (_, feed) = self.fetch_with_store(FeedType::Alerts).await?;
        Ok(feed.alerts().map(|(id, a)| fuse_alert(id, a)).collect())
    }

    async fn fetch_with_store(
        &self,
        feed_type: FeedType,
    ) -> Result<(Arc<IndexStore>, LiveFeed)> {
        // No request goes out before the first publication.
        let store = self.bootstrap.snapshot().await?;
        let feed = self.client.fetch(feed_type).await?;
        Ok((store, feed))
    }
}

/// Result of fusing one feed request.
#[derive(Debug, Clone, Serialize)]
pub struct FusedFeed {
    pub feed_type: FeedType,
    pub feed_timestamp: Option<u64>,
    pub records: Vec<StatusRecord>,
}
