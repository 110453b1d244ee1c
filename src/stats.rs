use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fetch::FeedType;
use crate::fusion::{FusedFeed, StatusRecord};

/// One row of fusion statistics: how much of a feed joined to static data.
#[derive(Debug, Default, Serialize)]
pub struct FusionStats {
    pub timestamp: DateTime<Utc>,
    pub feed_type: Option<String>,
    pub feed_timestamp: Option<u64>,
    pub total_records: usize,

    // record types
    pub vehicles: usize,
    pub trip_updates: usize,
    pub alerts: usize,

    // static joins
    pub with_trip_id: usize,
    pub trips_resolved: usize,
    pub with_route_id: usize,
    pub routes_resolved: usize,
    pub with_stop_id: usize,
    pub stops_resolved: usize,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl FusionStats {
    pub fn from_records(records: &[StatusRecord]) -> Self {
        let mut s = FusionStats {
            timestamp: Utc::now(),
            total_records: records.len(),
            ..Default::default()
        };

        for r in records {
            match r {
                StatusRecord::Vehicle(v) => {
                    s.vehicles += 1;

                    if v.trip_id.is_some() {
                        s.with_trip_id += 1;
                    }
                    if v.trip_found {
                        s.trips_resolved += 1;
                    }

                    if v.route_id.is_some() {
                        s.with_route_id += 1;
                    }
                    if v.route_found {
                        s.routes_resolved += 1;
                    }

                    if v.stop_id.is_some() {
                        s.with_stop_id += 1;
                    }
                    if v.stop_found {
                        s.stops_resolved += 1;
                    }
                }
                StatusRecord::TripUpdate(t) => {
                    s.trip_updates += 1;

                    if t.trip_id.is_some() {
                        s.with_trip_id += 1;
                    }
                    if t.trip_found {
                        s.trips_resolved += 1;
                    }
                }
                StatusRecord::Alert(_) => s.alerts += 1,
            }
        }

        s
    }

    pub fn from_fused(fused: &FusedFeed) -> Self {
        Self::from_records(&fused.records).with_feed(fused.feed_type, fused.feed_timestamp)
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of records with a trip id whose trip is in the index.
    pub fn trip_match_pct(&self) -> f64 {
        Self::pct(self.trips_resolved, self.with_trip_id)
    }

    /// Create an error record with timestamp and error information
    pub fn from_error(error_type: &str, error_message: &str) -> Self {
        FusionStats {
            timestamp: Utc::now(),
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_feed(mut self, feed_type: FeedType, feed_timestamp: Option<u64>) -> Self {
        self.feed_type = Some(feed_type.to_string());
        self.feed_timestamp = feed_timestamp;
        self
    }
}
