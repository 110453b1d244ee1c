use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const RTD_ALERTS: &str = "https://www.rtd-denver.com/files/gtfs-rt/Alerts.pb";
pub const RTD_TRIP_UPDATES: &str = "https://www.rtd-denver.com/files/gtfs-rt/TripUpdates.pb";
pub const RTD_VEHICLE_POSITIONS: &str =
    "https://www.rtd-denver.com/files/gtfs-rt/VehiclePositions.pb";

/// The three GTFS-RT feeds, each served from its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    Alerts,
    TripUpdates,
    VehiclePositions,
}

impl FeedType {
    pub const ALL: [FeedType; 3] = [
        FeedType::Alerts,
        FeedType::TripUpdates,
        FeedType::VehiclePositions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedType::Alerts => "alerts",
            FeedType::TripUpdates => "trip_updates",
            FeedType::VehiclePositions => "vehicle_positions",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alerts" => Ok(FeedType::Alerts),
            "trip-updates" | "trip_updates" => Ok(FeedType::TripUpdates),
            "vehicle-positions" | "vehicle_positions" => Ok(FeedType::VehiclePositions),
            other => Err(format!(
                "unknown feed '{other}', expected alerts, trip-updates or vehicle-positions"
            )),
        }
    }
}

/// Endpoint URL per feed type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEndpoints {
    pub alerts: String,
    pub trip_updates: String,
    pub vehicle_positions: String,
}

impl Default for FeedEndpoints {
    fn default() -> Self {
        Self {
            alerts: RTD_ALERTS.to_string(),
            trip_updates: RTD_TRIP_UPDATES.to_string(),
            vehicle_positions: RTD_VEHICLE_POSITIONS.to_string(),
        }
    }
}

impl FeedEndpoints {
    pub fn url(&self, feed_type: FeedType) -> &str {
        match feed_type {
            FeedType::Alerts => &self.alerts,
            FeedType::TripUpdates => &self.trip_updates,
            FeedType::VehiclePositions => &self.vehicle_positions,
        }
    }
}
