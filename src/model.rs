//! Typed static schedule entities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: String,
    pub direction_id: i32,
    pub block_id: String,
    pub shape_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub agency_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub route_desc: String,
    /// 3 for bus routes, 0 for everything else.
    pub route_type: i32,
    pub route_url: String,
    pub route_color: String,
    pub route_text_color: String,
}

impl Route {
    /// Long name, falling back to the short name and then the id.
    pub fn display_name(&self) -> &str {
        [&self.route_long_name, &self.route_short_name, &self.route_id]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// One point of a shape. A shape is the sequence of all points sharing a
/// `shape_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: i32,
    pub shape_dist_traveled: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: String,
    /// HH:MM:SS, hours may exceed 24 for service past midnight.
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: i32,
    pub pickup_type: i32,
    pub drop_off_type: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    pub stop_code: String,
    pub stop_name: String,
    pub stop_desc: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheelchair_boarding: Option<i32>,
}
