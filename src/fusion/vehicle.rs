use chrono::{DateTime, Utc};
use serde::Serialize;

use super::labels::{
    current_status_label, not_found, occupancy_status, present, trip_label,
    trip_schedule_relationship,
};
use crate::gtfs_rt::VehiclePosition;
use crate::index::IndexStore;

/// A vehicle position joined against the static indices.
///
/// Every reference carries a display string and a `*_found` flag. When the
/// flag is false the display string is a "not found" marker naming the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleStatus {
    pub entity_id: String,

    pub trip_id: Option<String>,
    pub trip: String,
    pub trip_found: bool,

    pub route_id: Option<String>,
    pub route: String,
    pub route_found: bool,
    pub route_color: Option<String>,

    pub direction_id: Option<u32>,
    pub schedule_relationship: String,

    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,

    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    pub bearing: Option<f32>,
    pub speed: Option<f32>,

    pub stop_id: Option<String>,
    pub stop: String,
    pub stop_found: bool,
    pub current_stop_sequence: Option<u32>,
    pub current_status: String,

    pub timestamp: Option<u64>,
    pub observed_at: Option<DateTime<Utc>>,
    pub occupancy_status: Option<String>,
}

/// Joins one vehicle position to `store`. Each reference resolves on its own:
/// a trip miss still reports the route and stop.
pub fn fuse_vehicle(entity_id: &str, vp: &VehiclePosition, store: &IndexStore) -> VehicleStatus {
    let descriptor = vp.trip.as_ref();

    let trip_id = present(descriptor.and_then(|t| t.trip_id.as_deref()));
    let trip = trip_id.and_then(|id| store.trip(id));

    // The descriptor's route wins; a resolved trip fills it in otherwise.
    let route_id = present(descriptor.and_then(|t| t.route_id.as_deref()))
        .or_else(|| present(trip.map(|t| t.route_id.as_str())));
    let route = route_id.and_then(|id| store.route(id));

    let stop_id = present(vp.stop_id.as_deref());
    let stop = stop_id.and_then(|id| store.stop(id));

    let vehicle = vp.vehicle.as_ref();
    let position = vp.position.as_ref();

    VehicleStatus {
        entity_id: entity_id.to_string(),

        trip_id: trip_id.map(str::to_string),
        trip: trip.map_or_else(|| not_found("trip", trip_id), trip_label),
        trip_found: trip.is_some(),

        route_id: route_id.map(str::to_string),
        route: route.map_or_else(
            || not_found("route", route_id),
            |r| r.display_name().to_string(),
        ),
        route_found: route.is_some(),
        route_color: route
            .map(|r| r.route_color.clone())
            .filter(|c| !c.is_empty()),

        direction_id: descriptor
            .and_then(|t| t.direction_id)
            .or_else(|| trip.and_then(|t| u32::try_from(t.direction_id).ok())),
        schedule_relationship: trip_schedule_relationship(descriptor).to_string(),

        vehicle_id: vehicle.and_then(|v| v.id.clone()),
        vehicle_label: vehicle.and_then(|v| v.label.clone()),

        latitude: position.map(|p| p.latitude),
        longitude: position.map(|p| p.longitude),
        bearing: position.and_then(|p| p.bearing),
        speed: position.and_then(|p| p.speed),

        stop_id: stop_id.map(str::to_string),
        stop: stop.map_or_else(|| not_found("stop", stop_id), |s| s.stop_name.clone()),
        stop_found: stop.is_some(),
        current_stop_sequence: vp.current_stop_sequence,
        current_status: current_status_label(vp.current_status).to_string(),

        timestamp: vp.timestamp,
        observed_at: vp
            .timestamp
            .and_then(|ts| i64::try_from(ts).ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        occupancy_status: occupancy_status(vp.occupancy_status).map(str::to_string),
    }
}
