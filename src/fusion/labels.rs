//! Text rendering of GTFS-RT codes and unresolved references.

use crate::gtfs_rt::trip_update::stop_time_update;
use crate::gtfs_rt::{TripDescriptor, alert, trip_descriptor, vehicle_position};
use crate::model::Trip;

pub const UNKNOWN: &str = "UNKNOWN";

/// Label for a vehicle's current status code. Unknown or absent codes are
/// `"unknown"`.
pub fn current_status_label(code: Option<i32>) -> &'static str {
    match code {
        Some(0) => "incoming_at",
        Some(1) => "stopped_at",
        Some(2) => "in_transit_to",
        _ => "unknown",
    }
}

/// `UNKNOWN` without a descriptor; `SCHEDULED` when the descriptor omits the
/// field.
pub fn trip_schedule_relationship(trip: Option<&TripDescriptor>) -> &'static str {
    let Some(trip) = trip else {
        return UNKNOWN;
    };
    trip_descriptor::ScheduleRelationship::try_from(trip.schedule_relationship.unwrap_or(0))
        .map(|r| r.as_str_name())
        .unwrap_or(UNKNOWN)
}

pub fn stop_time_schedule_relationship(code: Option<i32>) -> &'static str {
    stop_time_update::ScheduleRelationship::try_from(code.unwrap_or(0))
        .map(|r| r.as_str_name())
        .unwrap_or(UNKNOWN)
}

pub fn occupancy_status(code: Option<i32>) -> Option<&'static str> {
    code.map(|c| {
        vehicle_position::OccupancyStatus::try_from(c)
            .map(|o| o.as_str_name())
            .unwrap_or(UNKNOWN)
    })
}

pub fn alert_cause(code: Option<i32>) -> &'static str {
    code.and_then(|c| alert::Cause::try_from(c).ok())
        .unwrap_or(alert::Cause::UnknownCause)
        .as_str_name()
}

pub fn alert_effect(code: Option<i32>) -> &'static str {
    code.and_then(|c| alert::Effect::try_from(c).ok())
        .unwrap_or(alert::Effect::UnknownEffect)
        .as_str_name()
}

/// Marker text for a reference that did not resolve.
pub fn not_found(kind: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("{kind} not found for {id}"),
        None => format!("{kind} not found (no {kind} id)"),
    }
}

/// Headsign, or the trip id when the headsign is blank.
pub fn trip_label(trip: &Trip) -> String {
    if trip.trip_headsign.is_empty() {
        trip.trip_id.clone()
    } else {
        trip.trip_headsign.clone()
    }
}

/// Treats an empty id the same as a missing one.
pub(crate) fn present(id: Option<&str>) -> Option<&str> {
    id.filter(|s| !s.is_empty())
}
