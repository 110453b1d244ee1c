use serde::Serialize;

use super::labels::{
    not_found, present, stop_time_schedule_relationship, trip_label, trip_schedule_relationship,
};
use crate::gtfs_rt::TripUpdate;
use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use crate::index::IndexStore;
use crate::model::StopTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopTimeUpdateStatus {
    pub stop_sequence: Option<u32>,
    pub stop_id: Option<String>,
    pub arrival_time: Option<i64>,
    pub arrival_delay: Option<i32>,
    pub departure_time: Option<i64>,
    pub departure_delay: Option<i32>,
    pub schedule_relationship: String,
    /// Timetable values from the matching static stop-time, when known.
    pub scheduled_arrival: Option<String>,
    pub scheduled_departure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripUpdateStatus {
    pub entity_id: String,
    pub trip_id: Option<String>,
    pub trip: String,
    pub trip_found: bool,
    pub route_id: Option<String>,
    pub direction_id: Option<u32>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub schedule_relationship: String,
    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,
    pub timestamp: Option<u64>,
    pub delay: Option<i32>,
    pub stop_time_updates: Vec<StopTimeUpdateStatus>,
}

// Match on stop sequence when the update has one, on stop id otherwise.
fn scheduled<'a>(stop_times: &'a [StopTime], update: &StopTimeUpdate) -> Option<&'a StopTime> {
    match (update.stop_sequence, present(update.stop_id.as_deref())) {
        (Some(seq), _) => stop_times
            .iter()
            .find(|st| i64::from(st.stop_sequence) == i64::from(seq)),
        (None, Some(stop_id)) => stop_times.iter().find(|st| st.stop_id == stop_id),
        (None, None) => None,
    }
}

fn event(e: Option<&StopTimeEvent>) -> (Option<i64>, Option<i32>) {
    e.map_or((None, None), |e| (e.time, e.delay))
}

/// Passes a trip update through, resolving the trip id for display only.
pub fn fuse_trip_update(entity_id: &str, tu: &TripUpdate, store: &IndexStore) -> TripUpdateStatus {
    let descriptor = &tu.trip;
    let trip_id = present(descriptor.trip_id.as_deref());
    let trip = trip_id.and_then(|id| store.trip(id));
    let stop_times = trip_id.and_then(|id| store.stop_times(id)).unwrap_or_default();

    let stop_time_updates = tu
        .stop_time_update
        .iter()
        .map(|u| {
            let (arrival_time, arrival_delay) = event(u.arrival.as_ref());
            let (departure_time, departure_delay) = event(u.departure.as_ref());
            let planned = scheduled(stop_times, u);
            StopTimeUpdateStatus {
                stop_sequence: u.stop_sequence,
                stop_id: u.stop_id.clone(),
                arrival_time,
                arrival_delay,
                departure_time,
                departure_delay,
                schedule_relationship: stop_time_schedule_relationship(u.schedule_relationship)
                    .to_string(),
                scheduled_arrival: planned.map(|st| st.arrival_time.clone()),
                scheduled_departure: planned.map(|st| st.departure_time.clone()),
            }
        })
        .collect();

    let vehicle = tu.vehicle.as_ref();

    TripUpdateStatus {
        entity_id: entity_id.to_string(),
        trip_id: trip_id.map(str::to_string),
        trip: trip.map_or_else(|| not_found("trip", trip_id), trip_label),
        trip_found: trip.is_some(),
        route_id: present(descriptor.route_id.as_deref())
            .map(str::to_string)
            .or_else(|| trip.map(|t| t.route_id.clone())),
        direction_id: descriptor.direction_id,
        start_date: descriptor.start_date.clone(),
        start_time: descriptor.start_time.clone(),
        schedule_relationship: trip_schedule_relationship(Some(descriptor)).to_string(),
        vehicle_id: vehicle.and_then(|v| v.id.clone()),
        vehicle_label: vehicle.and_then(|v| v.label.clone()),
        timestamp: tu.timestamp,
        delay: tu.delay,
        stop_time_updates,
    }
}
