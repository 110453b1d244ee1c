//! Key-unique lookup maps over decoded static entities.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::model::{Route, Shape, Stop, StopTime, Trip};

/// An entity with a natural id.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// An entity that is one element of an ordered group sharing a key.
pub trait Sequenced: Keyed {
    fn sequence(&self) -> i32;
}

impl Keyed for Trip {
    fn key(&self) -> &str {
        &self.trip_id
    }
}

impl Keyed for Route {
    fn key(&self) -> &str {
        &self.route_id
    }
}

impl Keyed for Stop {
    fn key(&self) -> &str {
        &self.stop_id
    }
}

impl Keyed for Shape {
    fn key(&self) -> &str {
        &self.shape_id
    }
}

impl Sequenced for Shape {
    fn sequence(&self) -> i32 {
        self.shape_pt_sequence
    }
}

impl Keyed for StopTime {
    fn key(&self) -> &str {
        &self.trip_id
    }
}

impl Sequenced for StopTime {
    fn sequence(&self) -> i32 {
        self.stop_sequence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index<T> {
    entries: HashMap<String, T>,
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: Keyed> Index<T> {
    /// Single pass insert keyed by natural id. A later entity with the same
    /// key replaces the earlier one.
    pub fn build(entities: impl IntoIterator<Item = T>) -> Self {
        let mut entries = HashMap::new();
        for entity in entities {
            entries.insert(entity.key().to_string(), entity);
        }
        Self { entries }
    }
}

impl<T: Sequenced> Index<Vec<T>> {
    /// Groups entities by key, each group ordered by sequence number. Rows with
    /// equal sequence numbers keep their input order.
    pub fn build_grouped(entities: impl IntoIterator<Item = T>) -> Self {
        let mut entries: HashMap<String, Vec<T>> = HashMap::new();
        for entity in entities {
            entries
                .entry(entity.key().to_string())
                .or_default()
                .push(entity);
        }
        for group in entries.values_mut() {
            group.sort_by_key(|e| e.sequence());
        }
        Self { entries }
    }
}

impl<T> Index<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The five published indices. Built as a whole and replaced as a whole.
#[derive(Debug, Clone)]
pub struct IndexStore {
    pub trips: Arc<Index<Trip>>,
    pub routes: Arc<Index<Route>>,
    pub shapes: Arc<Index<Vec<Shape>>>,
    /// Keyed by trip id, each trip's stop-times ordered by stop sequence.
    pub stop_times: Arc<Index<Vec<StopTime>>>,
    pub stops: Arc<Index<Stop>>,
    pub built_at: DateTime<Utc>,
}

impl Default for IndexStore {
    fn default() -> Self {
        Self {
            trips: Arc::default(),
            routes: Arc::default(),
            shapes: Arc::default(),
            stop_times: Arc::default(),
            stops: Arc::default(),
            built_at: Utc::now(),
        }
    }
}

impl IndexStore {
    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.get(trip_id)
    }

    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.routes.get(route_id)
    }

    pub fn shape(&self, shape_id: &str) -> Option<&[Shape]> {
        self.shapes.get(shape_id).map(Vec::as_slice)
    }

    pub fn stop_times(&self, trip_id: &str) -> Option<&[StopTime]> {
        self.stop_times.get(trip_id).map(Vec::as_slice)
    }

    pub fn stop(&self, stop_id: &str) -> Option<&Stop> {
        self.stops.get(stop_id)
    }

    pub fn route_for_trip(&self, trip_id: &str) -> Option<&Route> {
        self.trip(trip_id).and_then(|t| self.route(&t.route_id))
    }
}
