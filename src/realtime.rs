//! Decoded live feed as an ordered list of tagged entities.

use tracing::debug;

use crate::gtfs_rt::{Alert, FeedMessage, TripUpdate, VehiclePosition};

/// Exactly one GTFS-RT payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Vehicle(VehiclePosition),
    TripUpdate(TripUpdate),
    Alert(Alert),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveEntity {
    pub id: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveFeed {
    pub gtfs_realtime_version: String,
    pub timestamp: Option<u64>,
    pub entities: Vec<LiveEntity>,
}

impl LiveFeed {
    /// Splits each protobuf entity into one tagged entity per payload it
    /// carries, in the order vehicle, trip update, alert. Deleted entities and
    /// entities without a payload are dropped.
    pub fn from_message(message: FeedMessage) -> Self {
        let mut entities = Vec::with_capacity(message.entity.len());
        let mut dropped = 0usize;

        for e in message.entity {
            if e.is_deleted() {
                dropped += 1;
                continue;
            }

            let before = entities.len();
            if let Some(v) = e.vehicle {
                entities.push(LiveEntity {
                    id: e.id.clone(),
                    payload: Payload::Vehicle(v),
                });
            }
            if let Some(t) = e.trip_update {
                entities.push(LiveEntity {
                    id: e.id.clone(),
                    payload: Payload::TripUpdate(t),
                });
            }
            if let Some(a) = e.alert {
                entities.push(LiveEntity {
                    id: e.id.clone(),
                    payload: Payload::Alert(a),
                });
            }
            if entities.len() == before {
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(dropped, "Feed entities without a usable payload dropped");
        }

        Self {
            gtfs_realtime_version: message.header.gtfs_realtime_version,
            timestamp: message.header.timestamp,
            entities,
        }
    }

    pub fn vehicles(&self) -> impl Iterator<Item = (&str, &VehiclePosition)> {
        self.entities.iter().filter_map(|e| match &e.payload {
            Payload::Vehicle(v) => Some((e.id.as_str(), v)),
            _ => None,
        })
    }

    pub fn trip_updates(&self) -> impl Iterator<Item = (&str, &TripUpdate)> {
        self.entities.iter().filter_map(|e| match &e.payload {
            Payload::TripUpdate(t) => Some((e.id.as_str(), t)),
            _ => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = (&str, &Alert)> {
        self.entities.iter().filter_map(|e| match &e.payload {
            Payload::Alert(a) => Some((e.id.as_str(), a)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{FeedEntity, FeedHeader};

    fn header() -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1700000000),
            incrementality: None,
            feed_version: None,
        }
    }

    #[test]
    fn test_entities_are_tagged_in_order() {
        let message = FeedMessage {
            header: header(),
            entity: vec![
                FeedEntity {
                    id: "a1".to_string(),
                    alert: Some(Alert::default()),
                    ..Default::default()
                },
                FeedEntity {
                    id: "v1".to_string(),
                    vehicle: Some(VehiclePosition::default()),
                    ..Default::default()
                },
            ],
        };

        let feed = LiveFeed::from_message(message);
        assert_eq!(feed.entities.len(), 2);
        assert!(matches!(feed.entities[0].payload, Payload::Alert(_)));
        assert!(matches!(feed.entities[1].payload, Payload::Vehicle(_)));
        assert_eq!(feed.vehicles().count(), 1);
        assert_eq!(feed.alerts().count(), 1);
        assert_eq!(feed.trip_updates().count(), 0);
    }

    #[test]
    fn test_multi_payload_entity_is_split() {
        let message = FeedMessage {
            header: header(),
            entity: vec![FeedEntity {
                id: "x".to_string(),
                vehicle: Some(VehiclePosition::default()),
                trip_update: Some(TripUpdate::default()),
                ..Default::default()
            }],
        };

        let feed = LiveFeed::from_message(message);
        assert_eq!(feed.entities.len(), 2);
        assert!(matches!(feed.entities[0].payload, Payload::Vehicle(_)));
        assert!(matches!(feed.entities[1].payload, Payload::TripUpdate(_)));
        assert!(feed.entities.iter().all(|e| e.id == "x"));
    }

    #[test]
    fn test_deleted_and_empty_entities_are_dropped() {
        let message = FeedMessage {
            header: header(),
            entity: vec![
                FeedEntity {
                    id: "gone".to_string(),
                    is_deleted: Some(true),
                    vehicle: Some(VehiclePosition::default()),
                    ..Default::default()
                },
                FeedEntity {
                    id: "empty".to_string(),
                    ..Default::default()
                },
            ],
        };

        let feed = LiveFeed::from_message(message);
        assert!(feed.entities.is_empty());
        assert_eq!(feed.timestamp, Some(1700000000));
    }
}
