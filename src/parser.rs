//! Protobuf parser for GTFS Realtime feeds.

use prost::Message;

use crate::error::Result;
use crate::gtfs_rt::FeedMessage;
use crate::realtime::LiveFeed;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`crate::Error::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Decodes a feed body straight into tagged entities.
pub fn parse_live_feed(bytes: &[u8]) -> Result<LiveFeed> {
    parse_feed(bytes).map(LiveFeed::from_message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, VehiclePosition};

    #[test]
    fn test_parse_empty_bytes_returns_default_feed() {
        // An empty byte array decodes to a FeedMessage with default values
        let feed = parse_feed(&[]).unwrap();
        assert_eq!(feed.header.gtfs_realtime_version, "");
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let err = parse_feed(&invalid_bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_parse_valid_minimal_feed() {
        let feed = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                timestamp: Some(1234567890),
                incrementality: None,
                feed_version: None,
            },
            entity: vec![FeedEntity {
                id: "v1".to_string(),
                vehicle: Some(VehiclePosition::default()),
                ..Default::default()
            }],
        };
        let encoded = feed.encode_to_vec();

        let live = parse_live_feed(&encoded).unwrap();
        assert_eq!(live.gtfs_realtime_version, "2.0");
        assert_eq!(live.timestamp, Some(1234567890));
        assert_eq!(live.entities.len(), 1);
        assert_eq!(live.entities[0].id, "v1");
    }
}
