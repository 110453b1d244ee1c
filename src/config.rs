//! Runtime configuration read from the environment (and `.env`).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::bootstrap::IndexSource;
use crate::fetch::{
    DEFAULT_TIMEOUT, FeedEndpoints, RTD_ALERTS, RTD_TRIP_UPDATES, RTD_VEHICLE_POSITIONS,
};
use crate::snapshot::SnapshotSource;
use crate::table::TableSource;

pub const DEFAULT_STATIC_DIR: &str = "data/gtfs";
pub const DEFAULT_SNAPSHOT_DIR: &str = "data/snapshot";

/// Which artifacts the indices are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    Tables,
    Snapshot,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tables" => Ok(SourceKind::Tables),
            "snapshot" => Ok(SourceKind::Snapshot),
            other => Err(format!("unknown index source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub static_dir: PathBuf,
    pub snapshot_dir: PathBuf,
    pub source_kind: SourceKind,
    pub snapshot_gzip: bool,
    pub endpoints: FeedEndpoints,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            source_kind: SourceKind::Tables,
            snapshot_gzip: false,
            endpoints: FeedEndpoints::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset keys use the defaults;
    /// unparseable values are logged and replaced by the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let url = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());
        let timeout_secs: u64 = parsed("GTFS_RT_TIMEOUT_SECS", var("GTFS_RT_TIMEOUT_SECS"), 0);

        Self {
            static_dir: var("GTFS_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            snapshot_dir: var("GTFS_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR)),
            source_kind: parsed(
                "GTFS_INDEX_SOURCE",
                var("GTFS_INDEX_SOURCE"),
                SourceKind::Tables,
            ),
            snapshot_gzip: parsed("GTFS_SNAPSHOT_GZIP", var("GTFS_SNAPSHOT_GZIP"), false),
            endpoints: FeedEndpoints {
                alerts: url("GTFS_RT_ALERTS_URL", RTD_ALERTS),
                trip_updates: url("GTFS_RT_TRIP_UPDATES_URL", RTD_TRIP_UPDATES),
                vehicle_positions: url("GTFS_RT_VEHICLE_POSITIONS_URL", RTD_VEHICLE_POSITIONS),
            },
            timeout: match timeout_secs {
                0 => DEFAULT_TIMEOUT,
                secs => Duration::from_secs(secs),
            },
        }
    }

    pub fn index_source(&self) -> IndexSource {
        match self.source_kind {
            SourceKind::Tables => IndexSource::Tables(TableSource::new(&self.static_dir)),
            SourceKind::Snapshot => IndexSource::Snapshot(
                SnapshotSource::new(&self.snapshot_dir).with_gzip(self.snapshot_gzip),
            ),
        }
    }

    pub fn endpoints(&self) -> &FeedEndpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parsed<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return default;
    };
    match value.trim().parse() {
        Ok(v) => v,
        Err(e) => {
            warn!(key, value = %value, error = %e, "Invalid configuration value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config(&[]), AppConfig::default());
        assert_eq!(AppConfig::default().timeout(), Duration::from_secs(10));
        assert_eq!(AppConfig::default().endpoints().alerts, RTD_ALERTS);
    }

    #[test]
    fn test_values_are_read() {
        let cfg = config(&[
            ("GTFS_STATIC_DIR", "/srv/gtfs"),
            ("GTFS_INDEX_SOURCE", "snapshot"),
            ("GTFS_SNAPSHOT_GZIP", "true"),
            ("GTFS_RT_TIMEOUT_SECS", "3"),
            ("GTFS_RT_ALERTS_URL", "http://localhost:8080/alerts.pb"),
        ]);

        assert_eq!(cfg.static_dir, PathBuf::from("/srv/gtfs"));
        assert_eq!(cfg.source_kind, SourceKind::Snapshot);
        assert!(cfg.snapshot_gzip);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.endpoints.alerts, "http://localhost:8080/alerts.pb");
        assert_eq!(cfg.endpoints.trip_updates, RTD_TRIP_UPDATES);
        assert!(matches!(cfg.index_source(), IndexSource::Snapshot(_)));
    }

    #[test]
    fn test_snapshot_source_reads_configured_encoding() {
        let gzipped = config(&[
            ("GTFS_INDEX_SOURCE", "snapshot"),
            ("GTFS_SNAPSHOT_DIR", "/srv/snapshot"),
            ("GTFS_SNAPSHOT_GZIP", "true"),
        ]);
        let IndexSource::Snapshot(snapshot) = gzipped.index_source() else {
            panic!("expected a snapshot source");
        };
        assert!(snapshot.gzip());
        assert_eq!(
            snapshot.path(crate::table::Table::Trips),
            PathBuf::from("/srv/snapshot/trip_data.json.gz")
        );

        let plain = config(&[("GTFS_INDEX_SOURCE", "snapshot")]);
        let IndexSource::Snapshot(snapshot) = plain.index_source() else {
            panic!("expected a snapshot source");
        };
        assert!(!snapshot.gzip());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("GTFS_INDEX_SOURCE", "database"),
            ("GTFS_SNAPSHOT_GZIP", "sometimes"),
            ("GTFS_RT_TIMEOUT_SECS", "soon"),
        ]);

        assert_eq!(cfg.source_kind, SourceKind::Tables);
        assert!(!cfg.snapshot_gzip);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let cfg = config(&[("GTFS_RT_TIMEOUT_SECS", "0")]);
        assert_eq!(cfg.timeout, DEFAULT_TIMEOUT);
    }
}
