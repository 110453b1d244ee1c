//! Concurrent construction and atomic publication of the static indices.
//!
//! Each table loads on its own blocking task. The resulting indices are only
//! published, as one [`IndexStore`], once all five tasks have finished. A
//! table that fails to load keeps the index from the previous publication (or
//! an empty one on the first build) so a rebuild never shrinks what readers
//! can see.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::decode::{StaticEntity, decode_rows};
use crate::error::{Error, Result};
use crate::index::{Index, IndexStore};
use crate::model::{Route, Shape, Stop, StopTime, Trip};
use crate::snapshot::SnapshotSource;
use crate::table::{Table, TableSource, read_table};

/// Where the static entities come from.
#[derive(Debug, Clone)]
pub enum IndexSource {
    /// Decode the GTFS text tables on every build.
    Tables(TableSource),
    /// Load previously written snapshot artifacts.
    Snapshot(SnapshotSource),
}

impl IndexSource {
    pub fn load<T: StaticEntity>(&self) -> Result<Vec<T>> {
        match self {
            IndexSource::Tables(tables) => Ok(decode_rows(&read_table(tables, T::TABLE)?)),
            IndexSource::Snapshot(snapshot) => snapshot.read(),
        }
    }
}

/// Result of loading one table during a build.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    pub table: Table,
    /// Decoded records. Zero when the load failed.
    pub rows: usize,
    /// Distinct keys in the published index for this table.
    pub keys: usize,
    pub error: Option<String>,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub built_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub outcomes: Vec<LoadOutcome>,
}

impl ReadinessReport {
    /// True when every table loaded without error.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(LoadOutcome::is_ok)
    }

    pub fn outcome(&self, table: Table) -> Option<&LoadOutcome> {
        self.outcomes.iter().find(|o| o.table == table)
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }
}

enum Built {
    Trips(Index<Trip>),
    Routes(Index<Route>),
    Shapes(Index<Vec<Shape>>),
    StopTimes(Index<Vec<StopTime>>),
    Stops(Index<Stop>),
}

impl Built {
    fn keys(&self) -> usize {
        match self {
            Built::Trips(i) => i.len(),
            Built::Routes(i) => i.len(),
            Built::Shapes(i) => i.len(),
            Built::StopTimes(i) => i.len(),
            Built::Stops(i) => i.len(),
        }
    }

    fn install(self, store: &mut IndexStore) {
        match self {
            Built::Trips(i) => store.trips = Arc::new(i),
            Built::Routes(i) => store.routes = Arc::new(i),
            Built::Shapes(i) => store.shapes = Arc::new(i),
            Built::StopTimes(i) => store.stop_times = Arc::new(i),
            Built::Stops(i) => store.stops = Arc::new(i),
        }
    }
}

fn keys_in(store: &IndexStore, table: Table) -> usize {
    match table {
        Table::Trips => store.trips.len(),
        Table::Routes => store.routes.len(),
        Table::Shapes => store.shapes.len(),
        Table::StopTimes => store.stop_times.len(),
        Table::Stops => store.stops.len(),
    }
}

/// Loads and indexes one table. Returns the decoded row count with the index.
fn build_table(source: &IndexSource, table: Table) -> Result<(usize, Built)> {
    Ok(match table {
        Table::Trips => {
            let v = source.load::<Trip>()?;
            (v.len(), Built::Trips(Index::build(v)))
        }
        Table::Routes => {
            let v = source.load::<Route>()?;
            (v.len(), Built::Routes(Index::build(v)))
        }
        Table::Shapes => {
            let v = source.load::<Shape>()?;
            (v.len(), Built::Shapes(Index::build_grouped(v)))
        }
        Table::StopTimes => {
            let v = source.load::<StopTime>()?;
            (v.len(), Built::StopTimes(Index::build_grouped(v)))
        }
        Table::Stops => {
            let v = source.load::<Stop>()?;
            (v.len(), Built::Stops(Index::build(v)))
        }
    })
}

/// Owns the published [`IndexStore`] and rebuilds it on demand.
pub struct Bootstrap {
    source: IndexSource,
    current: RwLock<Option<Arc<IndexStore>>>,
    report: RwLock<Option<ReadinessReport>>,
}

impl Bootstrap {
    pub fn new(source: IndexSource) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            report: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    /// Builds all five indices concurrently and publishes them as one set.
    ///
    /// Never fails as a whole: per-table failures are logged and reported.
    #[tracing::instrument(skip(self))]
    pub async fn initialize_all(&self) -> ReadinessReport {
        let start = Instant::now();

        let tasks: Vec<_> = Table::ALL
            .into_iter()
            .map(|table| {
                let source = self.source.clone();
                let span = tracing::info_span!("load_table", table = %table);
                let handle = tokio::task::spawn_blocking(move || {
                    span.in_scope(|| build_table(&source, table))
                });
                (table, handle)
            })
            .collect();

        let previous = self.current().await;
        let mut next = previous.as_deref().cloned().unwrap_or_default();
        next.built_at = Utc::now();

        let mut outcomes = Vec::with_capacity(tasks.len());

        // Wait for all tasks to complete
        for (table, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskFailed {
                    table,
                    message: e.to_string(),
                }),
            };

            match result {
                Ok((rows, built)) => {
                    let keys = built.keys();
                    built.install(&mut next);
                    info!(table = %table, rows, keys, "Index built");
                    outcomes.push(LoadOutcome {
                        table,
                        rows,
                        keys,
                        error: None,
                    });
                }
                Err(e) => {
                    let keys = keys_in(&next, table);
                    if previous.is_some() {
                        warn!(
                            table = %table,
                            error = %e,
                            kept_keys = keys,
                            "Index load failed, keeping previous index"
                        );
                    } else {
                        error!(table = %table, error = %e, "Index load failed");
                    }
                    outcomes.push(LoadOutcome {
                        table,
                        rows: 0,
                        keys,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let report = ReadinessReport {
            built_at: next.built_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            outcomes,
        };

        *self.current.write().await = Some(Arc::new(next));
        *self.report.write().await = Some(report.clone());

        info!(
            elapsed_ms = report.elapsed_ms,
            complete = report.is_complete(),
            "Static indices published"
        );
        report
    }

    /// Rebuilds from the same source and swaps the new set in atomically.
    pub async fn rebuild(&self) -> ReadinessReport {
        self.initialize_all().await
    }

    pub async fn is_ready(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// The current published set, unaffected by later rebuilds.
    pub async fn current(&self) -> Option<Arc<IndexStore>> {
        self.current.read().await.clone()
    }

    /// Like [`Bootstrap::current`] but fails before the first publication.
    pub async fn snapshot(&self) -> Result<Arc<IndexStore>> {
        self.current().await.ok_or(Error::NotReady)
    }

    pub async fn last_report(&self) -> Option<ReadinessReport> {
        self.report.read().await.clone()
    }

    pub async fn trip(&self, trip_id: &str) -> Option<Trip> {
        self.current().await?.trip(trip_id).cloned()
    }

    pub async fn route(&self, route_id: &str) -> Option<Route> {
        self.current().await?.route(route_id).cloned()
    }

    pub async fn shape(&self, shape_id: &str) -> Option<Vec<Shape>> {
        self.current().await?.shape(shape_id).map(<[Shape]>::to_vec)
    }

    pub async fn stop_times(&self, trip_id: &str) -> Option<Vec<StopTime>> {
        self.current()
            .await?
            .stop_times(trip_id)
            .map(<[StopTime]>::to_vec)
    }

    pub async fn stop(&self, stop_id: &str) -> Option<Stop> {
        self.current().await?.stop(stop_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn fixtures() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gtfs")
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn copy_fixtures(name: &str) -> PathBuf {
        let dir = temp_dir(name);
        fs::create_dir_all(&dir).unwrap();
        for table in Table::ALL {
            fs::copy(fixtures().join(table.file_name()), dir.join(table.file_name())).unwrap();
        }
        dir
    }

    fn tables(dir: &Path) -> IndexSource {
        IndexSource::Tables(TableSource::new(dir))
    }

    #[tokio::test]
    async fn test_not_ready_before_initialize() {
        let bootstrap = Bootstrap::new(tables(&fixtures()));
        assert!(!bootstrap.is_ready().await);
        assert!(bootstrap.current().await.is_none());
        assert!(bootstrap.trip("t1").await.is_none());
        assert!(matches!(bootstrap.snapshot().await, Err(Error::NotReady)));
    }

    #[tokio::test]
    async fn test_initialize_all_publishes_every_index() {
        let bootstrap = Bootstrap::new(tables(&fixtures()));
        let report = bootstrap.initialize_all().await;

        assert!(report.is_complete());
        assert_eq!(report.outcomes.len(), 5);
        assert!(bootstrap.is_ready().await);

        assert_eq!(bootstrap.trip("t1").await.unwrap().block_id, "b1");
        assert_eq!(bootstrap.route("15").await.unwrap().route_type, 3);
        assert_eq!(bootstrap.shape("s1").await.unwrap().len(), 3);
        assert_eq!(bootstrap.stop_times("t1").await.unwrap().len(), 3);
        assert_eq!(
            bootstrap.stop("s100").await.unwrap().stop_name,
            "Colfax & Broadway"
        );

        let shapes = report.outcome(Table::Shapes).unwrap();
        assert_eq!(shapes.rows, 5);
        assert_eq!(shapes.keys, 2);
    }

    #[tokio::test]
    async fn test_concurrent_and_sequential_builds_match() {
        let source = tables(&fixtures());
        let bootstrap = Bootstrap::new(source.clone());
        bootstrap.initialize_all().await;
        let concurrent = bootstrap.current().await.unwrap();

        let mut sequential = IndexStore::default();
        for table in Table::ALL {
            let (_, built) = build_table(&source, table).unwrap();
            built.install(&mut sequential);
        }

        assert_eq!(concurrent.trips, sequential.trips);
        assert_eq!(concurrent.routes, sequential.routes);
        assert_eq!(concurrent.shapes, sequential.shapes);
        assert_eq!(concurrent.stop_times, sequential.stop_times);
        assert_eq!(concurrent.stops, sequential.stops);
    }

    #[tokio::test]
    async fn test_failed_table_does_not_block_others() {
        let dir = copy_fixtures("gtfs_fusion_bootstrap_missing_stops");
        fs::remove_file(dir.join("stops.txt")).unwrap();

        let bootstrap = Bootstrap::new(tables(&dir));
        let report = bootstrap.initialize_all().await;

        assert!(!report.is_complete());
        let failed: Vec<_> = report.failures().map(|o| o.table).collect();
        assert_eq!(failed, vec![Table::Stops]);
        assert!(bootstrap.is_ready().await);
        assert!(bootstrap.trip("t1").await.is_some());
        assert!(bootstrap.stop("s100").await.is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent_and_never_shrinks() {
        let dir = copy_fixtures("gtfs_fusion_bootstrap_rebuild");
        let bootstrap = Bootstrap::new(tables(&dir));
        bootstrap.initialize_all().await;
        let first = bootstrap.current().await.unwrap();

        bootstrap.rebuild().await;
        let second = bootstrap.current().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.trips, second.trips);
        assert_eq!(first.stop_times, second.stop_times);

        // A table that disappears keeps its previously published index.
        fs::remove_file(dir.join("routes.txt")).unwrap();
        let report = bootstrap.rebuild().await;
        let third = bootstrap.current().await.unwrap();

        let routes = report.outcome(Table::Routes).unwrap();
        assert!(!routes.is_ok());
        assert_eq!(routes.keys, first.routes.len());
        assert_eq!(third.routes, first.routes);

        // Readers holding the earlier snapshot are unaffected.
        assert_eq!(first.route("15").unwrap().route_long_name, "East Colfax");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_source_matches_tables() {
        let out = temp_dir("gtfs_fusion_bootstrap_snapshot");
        let snapshot = SnapshotSource::new(&out);
        crate::snapshot::write_all(&TableSource::new(fixtures()), &snapshot).unwrap();

        let from_tables = Bootstrap::new(tables(&fixtures()));
        from_tables.initialize_all().await;
        let from_snapshot = Bootstrap::new(IndexSource::Snapshot(snapshot));
        let report = from_snapshot.initialize_all().await;
        assert!(report.is_complete());

        let a = from_tables.current().await.unwrap();
        let b = from_snapshot.current().await.unwrap();
        assert_eq!(a.trips, b.trips);
        assert_eq!(a.stops, b.stops);
        assert_eq!(a.shapes, b.shapes);

        fs::remove_dir_all(&out).unwrap();
    }

    #[tokio::test]
    async fn test_gzip_snapshot_ignores_stale_plain_artifacts() {
        let out = temp_dir("gtfs_fusion_bootstrap_snapshot_gzip");
        let gzipped = SnapshotSource::new(&out).with_gzip(true);
        crate::snapshot::write_all(&TableSource::new(fixtures()), &gzipped).unwrap();
        SnapshotSource::new(&out).write::<Trip>(&[]).unwrap();

        let bootstrap = Bootstrap::new(IndexSource::Snapshot(gzipped));
        let report = bootstrap.initialize_all().await;
        assert!(report.is_complete());
        assert!(bootstrap.trip("t1").await.is_some());

        fs::remove_dir_all(&out).unwrap();
    }
}
