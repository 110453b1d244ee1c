//! JSON array-of-records artifacts of decoded static entities.
//!
//! One file per table (`trip_data.json`, `route_data.json`, ...), optionally
//! gzip compressed as `<name>.gz`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::info;

use crate::decode::{StaticEntity, decode_rows};
use crate::error::{Error, Result};
use crate::model::{Route, Shape, Stop, StopTime, Trip};
use crate::table::{Table, TableSource, read_table};

/// A directory of snapshot artifacts in one encoding.
///
/// Reads and writes touch only the file for the configured encoding, so a
/// leftover artifact in the other encoding is never picked up.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    dir: PathBuf,
    gzip: bool,
}

impl SnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            gzip: false,
        }
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn gzip(&self) -> bool {
        self.gzip
    }

    pub fn path(&self, table: Table) -> PathBuf {
        let path = self.dir.join(table.snapshot_name());
        if self.gzip {
            path.with_extension("json.gz")
        } else {
            path
        }
    }

    /// Reads one table's artifact.
    pub fn read<T: StaticEntity>(&self) -> Result<Vec<T>> {
        let path = self.path(T::TABLE);
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let reader: Box<dyn Read> = if self.gzip {
            Box::new(GzDecoder::new(BufReader::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        serde_json::from_reader(reader).map_err(|source| Error::Snapshot { path, source })
    }

    /// Writes one table's artifact, returning the path written.
    pub fn write<T: StaticEntity>(&self, entities: &[T]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.path(T::TABLE);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;

        let to_snapshot_err = |source| Error::Snapshot {
            path: path.clone(),
            source,
        };
        if self.gzip {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, entities).map_err(to_snapshot_err)?;
            encoder
                .finish()
                .and_then(|mut w| w.flush())
                .map_err(|e| Error::io(&path, e))?;
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entities).map_err(to_snapshot_err)?;
            writer.flush().map_err(|e| Error::io(&path, e))?;
        }

        info!(
            table = %T::TABLE,
            path = %path.display(),
            records = entities.len(),
            "Snapshot written"
        );
        Ok(path)
    }
}

/// Decodes every table in `tables` and writes its artifact into `snapshot`.
///
/// Stops at the first table that cannot be read.
pub fn write_all(tables: &TableSource, snapshot: &SnapshotSource) -> Result<Vec<PathBuf>> {
    Ok(vec![
        export::<Trip>(tables, snapshot)?,
        export::<Route>(tables, snapshot)?,
        export::<Shape>(tables, snapshot)?,
        export::<StopTime>(tables, snapshot)?,
        export::<Stop>(tables, snapshot)?,
    ])
}

fn export<T: StaticEntity>(tables: &TableSource, snapshot: &SnapshotSource) -> Result<PathBuf> {
    let rows = read_table(tables, T::TABLE)?;
    let entities: Vec<T> = decode_rows(&rows);
    snapshot.write(&entities)
}
