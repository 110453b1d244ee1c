//! Delimited text table reader for the GTFS static tables.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// One of the five static tables, doubling as the entity type it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Trips,
    Routes,
    Shapes,
    StopTimes,
    Stops,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Routes,
        Table::Shapes,
        Table::StopTimes,
        Table::Stops,
        Table::Trips,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Table::Trips => "trips.txt",
            Table::Routes => "routes.txt",
            Table::Shapes => "shapes.txt",
            Table::StopTimes => "stop_times.txt",
            Table::Stops => "stops.txt",
        }
    }

    /// File name of the JSON array-of-records artifact for this table.
    pub fn snapshot_name(self) -> &'static str {
        match self {
            Table::Trips => "trip_data.json",
            Table::Routes => "route_data.json",
            Table::Shapes => "shape_data.json",
            Table::StopTimes => "stop_time_data.json",
            Table::Stops => "stop_data.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Trips => "trips",
            Table::Routes => "routes",
            Table::Shapes => "shapes",
            Table::StopTimes => "stop_times",
            Table::Stops => "stops",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "trips" => Ok(Table::Trips),
            "routes" => Ok(Table::Routes),
            "shapes" => Ok(Table::Shapes),
            "stop_times" | "stop-times" => Ok(Table::StopTimes),
            "stops" => Ok(Table::Stops),
            other => Err(format!(
                "unknown table '{other}', expected one of trips, routes, shapes, stop_times, stops"
            )),
        }
    }
}

/// A directory holding the GTFS static text tables.
#[derive(Debug, Clone)]
pub struct TableSource {
    dir: PathBuf,
}

impl TableSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }
}

/// Reads every row of `table`, header included, with leading whitespace
/// trimmed from each field.
///
/// Callers skip row 0.
pub fn read_table(source: &TableSource, table: Table) -> Result<Vec<Vec<String>>> {
    let path = source.path(table);
    let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
    let rows = read_rows(file).map_err(|source| Error::Parse {
        path: path.clone(),
        source,
    })?;
    debug!(table = %table, path = %path.display(), rows = rows.len(), "Table read");
    Ok(rows)
}

/// Same as [`read_table`] over any reader. `table` only names the source in
/// errors.
pub fn read_records<R: Read>(reader: R, table: Table) -> Result<Vec<Vec<String>>> {
    read_rows(reader).map_err(|source| Error::Parse {
        path: PathBuf::from(table.file_name()),
        source,
    })
}

fn read_rows<R: Read>(reader: R) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|f| f.trim_start().to_string()).collect());
    }
    Ok(rows)
}
