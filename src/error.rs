use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::table::Table;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers that only care
/// about which family a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A table, snapshot or feed endpoint could not be read.
    Io,
    /// A table or snapshot was readable but structurally malformed.
    Parse,
    /// A feed body is not a valid GTFS-RT message.
    Decode,
    /// A requested id is absent from an index.
    LookupMiss,
    /// The indices have not been published yet.
    NotReady,
}

/// An error that can occur while loading static data or fetching a live feed.
#[derive(Error, Debug)]
pub enum Error {
    #[error("impossible to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("impossible to parse csv file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("impossible to decode snapshot '{}'", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to fetch GTFS-RT feed from {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid feed url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("GTFS-RT request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("bad response status from {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to parse GTFS-RT feed")]
    Decode(#[from] prost::DecodeError),
    #[error("the {table} id {id} is not known")]
    LookupMiss { table: Table, id: String },
    #[error("static indices are not ready")]
    NotReady,
    #[error("loading {table} did not complete: {message}")]
    TaskFailed { table: Table, message: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. }
            | Error::InvalidUrl { .. }
            | Error::Fetch { .. }
            | Error::Timeout { .. }
            | Error::Status { .. }
            | Error::TaskFailed { .. } => ErrorKind::Io,
            Error::Parse { .. } | Error::Snapshot { .. } => ErrorKind::Parse,
            Error::Decode(_) => ErrorKind::Decode,
            Error::LookupMiss { .. } => ErrorKind::LookupMiss,
            Error::NotReady => ErrorKind::NotReady,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn fetch(url: &str, timeout: Duration, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            Error::Fetch {
                url: url.to_string(),
                source,
            }
        }
    }
}
