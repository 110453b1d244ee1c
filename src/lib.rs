pub mod bootstrap;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod fusion;
pub mod index;
pub mod model;
pub mod output;
pub mod parser;
pub mod realtime;
pub mod snapshot;
pub mod stats;
pub mod table;

pub use error::{Error, ErrorKind, Result};

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
