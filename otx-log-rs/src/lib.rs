//! Flight telemetry log reader with KML export.
//!
//! This crate provides tools for:
//! - Reading CSV flight logs as named records, optionally projected to a
//!   subset of columns, with restartable passes over the file
//! - Converting records to KML coordinate and timestamp fragments
//! - Writing a KML document with the flight path and timed track
//!
//! # Example
//!
//! ```no_run
//! use otx_log::LogReader;
//!
//! let mut reader = LogReader::open("flight.csv").unwrap();
//! let coordinates = reader.kml_linestring_coordinates().unwrap();
//! let last = reader.last_record().unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod kml;

pub use crate::config::{ExportConfig, KmlStyleConfig};
pub use crate::core::reader::{LogReader, Record};
pub use crate::core::source::LoaderError;
pub use crate::kml::{ConvertError, KmlError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
