//! Core log reading and KML output.

pub mod reader;
pub mod source;
pub mod writers;

pub use reader::{LogReader, Projection, Record, Records};
pub use source::{LoaderError, LogSource};
pub use writers::{render_kml, write_kml, FlightTrack, WriteError};
