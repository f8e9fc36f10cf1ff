//! KML document writer.
//!
//! The document is assembled in memory from a [`FlightTrack`] and written in
//! one go. It contains:
//! - A `LineString` placemark with the full coordinate list
//! - A `gx:Track` placemark pairing each timestamp with its track point

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use quick_xml::escape::escape;
use thiserror::Error;

use super::reader::LogReader;
use crate::config::ExportConfig;
use crate::kml::{self, ConvertError};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// KML fragments collected from one log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightTrack {
    /// Space-joined `lon,lat,alt` triples.
    pub coordinates: String,
    /// `<when>` timestamps, one per record. Empty when the track is skipped.
    pub when: Vec<String>,
    /// `lon lat 0` points, one per record. Empty when the track is skipped.
    pub points: Vec<String>,
}

impl FlightTrack {
    /// Collect the path, and optionally the timed track, from every record.
    ///
    /// Each fragment list is built from its own pass over the reader.
    pub fn from_reader(
        reader: &mut LogReader,
        with_track: bool,
    ) -> std::result::Result<Self, ConvertError> {
        let coordinates = reader.kml_linestring_coordinates()?;
        let (when, points) = if with_track {
            (
                kml::track_timestamps(reader.records()?)?,
                reader.kml_track_coords()?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        debug!(
            "Collected {} track points from {}",
            points.len(),
            reader.path().display()
        );

        Ok(Self {
            coordinates,
            when,
            points,
        })
    }

    /// Number of timed track points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Render a complete KML document.
///
/// `name` is used as the `<Document>` name unless the config sets one. The
/// `gx:Track` placemark is only written when the track has points.
pub fn render_kml(track: &FlightTrack, name: &str, config: &ExportConfig) -> String {
    let style = &config.style;
    let document_name = config.document_name.as_deref().unwrap_or(name);
    let mut out = String::with_capacity(1024 + track.coordinates.len() + track.points.len() * 64);

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\" xmlns:gx=\"http://www.google.com/kml/ext/2.2\">\n");
    out.push_str("<Document>\n");
    out.push_str(&format!("  <name>{}</name>\n", escape(document_name)));
    out.push_str("  <Style id=\"flight\">\n");
    out.push_str("    <LineStyle>\n");
    out.push_str(&format!("      <color>{}</color>\n", escape(style.line_color.as_str())));
    out.push_str(&format!("      <width>{}</width>\n", style.line_width));
    out.push_str("    </LineStyle>\n");
    out.push_str("  </Style>\n");

    out.push_str("  <Placemark>\n");
    out.push_str(&format!("    <name>{}</name>\n", escape(config.path_name.as_str())));
    out.push_str("    <styleUrl>#flight</styleUrl>\n");
    out.push_str("    <LineString>\n");
    out.push_str(&format!("      <extrude>{}</extrude>\n", u8::from(style.extrude)));
    out.push_str(&format!("      <tessellate>{}</tessellate>\n", u8::from(style.tessellate)));
    out.push_str(&format!(
        "      <altitudeMode>{}</altitudeMode>\n",
        escape(style.altitude_mode.as_str())
    ));
    out.push_str(&format!(
        "      <coordinates>{}</coordinates>\n",
        escape(track.coordinates.as_str())
    ));
    out.push_str("    </LineString>\n");
    out.push_str("  </Placemark>\n");

    if config.include_track && !track.is_empty() {
        out.push_str("  <Placemark>\n");
        out.push_str(&format!("    <name>{}</name>\n", escape(config.track_name.as_str())));
        out.push_str("    <styleUrl>#flight</styleUrl>\n");
        out.push_str("    <gx:Track>\n");
        for when in &track.when {
            out.push_str(&format!("      <when>{}</when>\n", escape(when.as_str())));
        }
        for point in &track.points {
            out.push_str(&format!("      <gx:coord>{}</gx:coord>\n", escape(point.as_str())));
        }
        out.push_str("    </gx:Track>\n");
        out.push_str("  </Placemark>\n");
    }

    out.push_str("</Document>\n");
    out.push_str("</kml>\n");
    out
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write a KML document for `track` to `path`.
///
/// # Arguments
///
/// * `path` - Output file path (parent directories will be created if needed)
/// * `track` - Fragments collected from the log
/// * `name` - Fallback document name
/// * `config` - Export configuration
///
/// # Errors
///
/// Returns an error if:
/// - Parent directories cannot be created
/// - File cannot be created or written to
///
/// # Example
///
/// ```no_run
/// use otx_log::config::ExportConfig;
/// use otx_log::core::writers::{write_kml, FlightTrack};
/// use otx_log::LogReader;
/// use std::path::Path;
///
/// let mut reader = LogReader::open("flight.csv").unwrap();
/// let track = FlightTrack::from_reader(&mut reader, true).unwrap();
/// write_kml(Path::new("flight.kml"), &track, "flight", &ExportConfig::default()).unwrap();
/// ```
pub fn write_kml(path: &Path, track: &FlightTrack, name: &str, config: &ExportConfig) -> Result<()> {
    ensure_parent_dirs(path)?;

    let path_str = path.display().to_string();
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path_str.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    writer
        .write_all(render_kml(track, name, config).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| WriteError::WriteFile {
            path: path_str,
            source: e,
        })?;

    Ok(())
}
