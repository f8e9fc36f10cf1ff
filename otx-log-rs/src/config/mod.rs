//! Configuration types for KML export.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Styling applied to the exported path and track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmlStyleConfig {
    /// Line colour in KML `aabbggrr` hex order
    #[serde(default = "default_line_color")]
    pub line_color: String,

    /// Line width in pixels
    #[serde(default = "default_line_width")]
    pub line_width: f32,

    /// KML altitude mode for the path (`absolute`, `relativeToGround`, `clampToGround`)
    #[serde(default = "default_altitude_mode")]
    pub altitude_mode: String,

    /// Draw a wall from the path down to the ground
    #[serde(default)]
    pub extrude: bool,

    /// Let the path follow the terrain
    #[serde(default = "default_tessellate")]
    pub tessellate: bool,
}

fn default_line_color() -> String {
    "ff0000ff".to_string() // opaque red
}

fn default_line_width() -> f32 {
    3.0
}

fn default_altitude_mode() -> String {
    "absolute".to_string()
}

fn default_tessellate() -> bool {
    true
}

impl Default for KmlStyleConfig {
    fn default() -> Self {
        Self {
            line_color: default_line_color(),
            line_width: default_line_width(),
            altitude_mode: default_altitude_mode(),
            extrude: false,
            tessellate: default_tessellate(),
        }
    }
}

/// Top-level export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// `<Document>` name; the log file stem is used when unset
    #[serde(default)]
    pub document_name: Option<String>,

    /// Name of the LineString placemark
    #[serde(default = "default_path_name")]
    pub path_name: String,

    /// Name of the gx:Track placemark
    #[serde(default = "default_track_name")]
    pub track_name: String,

    /// Emit the gx:Track placemark
    #[serde(default = "default_include_track")]
    pub include_track: bool,

    #[serde(default)]
    pub style: KmlStyleConfig,
}

fn default_path_name() -> String {
    "Flight path".to_string()
}

fn default_track_name() -> String {
    "Flight track".to_string()
}

fn default_include_track() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            document_name: None,
            path_name: default_path_name(),
            track_name: default_track_name(),
            include_track: default_include_track(),
            style: KmlStyleConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ExportConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_export_config() {
        let config = ExportConfig::default();
        assert_eq!(config.document_name, None);
        assert!(config.include_track);
        assert_eq!(config.style.line_color, "ff0000ff");
        assert_eq!(config.style.altitude_mode, "absolute");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: ExportConfig = serde_yaml::from_str(
            "document_name: Morning flight\nstyle:\n  line_width: 5.0\n",
        )
        .unwrap();

        assert_eq!(config.document_name.as_deref(), Some("Morning flight"));
        assert_eq!(config.style.line_width, 5.0);
        assert_eq!(config.style.line_color, "ff0000ff");
        assert_eq!(config.path_name, "Flight path");
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.yaml");

        let mut config = ExportConfig::default();
        config.include_track = false;
        config.style.extrude = true;
        config.to_yaml(&path).unwrap();

        assert_eq!(ExportConfig::from_yaml(&path).unwrap(), config);
    }
}
