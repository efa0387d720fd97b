//! Calibration configuration read at startup

use crate::error::ConfigWarning;
use crate::scene::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Checkerboard used during camera calibration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkerboard {
    /// Inner corners along the board width
    pub width: i32,
    /// Inner corners along the board height
    pub height: i32,
    /// Side of one square, mm
    pub square_size: f32,
}

/// Geometry constants supplied by the calibration stage
///
/// ### Example
/// ```toml
/// [checkerboard]
/// width = 8
/// height = 6
/// square_size = 115.0
///
/// [[cameras]]
/// position = [-2500.0, 3000.0, 1800.0]
/// ```
/// Zero values mean "unconfigured".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub checkerboard: Checkerboard,
    pub cameras: Vec<CameraPlacement>,
}

/// World position of a calibrated camera
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPlacement {
    pub position: [f32; 3],
}

impl CalibrationConfig {
    /// Load from a TOML file
    ///
    /// A missing or unreadable file is not fatal: zeroed defaults are
    /// returned together with a warning, which is also logged.
    pub fn load<P: AsRef<Path>>(path: P) -> (Self, Option<ConfigWarning>) {
        let path = path.as_ref();
        let parsed = std::fs::read_to_string(path)
            .map_err(|err| err.to_string())
            .and_then(|text| toml::from_str::<CalibrationConfig>(&text).map_err(|err| err.to_string()));

        match parsed {
            Ok(config) => {
                tracing::info!(
                    "Calibration config loaded from {}: board {}x{}, square {}, {} camera positions",
                    path.display(),
                    config.checkerboard.width,
                    config.checkerboard.height,
                    config.checkerboard.square_size,
                    config.cameras.len()
                );
                (config, None)
            }
            Err(reason) => {
                let warning = ConfigWarning {
                    path: path.to_path_buf(),
                    reason,
                };
                tracing::warn!("{}", warning);
                (Self::default(), Some(warning))
            }
        }
    }

    /// True when the checkerboard geometry has been filled in
    pub fn is_configured(&self) -> bool {
        self.checkerboard.width != 0 && self.checkerboard.height != 0 && self.checkerboard.square_size != 0.0
    }

    pub fn camera_positions(&self) -> Vec<Vec3> {
        self.cameras
            .iter()
            .map(|c| Vec3::new(c.position[0], c.position[1], c.position[2]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let (config, warning) = CalibrationConfig::load(tmp.path().join("checkerboard.toml"));
        assert_eq!(config, CalibrationConfig::default());
        assert!(!config.is_configured());
        let warning = warning.unwrap();
        assert!(warning.to_string().contains("checkerboard.toml"));
    }

    #[test]
    fn test_load_full_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("checkerboard.toml");
        std::fs::write(
            &path,
            r#"
[checkerboard]
width = 8
height = 6
square_size = 115.0

[[cameras]]
position = [1.0, 2.0, 3.0]

[[cameras]]
position = [-1.0, 0.0, 5.0]
"#,
        )
        .unwrap();

        let (config, warning) = CalibrationConfig::load(&path);
        assert!(warning.is_none());
        assert!(config.is_configured());
        assert_eq!(config.checkerboard.width, 8);
        assert_eq!(config.camera_positions()[1], Vec3::new(-1.0, 0.0, 5.0));
    }

    #[test]
    fn test_partial_config_keeps_zero_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("checkerboard.toml");
        std::fs::write(&path, "[checkerboard]\nwidth = 8\n").unwrap();
        let (config, warning) = CalibrationConfig::load(&path);
        assert!(warning.is_none());
        assert_eq!(config.checkerboard.height, 0);
        assert!(!config.is_configured());
        assert!(config.cameras.is_empty());
    }

    #[test]
    fn test_malformed_file_warns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("checkerboard.toml");
        std::fs::write(&path, "checkerboard = [[[").unwrap();
        let (config, warning) = CalibrationConfig::load(&path);
        assert_eq!(config, CalibrationConfig::default());
        assert!(warning.is_some());
    }
}
