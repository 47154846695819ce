//! JSON configuration I/O for the CLI and other embedders.

use std::fs;
use std::path::Path;

use crate::calibration::CalibrationConfig;
use crate::charuco::CharucoBoardSpec;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CharucoBoardSpec {
    /// Load a board description from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this board description to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl CalibrationConfig {
    /// Load a full calibration configuration from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this configuration to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DictionaryKind;

    #[test]
    fn board_spec_round_trips_through_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("board.json");

        let spec = CharucoBoardSpec::new(6, 9, 0.75, DictionaryKind::Dict5x5_100);
        spec.write_json(&path).expect("write");
        let back = CharucoBoardSpec::load_json(&path).expect("load");

        assert_eq!((back.cols, back.rows), (6, 9));
        assert_eq!(back.marker_square_rel, 0.75);
        assert_eq!(back.dictionary, DictionaryKind::Dict5x5_100);
    }

    #[test]
    fn config_defaults_fill_missing_board_section() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"image_dir":"./shots","suffix":"png","output_dir":"./out","square_size_mm":40.0}"#,
        )
        .expect("write");

        let config = CalibrationConfig::load_json(&path).expect("load");
        assert_eq!(config.suffix, "png");
        assert_eq!(config.board.cols, 5);
        assert_eq!(config.board.rows, 7);
    }
}
