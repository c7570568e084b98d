//! Defines the on-disk level file format.
//!
//! This module specifies the structure of a saved level, serialized to and
//! from RON or JSON depending on the file extension. It wraps the generated
//! level with format-version and timestamp metadata.

use crate::error::{IoError, Result};
use beatline_core::GeneratedLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// The current version of the level file format.
///
/// Stamped into saved files; incremented on breaking changes to
/// [`LevelFile`] or the level payload.
pub const LEVEL_FILE_VERSION: &str = "1.0.0";

/// Maximum allowed level file size (16 MB).
///
/// Bounds resource consumption when loading untrusted files.
pub const MAX_LEVEL_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Top-level structure of a saved level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    /// The version of the level file format
    pub version: String,
    /// Metadata about the file
    pub metadata: LevelMetadata,
    /// The generated level payload
    pub level: GeneratedLevel,
}

/// Metadata associated with a level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelMetadata {
    /// When the level was first generated and saved
    pub created_at: DateTime<Utc>,
    /// When the file was last written
    pub modified_at: DateTime<Utc>,
}

impl LevelFile {
    /// Wrap a generated level, stamping creation and modification times.
    pub fn new(level: GeneratedLevel) -> Self {
        let now = Utc::now();
        Self {
            version: LEVEL_FILE_VERSION.to_string(),
            metadata: LevelMetadata {
                created_at: now,
                modified_at: now,
            },
            level,
        }
    }

    /// Load a `LevelFile` from the given path, dispatching on extension.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_limit(path, MAX_LEVEL_FILE_SIZE)
    }

    fn load_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let size = metadata.len();
        if size > limit {
            return Err(IoError::FileTooLarge { size, limit });
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("ron");

        match extension {
            "json" => {
                let mut content = String::new();
                File::open(path)?.read_to_string(&mut content)?;
                let file: LevelFile = serde_json::from_str(&content)?;
                Ok(file)
            }
            "ron" | "level" => {
                let mut content = String::new();
                File::open(path)?.read_to_string(&mut content)?;
                let file: LevelFile = ron::from_str(&content)?;
                Ok(file)
            }
            _ => Err(IoError::UnsupportedFormat(extension.to_string())),
        }
    }

    /// Save the `LevelFile` to the given path, dispatching on extension.
    /// Updates the `modified_at` timestamp.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("ron");

        self.metadata.modified_at = Utc::now();

        match extension {
            "json" => {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, self)?;
            }
            "ron" | "level" => {
                let config = ron::ser::PrettyConfig::default();
                let s = ron::ser::to_string_pretty(self, config)?;
                let mut file = File::create(path)?;
                file.write_all(s.as_bytes())?;
            }
            _ => return Err(IoError::UnsupportedFormat(extension.to_string())),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatline_core::PhysicsModel;
    use tempfile::NamedTempFile;

    fn empty_level() -> GeneratedLevel {
        GeneratedLevel {
            song_name: "silence".to_string(),
            song_index_length: 0,
            spacing_between_samples: 0.25,
            player_offset: 0.0,
            song_time: 1.0,
            level_length: 0.0,
            platform_scale: 1.0,
            physics_model: PhysicsModel::compute(10.0, 1.0, 2.0),
            level_object_data: Vec::new(),
            lighting_event_data: Vec::new(),
        }
    }

    #[test]
    fn ron_roundtrip_preserves_the_file() {
        let mut file = LevelFile::new(empty_level());
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().with_extension("ron");

        file.save(&path).unwrap();
        let loaded = LevelFile::load(&path).unwrap();
        assert_eq!(file.level, loaded.level);
        assert_eq!(file.version, loaded.version);
    }

    #[test]
    fn json_roundtrip_preserves_the_file() {
        let mut file = LevelFile::new(empty_level());
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().with_extension("json");

        file.save(&path).unwrap();
        let loaded = LevelFile::load(&path).unwrap();
        assert_eq!(file.level, loaded.level);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let mut file = LevelFile::new(empty_level());
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().with_extension("txt");

        assert!(matches!(
            file.save(&path),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut file = LevelFile::new(empty_level());
        let temp = NamedTempFile::new().unwrap();
        let path = temp.path().with_extension("ron");
        file.save(&path).unwrap();

        let result = LevelFile::load_with_limit(&path, 8);
        assert!(matches!(result, Err(IoError::FileTooLarge { .. })));
    }

    #[test]
    fn missing_entity_arrays_default_to_empty() {
        // Files written by other tools may omit either array entirely.
        let json = r#"{
            "version": "1.0.0",
            "metadata": {
                "created_at": "2024-01-01T00:00:00Z",
                "modified_at": "2024-01-01T00:00:00Z"
            },
            "level": {
                "songName": "sparse",
                "songIndexLength": 4,
                "spacingBetweenSamples": 0.25,
                "playerOffset": 0.0,
                "songTime": 2.0,
                "levelLength": 1.0,
                "platformScale": 1.0,
                "physicsModel": {
                    "gravity": 10.0,
                    "scrollVelocity": 0.5,
                    "jumpAcceleration": 2.0,
                    "jumpHeight": 0.2,
                    "jumpDistance": 0.2
                }
            }
        }"#;
        let file: LevelFile = serde_json::from_str(json).unwrap();
        assert!(file.level.level_object_data.is_empty());
        assert!(file.level.lighting_event_data.is_empty());
    }
}
