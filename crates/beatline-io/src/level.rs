//! Level I/O - High-level API
//!
//! High-level save/load entry points for generated levels. These handle
//! version validation and the metadata wrapper, delegating serialization
//! and file handling to the `level_format` module.

use crate::error::{IoError, Result};
use crate::level_format::{LevelFile, LEVEL_FILE_VERSION};
use beatline_core::GeneratedLevel;
use std::path::Path;
use tracing::info;

/// Save a generated level to a level file.
///
/// The level is wrapped in a [`LevelFile`] container carrying the format
/// version and timestamps before being written to disk.
pub fn save_level(level: &GeneratedLevel, path: &Path) -> Result<()> {
    let mut file = LevelFile::new(level.clone());
    file.save(path)?;
    info!(path = %path.display(), entities = level.level_object_data.len(), "level saved");
    Ok(())
}

/// Load a generated level from a level file.
///
/// Validates the format version before handing back the payload. Stale data
/// inside the level (e.g. a recorded song length that no longer matches the
/// live audio clip) is the caller's concern, not validated here.
pub fn load_level(path: &Path) -> Result<GeneratedLevel> {
    let file = LevelFile::load(path)?;

    if file.version != LEVEL_FILE_VERSION {
        return Err(IoError::VersionMismatch {
            expected: LEVEL_FILE_VERSION.to_string(),
            found: file.version,
        });
    }

    info!(path = %path.display(), song = %file.level.song_name, "level loaded");
    Ok(file.level)
}
