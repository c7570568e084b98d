//! Beatline I/O - Level File Persistence
//!
//! Saving and loading generated levels as versioned RON or JSON files.
//! The level payload itself is defined in `beatline-core`; this crate wraps
//! it with format metadata and handles the files.

#![warn(missing_docs)]

pub mod error;
pub mod level;
pub mod level_format;

pub use error::{IoError, Result};
pub use level::{load_level, save_level};
pub use level_format::{LevelFile, LevelMetadata, LEVEL_FILE_VERSION, MAX_LEVEL_FILE_SIZE};
