//! Error types for level file I/O.

/// Result type alias for level file operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for level file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON serialization failed
    #[error("RON serialization error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// RON deserialization failed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// File extension does not map to a known format
    #[error("Unsupported level file format: {0}")]
    UnsupportedFormat(String),

    /// The file was written by an incompatible format version
    #[error("Level file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build writes and reads
        expected: String,
        /// Version found in the file
        found: String,
    },

    /// The file exceeds the load size limit
    #[error("Level file too large: {size} bytes (limit: {limit} bytes)")]
    FileTooLarge {
        /// Actual file size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
}
