//! Beatline Core - Onset Detection and Level Generation
//!
//! This crate contains the core domain model for Beatline, including:
//! - Per-band spectral flux onset detection with an adaptive threshold
//! - Jump kinematics used to derive minimum feature spacing
//! - Feature placement and priority-based conflict resolution
//! - The generated level record that gets persisted
//!
//! Everything here is a synchronous batch pre-process: a whole clip of
//! spectrum frames goes in, a fully resolved level comes out. Rendering,
//! playback and file I/O live in other crates.

#![warn(missing_docs)]

use thiserror::Error;

pub mod analyzer;
pub mod band;
pub mod feature;
pub mod level;
pub mod physics;
pub mod placer;

pub use analyzer::{AnalyzerConfig, SpectrumAnalyzer, SpectrumFrame};
pub use band::{FluxSample, FrequencyBand};
pub use feature::{CueColor, FeatureId, FeatureKind, LevelFeature};
pub use level::{generate_level, GeneratedLevel, LevelConfig, LevelObjectData};
pub use physics::PhysicsModel;
pub use placer::{LevelFeaturePlacer, LightingCue, NullBackend, PlacedEntity, WorldBackend};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A feature references a frequency band that was never configured.
    #[error(
        "feature {feature_index} references frequency band {band_index}, \
         but only {band_count} bands are configured"
    )]
    BandIndexOutOfRange {
        /// Position of the offending feature in the configuration array
        feature_index: usize,
        /// The band index the feature asked for
        band_index: usize,
        /// Number of configured bands
        band_count: usize,
    },

    /// Invalid analyzer or level configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
