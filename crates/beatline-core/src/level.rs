//! Level generation orchestration and the generated level record.
//!
//! [`generate_level`] ties the pipeline together: the analyzer's per-band
//! onset sequences, the physics model derived from the level's scroll
//! velocity, and the placer's two placement passes. The caller constructs
//! and threads through every collaborator; there is no process-wide state.

use crate::analyzer::SpectrumAnalyzer;
use crate::feature::{FeatureId, LevelFeature};
use crate::physics::PhysicsModel;
use crate::placer::{LevelFeaturePlacer, LightingCue, WorldBackend};
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-run level options supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    /// Name of the song the level was generated from. Callers may leave it
    /// empty and fill it from the clip's filename.
    #[serde(default)]
    pub song_name: String,
    /// Distance in level units each song-position index represents
    pub spacing_between_samples: f32,
    /// Horizontal offset of the player from the left level edge
    pub player_offset: f32,
    /// Horizontal scale applied to the ground platform
    pub platform_scale: f32,
    /// Gravity magnitude for the jump model (> 0)
    pub gravity: f32,
    /// Initial vertical launch speed for the jump model
    pub jump_acceleration: f32,
}

/// One persisted placed entity: the feature record it came from, the stable
/// feature id, and its position on the onset timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelObjectData {
    /// Stable id of the feature in the generation-time configuration array
    pub feature_id: FeatureId,
    /// The feature configuration as supplied by the caller
    pub feature: LevelFeature,
    /// Index into the onset timeline
    pub song_position_index: usize,
}

/// A fully generated level, ready to be persisted or handed to a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLevel {
    /// Name of the source song
    pub song_name: String,
    /// Number of recorded samples in the song (the onset timeline length)
    pub song_index_length: usize,
    /// Distance in level units per song-position index
    pub spacing_between_samples: f32,
    /// Horizontal offset of the player from the left level edge
    pub player_offset: f32,
    /// Length of the song in seconds
    pub song_time: f32,
    /// Length of the level in level units
    pub level_length: f32,
    /// Horizontal scale applied to the ground platform
    pub platform_scale: f32,
    /// The jump model the placement was validated against
    pub physics_model: PhysicsModel,
    /// Placed entities surviving conflict resolution, in index order
    #[serde(default)]
    pub level_object_data: Vec<LevelObjectData>,
    /// Lighting cues; never pruned by conflict resolution
    #[serde(default)]
    pub lighting_event_data: Vec<LightingCue>,
}

/// Run feature placement over a fully analyzed clip.
///
/// The analyzer must have consumed every frame of the song already; this is
/// a batch pre-process, not a streaming one. A failed run leaves no world
/// objects behind: the placer despawns everything it spawned before the
/// error is returned.
pub fn generate_level(
    analyzer: &SpectrumAnalyzer,
    features: &[LevelFeature],
    config: &LevelConfig,
    song_time: f32,
    world: &mut dyn WorldBackend,
) -> Result<GeneratedLevel> {
    if song_time <= 0.0 {
        return Err(CoreError::InvalidConfig(format!(
            "song time must be positive, got {song_time}"
        )));
    }
    if config.gravity <= 0.0 {
        return Err(CoreError::InvalidConfig(format!(
            "gravity must be positive, got {}",
            config.gravity
        )));
    }

    let song_index_length = analyzer.frames_analyzed();
    let level_length = song_index_length as f32 * config.spacing_between_samples;
    let scroll_velocity = level_length / song_time;

    let physics = PhysicsModel::compute(config.gravity, scroll_velocity, config.jump_acceleration);
    debug!(
        scroll_velocity,
        jump_height = physics.jump_height,
        jump_distance = physics.jump_distance,
        "physics model computed"
    );

    let mut placer = LevelFeaturePlacer::new(config.spacing_between_samples)?;
    let outcome = placer.generate(features, &physics, analyzer.bands(), world);
    if let Err(error) = outcome {
        placer.reset(world);
        return Err(error);
    }

    let level_object_data: Vec<LevelObjectData> = placer
        .entities()
        .map(|entity| LevelObjectData {
            feature_id: entity.feature_id,
            feature: features[entity.feature_id.0].clone(),
            song_position_index: entity.song_position_index,
        })
        .collect();

    info!(
        song = %config.song_name,
        indices = song_index_length,
        entities = level_object_data.len(),
        lighting_cues = placer.lighting_cues().len(),
        "level generated"
    );

    Ok(GeneratedLevel {
        song_name: config.song_name.clone(),
        song_index_length,
        spacing_between_samples: config.spacing_between_samples,
        player_offset: config.player_offset,
        song_time,
        level_length,
        platform_scale: config.platform_scale,
        physics_model: physics,
        level_object_data,
        lighting_event_data: placer.lighting_cues().to_vec(),
    })
}
