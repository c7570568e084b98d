//! Level feature configuration records.

use serde::{Deserialize, Serialize};

/// Stable identifier for a feature: its position in the configuration array
/// at generation time.
///
/// Entities reference their feature by this id rather than by object
/// identity, so the link survives serialization round-trips.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FeatureId(pub usize);

/// What kind of world entity a feature places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    /// A jumpable hazard (spikes)
    Hazard,
    /// An obstacle the player must duck under
    DuckObstacle,
    /// A wall the player can break through
    DestructibleWall,
    /// Raises or lowers the platform height
    HeightModifier,
    /// Emits lighting cues instead of world entities
    LightingCue,
}

/// RGBA color attached to lighting cues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueColor {
    /// Red component, 0.0 - 1.0
    pub r: f32,
    /// Green component, 0.0 - 1.0
    pub g: f32,
    /// Blue component, 0.0 - 1.0
    pub b: f32,
    /// Alpha component, 0.0 - 1.0
    pub a: f32,
}

/// One entry of the externally supplied feature configuration.
///
/// Binds a feature kind to a frequency band and carries its spacing
/// demands. Serialized field names are part of the level file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelFeature {
    /// Index of the frequency band whose onsets drive this feature
    pub band_index: usize,
    /// Processing order; lower values are processed, hence protected, first
    pub priority: i32,
    /// What gets placed
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    /// Bypass the minimum pre-spacing check during placement
    #[serde(default)]
    pub place_adjacent: bool,
    /// Spatial nudge applied to the spawned world object, level units
    #[serde(default)]
    pub offset: f32,
    /// Required clear distance before the entity, level units
    #[serde(default)]
    pub pre_space: f32,
    /// Required clear distance after the entity, level units
    #[serde(default)]
    pub post_space: f32,
    /// Cue color for lighting features
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<CueColor>,
}

impl LevelFeature {
    /// Copy of this feature with pre/post spacing raised to at least half
    /// the jump distance, so a placed entity always leaves room to land
    /// before it and take off after it.
    pub fn adjusted_for_jump_distance(&self, jump_distance: f32) -> Self {
        let mut adjusted = self.clone();
        adjusted.pre_space = adjusted.pre_space.max(jump_distance / 2.0);
        adjusted.post_space = adjusted.post_space.max(jump_distance / 2.0);
        adjusted
    }

    /// Pre-spacing converted to a count of song-position indices.
    /// Non-positive spacing clamps to zero indices.
    pub fn pre_space_index(&self, spacing_between_samples: f32) -> usize {
        Self::distance_to_indices(self.pre_space, spacing_between_samples)
    }

    /// Post-spacing converted to a count of song-position indices.
    pub fn post_space_index(&self, spacing_between_samples: f32) -> usize {
        Self::distance_to_indices(self.post_space, spacing_between_samples)
    }

    fn distance_to_indices(distance: f32, spacing_between_samples: f32) -> usize {
        if distance <= 0.0 {
            return 0;
        }
        (distance / spacing_between_samples) as usize
    }
}
