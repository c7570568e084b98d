//! Jump kinematics used to derive minimum feature spacing.

use serde::{Deserialize, Serialize};

/// Closed-form jump model for a player moving at constant scroll velocity.
///
/// Computed once per generation run from the player-body constants and
/// immutable afterwards. Must be recomputed whenever gravity, launch speed
/// or scroll velocity changes (e.g. the level length or song duration
/// changed, which changes `scroll_velocity = level_length / song_time`).
///
/// Serialized field names are part of the level file format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsModel {
    /// Gravity magnitude (> 0), level units per second squared
    pub gravity: f32,
    /// Horizontal scroll velocity, level units per second
    pub scroll_velocity: f32,
    /// Initial vertical launch speed of a jump
    pub jump_acceleration: f32,
    /// Peak height of the jump arc, level units
    pub jump_height: f32,
    /// Horizontal distance covered during one full jump arc, level units
    pub jump_distance: f32,
}

impl PhysicsModel {
    /// Derive the jump arc from its three inputs.
    ///
    /// Vertical velocity is zero at the peak, so the time to reach it is
    /// `jump_acceleration / gravity` and the whole jump lasts twice that.
    pub fn compute(gravity: f32, scroll_velocity: f32, jump_acceleration: f32) -> Self {
        let time_to_peak = jump_acceleration / gravity;
        let air_time = time_to_peak * 2.0;

        // h = v*t - g*t^2 / 2
        let jump_height =
            jump_acceleration * time_to_peak - 0.5 * gravity * time_to_peak * time_to_peak;
        let jump_distance = air_time * scroll_velocity;

        Self {
            gravity,
            scroll_velocity,
            jump_acceleration,
            jump_height,
            jump_distance,
        }
    }
}
