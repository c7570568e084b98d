//! Feature placement and priority-based conflict resolution.
//!
//! The placer runs two passes over the onset timeline, once per generation:
//! a placement pass that drops entities on onsets subject to each feature's
//! minimum spacing, and a cleanup pass that removes lower-priority entities
//! falling inside a higher-priority entity's physics-adjusted exclusion
//! zone. Both passes walk the features in ascending priority order, so a
//! feature processed earlier wins exclusive control of its zone over every
//! feature processed later, ties broken by configuration order.

use crate::band::FrequencyBand;
use crate::feature::{CueColor, FeatureId, FeatureKind, LevelFeature};
use crate::physics::PhysicsModel;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Spawns and despawns world objects for placed entities.
///
/// The placer owns its entity records; the backend owns only the opaque
/// world objects behind the returned handles and destroys them when told.
pub trait WorldBackend {
    /// Create the world object for a feature at a horizontal position
    /// (already offset-adjusted), returning an opaque handle.
    fn spawn(&mut self, feature: &LevelFeature, position: f32) -> u64;

    /// Destroy the world object behind a handle.
    fn despawn(&mut self, handle: u64);
}

/// Backend that allocates handles without creating anything, for headless
/// generation (pre-processing a level file with no scene attached).
#[derive(Debug, Default)]
pub struct NullBackend {
    next_handle: u64,
}

impl WorldBackend for NullBackend {
    fn spawn(&mut self, _feature: &LevelFeature, _position: f32) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn despawn(&mut self, _handle: u64) {}
}

/// A world entity placed at one song-position index.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEntity {
    /// The feature this entity belongs to
    pub feature_id: FeatureId,
    /// Index into the onset timeline; unique among live entities
    pub song_position_index: usize,
    /// Opaque handle to the spawned world object
    pub handle: u64,
}

/// A lighting event at one song-position index. Independent of placed
/// entities and never removed by conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingCue {
    /// Index into the onset timeline
    pub song_position_index: usize,
    /// Optional cue color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<CueColor>,
}

/// A feature with spacing resolved against the physics model, ready to run.
struct PlannedFeature {
    id: FeatureId,
    feature: LevelFeature,
    pre_space_index: usize,
    post_space_index: usize,
}

/// Places level features on the onset timeline and resolves conflicts.
///
/// The live entity collection is mutated only during [`generate`]; after a
/// run completes it is read-only until the next generate/reset cycle.
///
/// [`generate`]: LevelFeaturePlacer::generate
pub struct LevelFeaturePlacer {
    spacing_between_samples: f32,
    /// One slot per song-position index; at most one live entity each
    slots: Vec<Option<PlacedEntity>>,
    cues: Vec<LightingCue>,
}

impl LevelFeaturePlacer {
    /// Create a placer for a level with the given distance per index.
    pub fn new(spacing_between_samples: f32) -> Result<Self> {
        if spacing_between_samples <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "spacing between samples must be positive, got {spacing_between_samples}"
            )));
        }
        Ok(Self {
            spacing_between_samples,
            slots: Vec::new(),
            cues: Vec::new(),
        })
    }

    /// Run both passes over the bands' onset sequences.
    ///
    /// Any prior placements are despawned first, so a placer can be reused
    /// across regenerate cycles without orphaning world objects. The
    /// caller-supplied feature array is never mutated; a priority-sorted
    /// plan is built locally.
    pub fn generate(
        &mut self,
        features: &[LevelFeature],
        physics: &PhysicsModel,
        bands: &[FrequencyBand],
        world: &mut dyn WorldBackend,
    ) -> Result<()> {
        self.reset(world);

        let plan = self.build_plan(features, physics, bands)?;

        let timeline_len = bands
            .iter()
            .map(|band| band.samples().len())
            .max()
            .unwrap_or(0);
        self.slots = (0..timeline_len).map(|_| None).collect();

        for planned in &plan {
            if planned.feature.kind == FeatureKind::LightingCue {
                self.collect_lighting_cues(planned, &bands[planned.feature.band_index]);
            } else {
                self.place_feature(planned, &bands[planned.feature.band_index], world);
            }
        }

        for planned in &plan {
            if planned.feature.kind != FeatureKind::LightingCue {
                self.clean_up_around(planned, world);
            }
        }

        debug!(
            entities = self.slots.iter().filter(|s| s.is_some()).count(),
            lighting_cues = self.cues.len(),
            "feature placement complete"
        );
        Ok(())
    }

    /// Validate band bindings and resolve spacing into index counts, in
    /// ascending priority order (stable, so ties keep configuration order).
    fn build_plan(
        &self,
        features: &[LevelFeature],
        physics: &PhysicsModel,
        bands: &[FrequencyBand],
    ) -> Result<Vec<PlannedFeature>> {
        let mut plan = Vec::with_capacity(features.len());

        for (index, feature) in features.iter().enumerate() {
            if feature.band_index >= bands.len() {
                return Err(CoreError::BandIndexOutOfRange {
                    feature_index: index,
                    band_index: feature.band_index,
                    band_count: bands.len(),
                });
            }

            let adjusted = feature.adjusted_for_jump_distance(physics.jump_distance);
            let pre_space_index = adjusted.pre_space_index(self.spacing_between_samples);
            let post_space_index = adjusted.post_space_index(self.spacing_between_samples);

            plan.push(PlannedFeature {
                id: FeatureId(index),
                feature: adjusted,
                pre_space_index,
                post_space_index,
            });
        }

        plan.sort_by_key(|planned| planned.feature.priority);
        Ok(plan)
    }

    /// Placement pass for one feature: walk the band's samples in index
    /// order and place an entity on each onset that honors the feature's
    /// pre-spacing, skipping indices that are already occupied.
    fn place_feature(
        &mut self,
        planned: &PlannedFeature,
        band: &FrequencyBand,
        world: &mut dyn WorldBackend,
    ) {
        let feature = &planned.feature;
        let mut gap_since_last = 0usize;

        for (index, sample) in band.samples().iter().enumerate() {
            let spaced = gap_since_last >= planned.pre_space_index || feature.place_adjacent;

            if sample.is_onset && spaced && self.slots[index].is_none() {
                let position = index as f32 * self.spacing_between_samples + feature.offset;
                let handle = world.spawn(feature, position);
                self.slots[index] = Some(PlacedEntity {
                    feature_id: planned.id,
                    song_position_index: index,
                    handle,
                });
                trace!(feature = ?planned.id, index, "placed entity");
                gap_since_last = 0;
            } else {
                gap_since_last += 1;
            }
        }
    }

    /// Every onset of a lighting band becomes a cue; no spatial checks.
    fn collect_lighting_cues(&mut self, planned: &PlannedFeature, band: &FrequencyBand) {
        for (index, sample) in band.samples().iter().enumerate() {
            if sample.is_onset {
                self.cues.push(LightingCue {
                    song_position_index: index,
                    color: planned.feature.color,
                });
            }
        }
    }

    /// Cleanup pass for one feature: around each of its surviving entities,
    /// despawn every entity of a different feature inside the exclusion
    /// window `[index - pre, index + post)`. Removal is immediate, so a
    /// feature swept earlier wins its zone outright; entities of the same
    /// feature are never removed by their own sweep.
    fn clean_up_around(&mut self, planned: &PlannedFeature, world: &mut dyn WorldBackend) {
        for center in 0..self.slots.len() {
            let owns_center = matches!(
                &self.slots[center],
                Some(entity) if entity.feature_id == planned.id
            );
            if !owns_center {
                continue;
            }

            let start = center.saturating_sub(planned.pre_space_index);
            let end = (center + planned.post_space_index).min(self.slots.len());

            for index in start..end {
                let conflicting = matches!(
                    &self.slots[index],
                    Some(entity) if entity.feature_id != planned.id
                );
                if conflicting {
                    if let Some(entity) = self.slots[index].take() {
                        world.despawn(entity.handle);
                        trace!(
                            winner = ?planned.id,
                            loser = ?entity.feature_id,
                            index,
                            "removed conflicting entity"
                        );
                    }
                }
            }
        }
    }

    /// Despawn all live entities and clear cues, readying for another run.
    pub fn reset(&mut self, world: &mut dyn WorldBackend) {
        for slot in &mut self.slots {
            if let Some(entity) = slot.take() {
                world.despawn(entity.handle);
            }
        }
        self.slots.clear();
        self.cues.clear();
    }

    /// Live placed entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = &PlacedEntity> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Collected lighting cues, in plan order then index order.
    pub fn lighting_cues(&self) -> &[LightingCue] {
        &self.cues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend recording every spawn/despawn for assertions.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        next_handle: u64,
        spawned: Vec<u64>,
        despawned: Vec<u64>,
    }

    impl WorldBackend for RecordingBackend {
        fn spawn(&mut self, _feature: &LevelFeature, _position: f32) -> u64 {
            self.next_handle += 1;
            self.spawned.push(self.next_handle);
            self.next_handle
        }

        fn despawn(&mut self, handle: u64) {
            self.despawned.push(handle);
        }
    }

    /// Band with onsets exactly at the given indices.
    fn band_with_onsets(len: usize, onsets: &[usize]) -> FrequencyBand {
        FrequencyBand::with_onsets(len, onsets)
    }

    fn feature(kind: FeatureKind, band_index: usize, priority: i32) -> LevelFeature {
        LevelFeature {
            band_index,
            priority,
            kind,
            place_adjacent: false,
            offset: 0.0,
            pre_space: 0.0,
            post_space: 0.0,
            color: None,
        }
    }

    /// Physics with a jump distance of zero, so configured spacing rules.
    fn no_jump() -> PhysicsModel {
        PhysicsModel::compute(10.0, 0.0, 0.0)
    }

    #[test]
    fn entities_placed_on_onsets() {
        let bands = vec![band_with_onsets(20, &[5, 10, 15])];
        let features = vec![feature(FeatureKind::Hazard, 0, 0)];
        let mut world = RecordingBackend::default();

        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        placer
            .generate(&features, &no_jump(), &bands, &mut world)
            .unwrap();

        let indices: Vec<usize> = placer.entities().map(|e| e.song_position_index).collect();
        assert_eq!(indices, vec![5, 10, 15]);
        assert_eq!(world.spawned.len(), 3);
        assert!(world.despawned.is_empty());
    }

    #[test]
    fn pre_spacing_suppresses_close_onsets() {
        // Onsets at 5 and 7; jump distance 3 units at spacing 0.5 needs a
        // gap of 3 indices between placements of the same feature.
        let bands = vec![band_with_onsets(20, &[5, 7, 14])];
        let features = vec![feature(FeatureKind::Hazard, 0, 0)];
        let physics = PhysicsModel::compute(10.0, 3.0, 5.0);
        assert_eq!(physics.jump_distance, 3.0);

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.5).unwrap();
        placer
            .generate(&features, &physics, &bands, &mut world)
            .unwrap();

        let indices: Vec<usize> = placer.entities().map(|e| e.song_position_index).collect();
        assert_eq!(indices, vec![5, 14]);
    }

    #[test]
    fn place_adjacent_bypasses_spacing() {
        let bands = vec![band_with_onsets(20, &[5, 6])];
        let mut adjacent = feature(FeatureKind::Hazard, 0, 0);
        adjacent.place_adjacent = true;

        let physics = PhysicsModel::compute(10.0, 3.0, 5.0);
        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.5).unwrap();
        placer
            .generate(&[adjacent], &physics, &bands, &mut world)
            .unwrap();

        let indices: Vec<usize> = placer.entities().map(|e| e.song_position_index).collect();
        assert_eq!(indices, vec![5, 6]);
    }

    #[test]
    fn cleanup_removes_lower_priority_inside_exclusion_zone() {
        // Hazard at index 10 with 12-index spacing; duck onset at 14 falls
        // inside [10 - 12, 10 + 12) and must be deleted.
        let bands = vec![
            band_with_onsets(30, &[10]),
            band_with_onsets(30, &[14, 26]),
        ];
        let mut hazard = feature(FeatureKind::Hazard, 0, 0);
        hazard.pre_space = 3.0;
        hazard.post_space = 3.0;
        // The hazard's own 12-index gap rule would suppress an onset this
        // early in the clip, so let it place adjacent; cleanup still
        // enforces its configured spacing against other features.
        hazard.place_adjacent = true;
        let duck = feature(FeatureKind::DuckObstacle, 1, 1);

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        placer
            .generate(&[hazard, duck], &no_jump(), &bands, &mut world)
            .unwrap();

        let placed: Vec<(FeatureId, usize)> = placer
            .entities()
            .map(|e| (e.feature_id, e.song_position_index))
            .collect();
        assert_eq!(placed, vec![(FeatureId(0), 10), (FeatureId(1), 26)]);
        assert_eq!(world.despawned.len(), 1);
    }

    #[test]
    fn winner_spacing_enforced_between_different_features() {
        let bands = vec![
            band_with_onsets(40, &[10, 20, 30]),
            band_with_onsets(40, &[12, 19, 31]),
        ];
        let mut high = feature(FeatureKind::Hazard, 0, 0);
        high.pre_space = 1.0;
        high.post_space = 1.0;
        let mut low = feature(FeatureKind::DuckObstacle, 1, 1);
        low.place_adjacent = true;

        let spacing = 0.25;
        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(spacing).unwrap();
        placer
            .generate(&[high, low], &no_jump(), &bands, &mut world)
            .unwrap();

        let entities: Vec<&PlacedEntity> = placer.entities().collect();
        let pre = 4usize; // 1.0 / 0.25
        let post = 4usize;
        for winner in entities.iter().filter(|e| e.feature_id == FeatureId(0)) {
            for other in entities.iter().filter(|e| e.feature_id != FeatureId(0)) {
                let index = other.song_position_index;
                let start = winner.song_position_index.saturating_sub(pre);
                let end = winner.song_position_index + post;
                assert!(
                    index < start || index >= end,
                    "entity at {index} violates winner zone [{start}, {end})"
                );
            }
        }
    }

    #[test]
    fn priority_ties_broken_by_configuration_order() {
        // Same priority: the first configured feature is swept first and
        // keeps its entity.
        let bands = vec![band_with_onsets(20, &[10]), band_with_onsets(20, &[12])];
        let mut first = feature(FeatureKind::Hazard, 0, 3);
        first.post_space = 1.0;
        let second = feature(FeatureKind::DuckObstacle, 1, 3);

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        placer
            .generate(&[first, second], &no_jump(), &bands, &mut world)
            .unwrap();

        let placed: Vec<FeatureId> = placer.entities().map(|e| e.feature_id).collect();
        assert_eq!(placed, vec![FeatureId(0)]);
    }

    #[test]
    fn lighting_features_bypass_conflict_resolution() {
        let bands = vec![band_with_onsets(20, &[10]), band_with_onsets(20, &[9, 10, 11])];
        let mut hazard = feature(FeatureKind::Hazard, 0, 0);
        hazard.pre_space = 5.0;
        hazard.post_space = 5.0;
        let mut lighting = feature(FeatureKind::LightingCue, 1, 1);
        lighting.color = Some(CueColor {
            r: 1.0,
            g: 0.5,
            b: 0.0,
            a: 1.0,
        });

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        placer
            .generate(&[hazard, lighting], &no_jump(), &bands, &mut world)
            .unwrap();

        // Every lighting onset became a cue, color included, spacing ignored.
        let cues = placer.lighting_cues();
        let indices: Vec<usize> = cues.iter().map(|c| c.song_position_index).collect();
        assert_eq!(indices, vec![9, 10, 11]);
        assert!(cues.iter().all(|c| c.color.is_some()));
    }

    #[test]
    fn unknown_band_index_is_fatal() {
        let bands = vec![band_with_onsets(10, &[])];
        let features = vec![feature(FeatureKind::Hazard, 3, 0)];

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        let result = placer.generate(&features, &no_jump(), &bands, &mut world);

        assert!(matches!(
            result,
            Err(CoreError::BandIndexOutOfRange {
                feature_index: 0,
                band_index: 3,
                band_count: 1,
            })
        ));
    }

    #[test]
    fn regenerate_despawns_previous_entities_first() {
        let bands = vec![band_with_onsets(20, &[5, 10])];
        let features = vec![feature(FeatureKind::Hazard, 0, 0)];

        let mut world = RecordingBackend::default();
        let mut placer = LevelFeaturePlacer::new(0.25).unwrap();
        placer
            .generate(&features, &no_jump(), &bands, &mut world)
            .unwrap();
        placer
            .generate(&features, &no_jump(), &bands, &mut world)
            .unwrap();

        // First run's two handles were released before the second run.
        assert_eq!(world.spawned.len(), 4);
        assert_eq!(world.despawned, vec![1, 2]);
    }

    #[test]
    fn zero_spacing_is_rejected() {
        assert!(LevelFeaturePlacer::new(0.0).is_err());
        assert!(LevelFeaturePlacer::new(-1.0).is_err());
    }
}
