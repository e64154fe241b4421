//! Spatial hashing for overlap queries against live bodies.
//!
//! The spatial query service consumed by the enemy behavior core:
//! `query_overlap(center, radius, tag)` returns every registered body
//! whose footprint overlaps a sphere, filtered by tag. The index is
//! rebuilt from authoritative positions each fixed tick, so entries are
//! never stale by more than one tick. Result order is whatever the hash
//! grid produces; callers must not rely on it being stable.

use bevy::prelude::*;
use std::collections::HashMap;

/// Size of each spatial grid cell in world units.
/// Should be at least the largest query radius that hits a single cell often.
pub const SPATIAL_CELL_SIZE: f32 = 8.0;

/// Classification used to restrict overlap queries to relevant bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Player,
    Enemy,
}

/// A single body registered in the index.
#[derive(Clone, Copy, Debug)]
pub struct BodyEntry {
    pub entity: Entity,
    /// Capsule center in world space.
    pub center: Vec3,
    /// Horizontal body radius.
    pub radius: f32,
    pub tag: BodyTag,
}

impl BodyEntry {
    /// Closest point on this body's horizontal footprint to `from`.
    /// Approximates the capsule as a vertical cylinder; good enough for
    /// melee hit placement.
    pub fn closest_point(&self, from: Vec3) -> Vec3 {
        let to = Vec3::new(from.x - self.center.x, 0.0, from.z - self.center.z);
        self.center + to.clamp_length_max(self.radius)
    }
}

/// Spatial hash grid over all live bodies in the arena.
///
/// A Bevy resource rebuilt each fixed tick by the authority. Overlap
/// queries check only the grid cells touched by the query sphere, O(1)
/// average instead of scanning every body.
#[derive(Resource, Default, Debug)]
pub struct SpatialBodyIndex {
    /// Map from grid cell (x, z) to indices of bodies overlapping that cell.
    cells: HashMap<(i32, i32), Vec<usize>>,
    bodies: Vec<BodyEntry>,
}

impl SpatialBodyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn world_to_cell(x: f32, z: f32) -> (i32, i32) {
        (
            (x / SPATIAL_CELL_SIZE).floor() as i32,
            (z / SPATIAL_CELL_SIZE).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.bodies.clear();
    }

    /// Register a body for this tick.
    pub fn insert(&mut self, entry: BodyEntry) {
        let min_cell = Self::world_to_cell(entry.center.x - entry.radius, entry.center.z - entry.radius);
        let max_cell = Self::world_to_cell(entry.center.x + entry.radius, entry.center.z + entry.radius);

        let idx = self.bodies.len();
        self.bodies.push(entry);

        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                self.cells.entry((cx, cz)).or_default().push(idx);
            }
        }
    }

    /// All bodies with `tag` whose footprint overlaps the sphere at
    /// `center` with `radius`. Overlap is tested on the horizontal plane
    /// (everything stands on flat ground).
    pub fn query_overlap(&self, center: Vec3, radius: f32, tag: BodyTag) -> Vec<BodyEntry> {
        let min_cell = Self::world_to_cell(center.x - radius, center.z - radius);
        let max_cell = Self::world_to_cell(center.x + radius, center.z + radius);

        let mut seen: Vec<usize> = Vec::new();
        let mut out = Vec::new();

        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                let Some(indices) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                for &idx in indices {
                    if seen.contains(&idx) {
                        continue;
                    }
                    seen.push(idx);

                    let body = &self.bodies[idx];
                    if body.tag != tag {
                        continue;
                    }
                    let dx = body.center.x - center.x;
                    let dz = body.center.z - center.z;
                    let reach = radius + body.radius;
                    if dx * dx + dz * dz <= reach * reach {
                        out.push(*body);
                    }
                }
            }
        }

        out
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(world: &mut World) -> Entity {
        world.spawn_empty().id()
    }

    #[test]
    fn overlap_respects_radius_and_tag() {
        let mut world = World::new();
        let near = entity(&mut world);
        let far = entity(&mut world);
        let wrong_tag = entity(&mut world);

        let mut index = SpatialBodyIndex::new();
        index.insert(BodyEntry {
            entity: near,
            center: Vec3::new(3.0, 0.9, 0.0),
            radius: 0.3,
            tag: BodyTag::Player,
        });
        index.insert(BodyEntry {
            entity: far,
            center: Vec3::new(30.0, 0.9, 0.0),
            radius: 0.3,
            tag: BodyTag::Player,
        });
        index.insert(BodyEntry {
            entity: wrong_tag,
            center: Vec3::new(2.0, 0.9, 0.0),
            radius: 0.3,
            tag: BodyTag::Enemy,
        });

        let hits = index.query_overlap(Vec3::ZERO, 20.0, BodyTag::Player);
        let entities: Vec<Entity> = hits.iter().map(|b| b.entity).collect();
        assert!(entities.contains(&near));
        assert!(!entities.contains(&far));
        assert!(!entities.contains(&wrong_tag));
    }

    #[test]
    fn bodies_spanning_cells_reported_once() {
        let mut world = World::new();
        let e = entity(&mut world);

        let mut index = SpatialBodyIndex::new();
        // Sits exactly on a cell boundary, registered in multiple cells.
        index.insert(BodyEntry {
            entity: e,
            center: Vec3::new(SPATIAL_CELL_SIZE, 0.9, SPATIAL_CELL_SIZE),
            radius: 1.0,
            tag: BodyTag::Player,
        });

        let hits = index.query_overlap(Vec3::new(SPATIAL_CELL_SIZE, 0.0, SPATIAL_CELL_SIZE), 16.0, BodyTag::Player);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn touching_footprints_count_as_overlap() {
        let mut world = World::new();
        let e = entity(&mut world);

        let mut index = SpatialBodyIndex::new();
        index.insert(BodyEntry {
            entity: e,
            center: Vec3::new(1.0, 0.9, 0.0),
            radius: 0.4,
            tag: BodyTag::Enemy,
        });

        // Query sphere of 0.6 + body radius 0.4 exactly reaches center at 1.0.
        assert_eq!(index.query_overlap(Vec3::ZERO, 0.6, BodyTag::Enemy).len(), 1);
        assert!(index.query_overlap(Vec3::ZERO, 0.5, BodyTag::Enemy).is_empty());
    }

    #[test]
    fn closest_point_sits_on_footprint_rim() {
        let mut world = World::new();
        let e = entity(&mut world);
        let body = BodyEntry {
            entity: e,
            center: Vec3::new(0.0, 0.9, 0.0),
            radius: 0.5,
            tag: BodyTag::Player,
        };

        let p = body.closest_point(Vec3::new(2.0, 0.9, 0.0));
        assert!((p - Vec3::new(0.5, 0.9, 0.0)).length() < 1e-4);
    }
}
