//! Broadphase collision detection using AABB overlap tests.

use super::collider::PhysicsAabb;

/// World AABB of one collider, keyed by arena slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadphaseEntry {
    pub index: usize,
    pub aabb: PhysicsAabb,
    pub is_dynamic: bool,
}

/// O(n^2) pair-wise AABB test.
///
/// Entries are snapshotted once per tick, after geometry refresh. The entry
/// list is kept between ticks to reuse its allocation.
#[derive(Debug, Default)]
pub struct BruteForceBroadphase {
    entries: Vec<BroadphaseEntry>,
}

impl BruteForceBroadphase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn insert(&mut self, index: usize, aabb: PhysicsAabb, is_dynamic: bool) {
        self.entries.push(BroadphaseEntry {
            index,
            aabb,
            is_dynamic,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Call `f(index_a, index_b)` for every overlapping pair, in insertion
    /// order with `a` inserted before `b`.
    ///
    /// Static-static pairs are skipped before the AABB test. Returns the
    /// number of pairs that reached the AABB test.
    pub fn for_each_pair(&self, mut f: impl FnMut(usize, usize)) -> usize {
        let mut tested = 0;
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if !a.is_dynamic && !b.is_dynamic {
                    continue;
                }
                tested += 1;
                if a.aabb.overlaps(&b.aabb) {
                    f(a.index, b.index);
                }
            }
        }
        tested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn aabb(center: Vec3, half: f32) -> PhysicsAabb {
        PhysicsAabb {
            min: center - Vec3::splat(half),
            max: center + Vec3::splat(half),
        }
    }

    fn collect_pairs(broadphase: &BruteForceBroadphase) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        broadphase.for_each_pair(|a, b| pairs.push((a, b)));
        pairs
    }

    #[test]
    fn test_broadphase_overlapping() {
        let mut broadphase = BruteForceBroadphase::new();
        broadphase.insert(0, aabb(Vec3::ZERO, 1.0), true);
        broadphase.insert(1, aabb(Vec3::new(1.0, 0.0, 0.0), 1.0), true);

        assert_eq!(collect_pairs(&broadphase), vec![(0, 1)]);
    }

    #[test]
    fn test_broadphase_no_overlap() {
        let mut broadphase = BruteForceBroadphase::new();
        broadphase.insert(0, aabb(Vec3::ZERO, 0.5), true);
        broadphase.insert(1, aabb(Vec3::new(10.0, 0.0, 0.0), 0.5), true);

        let mut calls = 0;
        let tested = broadphase.for_each_pair(|_, _| calls += 1);
        assert_eq!(tested, 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_broadphase_skips_static_pairs() {
        let mut broadphase = BruteForceBroadphase::new();
        broadphase.insert(0, aabb(Vec3::ZERO, 1.0), false);
        broadphase.insert(1, aabb(Vec3::ZERO, 1.0), false);
        broadphase.insert(2, aabb(Vec3::ZERO, 1.0), true);

        let mut pairs = Vec::new();
        let tested = broadphase.for_each_pair(|a, b| pairs.push((a, b)));
        assert_eq!(tested, 2);
        assert_eq!(pairs, vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn test_broadphase_keeps_slot_indices() {
        let mut broadphase = BruteForceBroadphase::new();
        broadphase.insert(7, aabb(Vec3::ZERO, 1.0), true);
        broadphase.insert(3, aabb(Vec3::new(0.0, 1.5, 0.0), 1.0), false);
        assert_eq!(collect_pairs(&broadphase), vec![(7, 3)]);

        broadphase.clear();
        assert!(broadphase.is_empty());
        assert!(collect_pairs(&broadphase).is_empty());
    }
}
