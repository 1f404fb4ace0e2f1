//! Spatial hash broad phase
//!
//! Space is divided into square cells of `cell_size`. Each body is inserted into
//! every cell its bounding box overlaps, and bodies sharing a cell become
//! candidate pairs. The index is rebuilt from scratch every step.

use std::collections::{HashMap, HashSet};

use super::body::{Aabb, BodyKey, RigidBody};
use crate::consts::CELL_SIZE;

/// Large primes for the 2D -> 1D cell hash
const HASH_PRIME_X: i32 = 92_837_111;
const HASH_PRIME_Y: i32 = 689_287_499;

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: BodyKey,
    id: u32,
}

/// Grid-based broad-phase index
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f32,
    inv_cell_size: f32,
    buckets: HashMap<i32, Vec<Entry>>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            buckets: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.values().filter(|b| !b.is_empty()).count()
    }

    /// Number of buckets held in the map, empty or not
    pub fn allocated_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Empty all buckets
    ///
    /// Buckets that were occupied keep their allocation for the next rebuild.
    /// Buckets already empty are dropped, so cells a body has left do not
    /// accumulate in the map.
    pub fn clear(&mut self) {
        self.buckets.retain(|_, bucket| {
            let keep = !bucket.is_empty();
            bucket.clear();
            keep
        });
    }

    #[inline]
    fn cell_coord(&self, v: f32) -> i32 {
        (v * self.inv_cell_size).floor() as i32
    }

    #[inline]
    fn hash(cx: i32, cy: i32) -> i32 {
        cx.wrapping_mul(HASH_PRIME_X)
            .wrapping_add(cy.wrapping_mul(HASH_PRIME_Y))
    }

    /// Inclusive cell coordinate range covered by a box
    pub fn cells_for(&self, aabb: &Aabb) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (min_cx, min_cy) = (self.cell_coord(aabb.min.x), self.cell_coord(aabb.min.y));
        let (max_cx, max_cy) = (self.cell_coord(aabb.max.x), self.cell_coord(aabb.max.y));
        (min_cy..=max_cy).flat_map(move |cy| (min_cx..=max_cx).map(move |cx| (cx, cy)))
    }

    /// Insert a body into every cell its bounding box overlaps
    pub fn insert<M>(&mut self, key: BodyKey, body: &RigidBody<M>) {
        let entry = Entry { key, id: body.id() };
        for (cx, cy) in self.cells_for(&body.aabb()) {
            let bucket = self.buckets.entry(Self::hash(cx, cy)).or_default();
            // Distinct cells can hash to the same bucket
            if bucket.last().is_none_or(|e| e.key != key) {
                bucket.push(entry);
            }
        }
    }

    /// Rebuild the index and return every pair of bodies sharing a cell
    ///
    /// Each pair appears once, lower id first, sorted by `(id_a, id_b)`.
    /// Pairs the collision filter rejects (both static, or the same negative
    /// group) are never returned.
    pub fn potential_pairs<'a, M: 'a>(
        &mut self,
        bodies: impl IntoIterator<Item = (BodyKey, &'a RigidBody<M>)>,
        lookup: impl Fn(BodyKey) -> Option<&'a RigidBody<M>>,
    ) -> Vec<(BodyKey, BodyKey)> {
        self.clear();
        for (key, body) in bodies {
            self.insert(key, body);
        }

        let mut seen: HashSet<(u32, u32)> = HashSet::new();
        let mut pairs: Vec<(u32, u32, BodyKey, BodyKey)> = Vec::new();

        for bucket in self.buckets.values() {
            for (i, a) in bucket.iter().enumerate() {
                for b in &bucket[i + 1..] {
                    let (lo, hi) = if a.id < b.id { (a, b) } else { (b, a) };
                    if !seen.insert((lo.id, hi.id)) {
                        continue;
                    }
                    let (Some(body_lo), Some(body_hi)) = (lookup(lo.key), lookup(hi.key)) else {
                        continue;
                    };
                    if body_lo.can_collide_with(body_hi) {
                        pairs.push((lo.id, hi.id, lo.key, hi.key));
                    }
                }
            }
        }

        pairs.sort_unstable_by_key(|&(a, b, _, _)| (a, b));
        pairs.into_iter().map(|(_, _, a, b)| (a, b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector2;
    use crate::physics::body::{BodyConfig, Shape};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;
    use slotmap::SlotMap;

    type Bodies = SlotMap<BodyKey, RigidBody>;

    fn add(bodies: &mut Bodies, shape: Shape, pos: Vector2, config: BodyConfig) -> BodyKey {
        let id = bodies.len() as u32 + 1;
        bodies.insert_with_key(|_| {
            let mut body = RigidBody::new(shape, pos, config);
            body.id = id;
            body
        })
    }

    fn pairs(hash: &mut SpatialHash, bodies: &Bodies) -> Vec<(BodyKey, BodyKey)> {
        hash.potential_pairs(bodies.iter(), |k| bodies.get(k))
    }

    #[test]
    fn test_insert_covers_cells() {
        let mut bodies = Bodies::with_key();
        // Spans x in [40, 60] and y in [40, 60]: four 50-unit cells
        let k = add(
            &mut bodies,
            Shape::circle(10.0),
            Vector2::new(50.0, 50.0),
            BodyConfig::default(),
        );
        let hash = SpatialHash::default();
        assert_eq!(hash.cells_for(&bodies[k].aabb()).count(), 4);

        let mut hash = SpatialHash::default();
        hash.insert(k, &bodies[k]);
        assert_eq!(hash.bucket_count(), 4);
    }

    #[test]
    fn test_negative_coordinates() {
        let hash = SpatialHash::default();
        let aabb = Aabb {
            min: Vector2::new(-10.0, -10.0),
            max: Vector2::new(-1.0, -1.0),
        };
        let cells: Vec<_> = hash.cells_for(&aabb).collect();
        assert_eq!(cells, vec![(-1, -1)]);
    }

    #[test]
    fn test_pair_reported_once_across_shared_cells() {
        let mut bodies = Bodies::with_key();
        // Both straddle the same four cells around (50, 50)
        add(&mut bodies, Shape::circle(10.0), Vector2::new(48.0, 48.0), BodyConfig::default());
        add(&mut bodies, Shape::circle(10.0), Vector2::new(52.0, 52.0), BodyConfig::default());

        let mut hash = SpatialHash::default();
        assert_eq!(pairs(&mut hash, &bodies).len(), 1);
    }

    #[test]
    fn test_distant_bodies_not_paired() {
        let mut bodies = Bodies::with_key();
        add(&mut bodies, Shape::circle(5.0), Vector2::new(10.0, 10.0), BodyConfig::default());
        add(&mut bodies, Shape::circle(5.0), Vector2::new(500.0, 500.0), BodyConfig::default());

        let mut hash = SpatialHash::default();
        assert!(pairs(&mut hash, &bodies).is_empty());
    }

    #[test]
    fn test_rebuild_drops_stale_membership() {
        let mut bodies = Bodies::with_key();
        let a = add(&mut bodies, Shape::circle(5.0), Vector2::new(10.0, 10.0), BodyConfig::default());
        add(&mut bodies, Shape::circle(5.0), Vector2::new(12.0, 10.0), BodyConfig::default());

        let mut hash = SpatialHash::default();
        assert_eq!(pairs(&mut hash, &bodies).len(), 1);

        bodies[a].position = Vector2::new(900.0, 900.0);
        assert!(pairs(&mut hash, &bodies).is_empty());
    }

    #[test]
    fn test_filter_excludes_pairs() {
        let mut bodies = Bodies::with_key();
        let group = BodyConfig::default().collision_group(-3);
        add(&mut bodies, Shape::circle(5.0), Vector2::new(10.0, 10.0), group.clone());
        add(&mut bodies, Shape::circle(5.0), Vector2::new(12.0, 10.0), group);
        add(&mut bodies, Shape::rectangle(20.0, 4.0), Vector2::new(200.0, 10.0), BodyConfig::default().fixed());
        add(&mut bodies, Shape::rectangle(20.0, 4.0), Vector2::new(205.0, 10.0), BodyConfig::default().fixed());

        let mut hash = SpatialHash::default();
        assert!(pairs(&mut hash, &bodies).is_empty());
    }

    #[test]
    fn test_pairs_sorted_lower_id_first() {
        let mut bodies = Bodies::with_key();
        for i in 0..5 {
            add(
                &mut bodies,
                Shape::circle(4.0),
                Vector2::new(10.0 + i as f32, 10.0),
                BodyConfig::default(),
            );
        }
        let mut hash = SpatialHash::default();
        let result = pairs(&mut hash, &bodies);
        assert_eq!(result.len(), 10);
        let ids: Vec<(u32, u32)> = result
            .iter()
            .map(|&(a, b)| (bodies[a].id(), bodies[b].id()))
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ids.iter().all(|(a, b)| a < b));
    }

    #[test]
    fn test_uniform_distribution_scales_linearly() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut counts = Vec::new();

        // Same density for both sizes: one body per 5,000 square units
        for n in [1000usize, 2000] {
            let side = (n as f32 * 5_000.0).sqrt();
            let mut bodies = Bodies::with_key();
            for _ in 0..n {
                let pos = Vector2::new(rng.random_range(0.0..side), rng.random_range(0.0..side));
                add(&mut bodies, Shape::circle(5.0), pos, BodyConfig::default());
            }
            let mut hash = SpatialHash::new(50.0);
            counts.push(pairs(&mut hash, &bodies).len());
        }

        // Naive bounds are 499,500 and 1,999,000
        assert!(counts[0] < 499_500 / 100, "pair count {} too high", counts[0]);
        assert!(counts[1] < 1_999_000 / 100, "pair count {} too high", counts[1]);
        // Doubling the body count roughly doubles the pairs
        assert!(counts[1] > counts[0], "pairs {:?}", counts);
        assert!(
            (counts[1] as f32) < counts[0] as f32 * 2.5,
            "pairs grew faster than linear: {:?}",
            counts
        );
    }

    #[test]
    fn test_map_stays_bounded_as_body_travels() {
        let mut bodies = Bodies::with_key();
        let ball = add(&mut bodies, Shape::circle(5.0), Vector2::ZERO, BodyConfig::default());
        add(
            &mut bodies,
            Shape::rectangle(100.0, 10.0),
            Vector2::new(0.0, -500.0),
            BodyConfig::default().fixed(),
        );

        let mut hash = SpatialHash::default();
        for i in 1..=2000 {
            bodies[ball].position = Vector2::new(0.0, i as f32 * 60.0);
            pairs(&mut hash, &bodies);
        }

        assert!(hash.bucket_count() <= 10);
        assert!(hash.allocated_buckets() < 100, "{} buckets held", hash.allocated_buckets());
    }
}
