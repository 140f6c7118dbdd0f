/*
 * Spatial Hash Module
 *
 * This module defines the SpatialHash struct for efficient neighbor lookups.
 * Space is divided into an unbounded grid of cubic cells; each cell is hashed
 * into a fixed table of 2 * max_agents buckets. Agent indices are stored in a
 * compressed (CSR) layout: `cell_start` holds prefix-summed bucket offsets and
 * `cell_entries` holds the indices grouped by bucket.
 *
 * Optimized for performance by:
 * - Allocating both arrays once and reusing them every tick
 * - Building with a counting sort (three linear passes, no per-cell Vecs)
 * - Comparing squared distances only
 */

use glam::{IVec3, Vec3};

use crate::error::{FlockError, Result};

// Large primes mixing the three integer cell coordinates
const HASH_PRIME_X: i32 = 92_837_111;
const HASH_PRIME_Y: i32 = 689_287_499;
const HASH_PRIME_Z: i32 = 283_923_481;

#[derive(Clone, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    table_size: usize,
    cell_start: Vec<usize>,
    cell_entries: Vec<usize>,
    len: usize,
}

/// Reusable scratch space for [`SpatialHash::query_with`].
///
/// One buffer per worker keeps queries allocation-free after warm-up.
#[derive(Clone, Debug, Default)]
pub struct QueryBuffer {
    buckets: Vec<usize>,
    indices: Vec<usize>,
}

impl QueryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(indices: usize) -> Self {
        Self {
            buckets: Vec::with_capacity(27),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Indices found by the most recent query.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl SpatialHash {
    pub fn new(cell_size: f32, max_agents: usize) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(FlockError::InvalidConfig("cell_size must be positive"));
        }
        if max_agents == 0 {
            return Err(FlockError::InvalidConfig("max_agents must be positive"));
        }
        let table_size = max_agents
            .checked_mul(2)
            .ok_or(FlockError::InvalidConfig("max_agents is too large"))?;

        Ok(Self {
            cell_size,
            table_size,
            cell_start: vec![0; table_size + 1],
            cell_entries: vec![0; max_agents],
            len: 0,
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Maximum number of agents a build accepts.
    pub fn capacity(&self) -> usize {
        self.cell_entries.len()
    }

    /// Number of agents placed by the last build.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // Convert world coordinates to integer grid coordinates
    #[inline]
    pub fn int_coord(&self, point: Vec3) -> IVec3 {
        IVec3::new(
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
            (point.z / self.cell_size).floor() as i32,
        )
    }

    /// Bucket of an integer cell. Distinct cells may share a bucket.
    #[inline]
    pub fn hash_coords(&self, cell: IVec3) -> usize {
        let h = cell.x.wrapping_mul(HASH_PRIME_X)
            ^ cell.y.wrapping_mul(HASH_PRIME_Y)
            ^ cell.z.wrapping_mul(HASH_PRIME_Z);
        h.unsigned_abs() as usize % self.table_size
    }

    #[inline]
    pub fn hash_position(&self, point: Vec3) -> usize {
        self.hash_coords(self.int_coord(point))
    }

    /// Agent indices stored in one bucket by the last build.
    pub fn bucket_entries(&self, bucket: usize) -> &[usize] {
        &self.cell_entries[self.cell_start[bucket]..self.cell_start[bucket + 1]]
    }

    /// Rebuild the table from scratch. Fails without truncating when there are
    /// more positions than the table was sized for; the index is left empty.
    pub fn build(&mut self, positions: &[Vec3]) -> Result<()> {
        self.cell_start.fill(0);
        self.len = 0;

        if positions.len() > self.cell_entries.len() {
            return Err(FlockError::CapacityExceeded {
                requested: positions.len(),
                capacity: self.cell_entries.len(),
            });
        }

        // Count agents per bucket
        for &position in positions {
            let h = self.hash_position(position);
            self.cell_start[h] += 1;
        }

        // Running sum: cell_start[h] becomes the end of bucket h
        let mut start = 0;
        for count in &mut self.cell_start[..self.table_size] {
            start += *count;
            *count = start;
        }
        self.cell_start[self.table_size] = start;

        // Fill entries, walking each bucket's end back to its start
        for (i, &position) in positions.iter().enumerate() {
            let h = self.hash_position(position);
            self.cell_start[h] -= 1;
            self.cell_entries[self.cell_start[h]] = i;
        }

        self.len = positions.len();
        Ok(())
    }

    /// All indices whose position lies within `max_dist` of `point` (inclusive).
    ///
    /// `positions` must be the slice the table was built from. The agent at
    /// `point`, if any, is included.
    pub fn query(&self, positions: &[Vec3], point: Vec3, max_dist: f32) -> Vec<usize> {
        let mut buffer = QueryBuffer::new();
        self.query_with(positions, point, max_dist, &mut buffer);
        buffer.indices
    }

    /// Allocation-reusing form of [`SpatialHash::query`]. Results come out in
    /// a fixed order (ascending bucket, then bucket order) for a given build.
    pub fn query_with<'b>(
        &self,
        positions: &[Vec3],
        point: Vec3,
        max_dist: f32,
        buffer: &'b mut QueryBuffer,
    ) -> &'b [usize] {
        buffer.indices.clear();
        buffer.buckets.clear();

        // Also rejects NaN
        if !(max_dist >= 0.0) || self.len == 0 {
            return &buffer.indices;
        }

        let max_dist_sq = max_dist * max_dist;
        let min = self.int_coord(point - Vec3::splat(max_dist));
        let max = self.int_coord(point + Vec3::splat(max_dist));

        let span = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1) as u64;
        let covered = span(min.x, max.x)
            .saturating_mul(span(min.y, max.y))
            .saturating_mul(span(min.z, max.z));

        let within = |id: usize| {
            positions
                .get(id)
                .map_or(false, |p| p.distance_squared(point) <= max_dist_sq)
        };

        // The range covers at least as many cells as there are buckets: every
        // bucket would be visited anyway, so scan the entries directly.
        if covered >= self.table_size as u64 {
            buffer
                .indices
                .extend(self.cell_entries[..self.len].iter().copied().filter(|&id| within(id)));
            return &buffer.indices;
        }

        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    buffer.buckets.push(self.hash_coords(IVec3::new(x, y, z)));
                }
            }
        }

        // Several cells of the range may share a bucket; scan each bucket once
        buffer.buckets.sort_unstable();
        buffer.buckets.dedup();

        for &bucket in &buffer.buckets {
            let start = self.cell_start[bucket];
            let end = self.cell_start[bucket + 1];
            for &id in &self.cell_entries[start..end] {
                if within(id) {
                    buffer.indices.push(id);
                }
            }
        }

        &buffer.indices
    }
}
