/*
 * Snapshot Module
 *
 * A read-only, tightly packed copy of every boid's position and velocity for
 * renderers. Each entry is eight f32s (position.xyz, 1.0, velocity.xyz, 1.0),
 * the same layout a GPU storage buffer of vec4 pairs expects, so a consumer can
 * upload `as_bytes()` as-is.
 */

use bytemuck::{Pod, Zeroable};

use crate::boid::Boid;

/// Floats per snapshot entry.
pub const SNAPSHOT_STRIDE: usize = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SnapshotEntry {
    pub position: [f32; 3],
    pub w: f32,
    pub velocity: [f32; 3],
    pub velocity_w: f32,
}

impl From<&Boid> for SnapshotEntry {
    fn from(boid: &Boid) -> Self {
        Self {
            position: boid.position.to_array(),
            w: 1.0,
            velocity: boid.velocity.to_array(),
            velocity_w: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
    tick: u64,
    entries: Vec<SnapshotEntry>,
}

impl FrameSnapshot {
    pub fn capture(boids: &[Boid], tick: u64) -> Self {
        let mut snapshot = Self::default();
        snapshot.refresh(boids, tick);
        snapshot
    }

    /// Overwrite with the given state, reusing the allocation.
    pub fn refresh(&mut self, boids: &[Boid], tick: u64) {
        self.tick = tick;
        self.entries.clear();
        self.entries.extend(boids.iter().map(SnapshotEntry::from));
    }

    /// Tick the snapshot was taken after.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Flat view with a stride of [`SNAPSHOT_STRIDE`] floats per boid.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.entries)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn flat_layout_has_stride_eight() {
        let boids = [
            Boid::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)),
            Boid::new(Vec3::new(7.0, 8.0, 9.0), Vec3::new(-1.0, -2.0, -3.0)),
        ];
        let snapshot = FrameSnapshot::capture(&boids, 12);
        assert_eq!(snapshot.tick(), 12);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.as_floats(),
            &[
                1.0, 2.0, 3.0, 1.0, 4.0, 5.0, 6.0, 1.0, //
                7.0, 8.0, 9.0, 1.0, -1.0, -2.0, -3.0, 1.0,
            ]
        );
        assert_eq!(snapshot.as_bytes().len(), 2 * SNAPSHOT_STRIDE * 4);
    }

    #[test]
    fn refresh_replaces_contents() {
        let mut snapshot = FrameSnapshot::capture(&[Boid::default(); 4], 0);
        snapshot.refresh(&[], 1);
        assert!(snapshot.is_empty());
        assert!(snapshot.as_floats().is_empty());
        assert_eq!(snapshot.tick(), 1);
    }
}
