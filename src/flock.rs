/*
 * Flock Module
 *
 * The Flock owns two boid buffers and alternates their roles every tick:
 * "current" is read by all workers, "next" is written one slot per boid, then
 * they swap. After each tick a snapshot of the new state is refreshed for
 * renderers, which may sample it less often than the simulation advances.
 */

use tracing::{debug, info};

use crate::boid::Boid;
use crate::debug::StepStats;
use crate::error::{FlockError, Result};
use crate::physics::FlockSimulation;
use crate::params::SimulationParams;
use crate::snapshot::FrameSnapshot;

pub struct Flock {
    simulation: FlockSimulation,
    current: Vec<Boid>,
    next: Vec<Boid>,
    snapshot: FrameSnapshot,
    tick: u64,
}

impl Flock {
    /// Build a simulation and a random population of `params.num_boids`.
    pub fn new(params: SimulationParams) -> Result<Self> {
        let count = params.num_boids;
        let simulation = FlockSimulation::new(params)?;
        let boids = simulation.initialize(count)?;
        info!(boids = count, "flock created");
        Ok(Self::with_simulation(simulation, boids))
    }

    /// Start from an existing population.
    pub fn from_boids(params: SimulationParams, boids: Vec<Boid>) -> Result<Self> {
        let simulation = FlockSimulation::new(params)?;
        if boids.len() > simulation.capacity() {
            return Err(FlockError::CapacityExceeded {
                requested: boids.len(),
                capacity: simulation.capacity(),
            });
        }
        Ok(Self::with_simulation(simulation, boids))
    }

    fn with_simulation(simulation: FlockSimulation, boids: Vec<Boid>) -> Self {
        let snapshot = FrameSnapshot::capture(&boids, 0);
        Self {
            next: Vec::with_capacity(boids.len()),
            current: boids,
            simulation,
            snapshot,
            tick: 0,
        }
    }

    /// Advance one tick and swap buffers.
    pub fn tick(&mut self) -> Result<()> {
        self.simulation.step_into(&self.current, &mut self.next)?;
        std::mem::swap(&mut self.current, &mut self.next);
        self.tick += 1;
        self.snapshot.refresh(&self.current, self.tick);
        Ok(())
    }

    /// Regenerate `count` boids from the seed, reallocating both buffers.
    pub fn resize(&mut self, count: usize) -> Result<()> {
        let boids = self.simulation.initialize(count)?;
        debug!(from = self.current.len(), to = count, "resized flock");
        self.current = boids;
        self.next = Vec::with_capacity(count);
        self.snapshot.refresh(&self.current, self.tick);
        Ok(())
    }

    /// Regenerate the population at its current size.
    pub fn reset(&mut self) -> Result<()> {
        self.resize(self.current.len())
    }

    /// Apply new parameters, rebuilding whatever the change requires.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<()> {
        let changes = params.changes_from(self.simulation.params());
        if !changes.any() {
            return Ok(());
        }

        if changes.structure {
            let count = self.current.len().min(params.max_agents);
            let simulation = FlockSimulation::new(params)?;
            self.current.truncate(count);
            self.snapshot.refresh(&self.current, self.tick);
            self.simulation = simulation;
            debug!("rebuilt simulation after structural change");
        } else {
            self.simulation.update_params(params)?;
        }

        if changes.population {
            self.resize(self.simulation.params().num_boids)?;
        }
        Ok(())
    }

    pub fn boids(&self) -> &[Boid] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn snapshot(&self) -> &FrameSnapshot {
        &self.snapshot
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn stats(&self) -> &StepStats {
        self.simulation.stats()
    }

    pub fn params(&self) -> &SimulationParams {
        self.simulation.params()
    }

    pub fn simulation(&self) -> &FlockSimulation {
        &self.simulation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn params() -> SimulationParams {
        SimulationParams {
            num_boids: 50,
            max_agents: 64,
            bounds: Vec3::splat(200.0),
            worker_threads: 1,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn tick_swaps_and_snapshots() {
        let mut flock = Flock::new(params()).unwrap();
        let before = flock.boids().to_vec();
        flock.tick().unwrap();
        assert_eq!(flock.tick_count(), 1);
        assert_eq!(flock.len(), 50);
        assert_ne!(flock.boids(), before.as_slice());
        assert_eq!(flock.snapshot().tick(), 1);
        assert_eq!(flock.snapshot().len(), 50);
        assert_eq!(flock.snapshot().entries()[0].position, flock.boids()[0].position.to_array());
    }

    #[test]
    fn resize_beyond_capacity_fails() {
        let mut flock = Flock::new(params()).unwrap();
        assert!(matches!(
            flock.resize(65),
            Err(FlockError::CapacityExceeded { .. })
        ));
        assert_eq!(flock.len(), 50);
        flock.resize(10).unwrap();
        assert_eq!(flock.len(), 10);
        assert_eq!(flock.snapshot().len(), 10);
    }

    #[test]
    fn reset_is_reproducible_from_seed() {
        let mut flock = Flock::new(params()).unwrap();
        let initial = flock.boids().to_vec();
        flock.tick().unwrap();
        flock.reset().unwrap();
        assert_eq!(flock.boids(), initial.as_slice());
    }

    #[test]
    fn set_params_handles_each_kind_of_change() {
        let mut flock = Flock::new(params()).unwrap();

        let mut next = params();
        next.alignment_weight = 0.25;
        flock.set_params(next.clone()).unwrap();
        assert_eq!(flock.params().alignment_weight, 0.25);
        assert_eq!(flock.len(), 50);

        next.num_boids = 20;
        flock.set_params(next.clone()).unwrap();
        assert_eq!(flock.len(), 20);

        next.cell_size = 25.0;
        flock.set_params(next).unwrap();
        assert_eq!(flock.simulation().spatial_hash().cell_size(), 25.0);
        flock.tick().unwrap();
    }

    #[test]
    fn from_boids_checks_capacity() {
        let boids = vec![Boid::default(); 65];
        assert!(Flock::from_boids(params(), boids).is_err());
    }
}
