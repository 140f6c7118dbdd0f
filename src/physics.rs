/*
 * Physics Module
 *
 * This module drives one simulation tick for a whole population:
 * 1. Build: copy positions into a scratch buffer and rebuild the spatial hash
 * 2. Compute: one task per boid queries its neighborhood and evaluates steering
 * 3. Integrate: the same task applies the force, clamps speed and handles bounds
 *
 * Tasks only read the previous buffer and the finished hash, and each writes
 * only its own slot of the next buffer. The result does not depend on the
 * number of worker threads.
 */

use std::time::Instant;

use glam::Vec3;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::boid::Boid;
use crate::debug::StepStats;
use crate::error::{FlockError, Result};
use crate::params::{EdgeMode, SimulationParams, SteeringRules};
use crate::rng::chunk_rng;
use crate::spatial_hash::{QueryBuffer, SpatialHash};
use crate::steering;

/// Boids generated per independent RNG stream during initialization.
const INIT_CHUNK_SIZE: usize = 1024;

/// Where the driver is within a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepPhase {
    #[default]
    Idle,
    Building,
    Computing,
    Integrated,
}

// Per-worker scratch reused across the boids a worker processes
struct WorkerScratch {
    query: QueryBuffer,
    neighbors: Vec<Boid>,
}

impl WorkerScratch {
    fn new() -> Self {
        Self {
            query: QueryBuffer::with_capacity(64),
            neighbors: Vec::with_capacity(64),
        }
    }
}

pub struct FlockSimulation {
    params: SimulationParams,
    rules: SteeringRules,
    spatial_hash: SpatialHash,
    positions: Vec<Vec3>,
    neighbor_counts: Vec<u32>,
    pool: rayon::ThreadPool,
    phase: StepPhase,
    stats: StepStats,
}

impl FlockSimulation {
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;

        let spatial_hash = SpatialHash::new(params.cell_size, params.max_agents)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.worker_threads)
            .thread_name(|i| format!("flock-worker-{i}"))
            .build()?;

        debug!(
            max_agents = params.max_agents,
            cell_size = params.cell_size,
            neighbour_radius = params.neighbour_radius,
            threads = pool.current_num_threads(),
            "created flock simulation"
        );

        Ok(Self {
            rules: params.steering_rules(),
            positions: Vec::with_capacity(params.max_agents),
            neighbor_counts: Vec::with_capacity(params.max_agents),
            params,
            spatial_hash,
            pool,
            phase: StepPhase::Idle,
            stats: StepStats::default(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn capacity(&self) -> usize {
        self.spatial_hash.capacity()
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Statistics of the most recent step.
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    pub fn spatial_hash(&self) -> &SpatialHash {
        &self.spatial_hash
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Replace the parameters that do not affect the index or the worker pool.
    ///
    /// Changing `max_agents`, `cell_size` or `worker_threads` needs a new
    /// simulation and is rejected here.
    pub fn update_params(&mut self, params: SimulationParams) -> Result<()> {
        params.validate()?;
        if params.changes_from(&self.params).structure {
            return Err(FlockError::InvalidConfig(
                "max_agents, cell_size and worker_threads require a new simulation",
            ));
        }
        self.rules = params.steering_rules();
        self.params = params;
        Ok(())
    }

    /// A fresh random population inside the configured bounds.
    ///
    /// Boids are generated in fixed-size chunks, each with its own RNG stream
    /// derived from the seed, so the result is the same for any thread count.
    pub fn initialize(&self, count: usize) -> Result<Vec<Boid>> {
        if count > self.capacity() {
            return Err(FlockError::CapacityExceeded {
                requested: count,
                capacity: self.capacity(),
            });
        }

        let bounds = self.params.bounds;
        let initial_speed = self.params.initial_speed;
        let seed = self.params.seed;

        let mut boids = vec![Boid::default(); count];
        self.pool.install(|| {
            boids
                .par_chunks_mut(INIT_CHUNK_SIZE)
                .enumerate()
                .for_each(|(chunk_idx, chunk)| {
                    let mut rng = chunk_rng(seed, chunk_idx);
                    for boid in chunk {
                        *boid = Boid::random(&mut rng, bounds, initial_speed);
                    }
                });
        });

        debug!(count, seed, "initialized population");
        Ok(boids)
    }

    /// Advance `current` by one tick, returning the next state.
    pub fn step(&mut self, current: &[Boid]) -> Result<Vec<Boid>> {
        let mut next = Vec::with_capacity(current.len());
        self.step_into(current, &mut next)?;
        Ok(next)
    }

    /// Advance `current` by one tick, writing the result into `next`.
    ///
    /// `next` is resized to match `current`; its previous contents are ignored.
    pub fn step_into(&mut self, current: &[Boid], next: &mut Vec<Boid>) -> Result<()> {
        if current.len() > self.capacity() {
            return Err(FlockError::CapacityExceeded {
                requested: current.len(),
                capacity: self.capacity(),
            });
        }

        // Build
        self.phase = StepPhase::Building;
        trace!(phase = ?self.phase, agents = current.len(), "rebuilding spatial hash");
        let build_started = Instant::now();

        self.positions.clear();
        self.positions.extend(current.iter().map(|boid| boid.position));
        if let Err(err) = self.spatial_hash.build(&self.positions) {
            self.phase = StepPhase::Idle;
            return Err(err);
        }
        let build_time = build_started.elapsed();

        // Compute and integrate
        self.phase = StepPhase::Computing;
        trace!(phase = ?self.phase, "computing steering");
        let compute_started = Instant::now();

        next.clear();
        next.resize(current.len(), Boid::default());
        self.neighbor_counts.clear();
        self.neighbor_counts.resize(current.len(), 0);

        let spatial_hash = &self.spatial_hash;
        let positions = &self.positions;
        let params = &self.params;
        let rules = &self.rules;
        let neighbor_counts = &mut self.neighbor_counts;

        self.pool.install(|| {
            next.par_iter_mut()
                .zip(neighbor_counts.par_iter_mut())
                .enumerate()
                .for_each_init(WorkerScratch::new, |scratch, (i, (slot, count))| {
                    let agent = &current[i];
                    let found = spatial_hash.query_with(
                        positions,
                        agent.position,
                        params.neighbour_radius,
                        &mut scratch.query,
                    );

                    scratch.neighbors.clear();
                    scratch
                        .neighbors
                        .extend(found.iter().filter(|&&id| id != i).map(|&id| current[id]));
                    *count = scratch.neighbors.len() as u32;

                    *slot = advance(agent, &scratch.neighbors, params, rules);
                });
        });

        self.phase = StepPhase::Integrated;
        let compute_time = compute_started.elapsed();

        self.stats = StepStats {
            tick: self.stats.tick + 1,
            agents: current.len(),
            build_time,
            compute_time,
            total_neighbors: self.neighbor_counts.iter().map(|&c| u64::from(c)).sum(),
        };
        trace!(
            phase = ?self.phase,
            tick = self.stats.tick,
            avg_neighbors = self.stats.average_neighbors(),
            "step complete"
        );

        self.phase = StepPhase::Idle;
        Ok(())
    }
}

// New state for one boid from its previous state and its neighborhood
#[inline]
fn advance(
    agent: &Boid,
    neighbors: &[Boid],
    params: &SimulationParams,
    rules: &SteeringRules,
) -> Boid {
    let mut boid = *agent;
    boid.acceleration = Vec3::ZERO;

    boid.apply_force(steering::total_steering(agent, neighbors, rules));
    if params.edge_mode == EdgeMode::Avoid {
        boid.apply_force(boid.avoid_bounds(params.bounds, params.wall_margin, params.wall_force));
    }

    boid.integrate(params.max_speed);

    if params.edge_mode == EdgeMode::Wrap {
        boid.wrap_bounds(params.bounds);
    }
    boid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> SimulationParams {
        SimulationParams {
            num_boids: 200,
            max_agents: 256,
            cell_size: 10.0,
            neighbour_radius: 10.0,
            separation_radius: 5.0,
            bounds: Vec3::new(100.0, 80.0, 60.0),
            worker_threads: 2,
            ..SimulationParams::default()
        }
    }

    #[test]
    fn rejects_invalid_params() {
        let params = SimulationParams {
            neighbour_radius: 0.0,
            ..small_params()
        };
        assert!(matches!(
            FlockSimulation::new(params),
            Err(FlockError::InvalidConfig(_))
        ));
    }

    #[test]
    fn initialize_respects_capacity_and_bounds() {
        let sim = FlockSimulation::new(small_params()).unwrap();
        assert!(matches!(
            sim.initialize(257),
            Err(FlockError::CapacityExceeded { .. })
        ));

        let boids = sim.initialize(200).unwrap();
        assert_eq!(boids.len(), 200);
        let bounds = sim.params().bounds;
        for boid in &boids {
            assert!(boid.position.cmpge(Vec3::ZERO).all());
            assert!(boid.position.cmple(bounds).all());
        }
    }

    #[test]
    fn step_of_empty_population_is_empty() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let next = sim.step(&[]).unwrap();
        assert!(next.is_empty());
        assert_eq!(sim.stats().agents, 0);
        assert_eq!(sim.phase(), StepPhase::Idle);
    }

    #[test]
    fn step_over_capacity_fails() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let boids = vec![Boid::default(); 257];
        assert!(matches!(
            sim.step(&boids),
            Err(FlockError::CapacityExceeded {
                requested: 257,
                capacity: 256
            })
        ));
        assert_eq!(sim.phase(), StepPhase::Idle);
    }

    #[test]
    fn lone_boid_coasts() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let lone = Boid::new(Vec3::new(50.0, 40.0, 30.0), Vec3::new(1.0, 0.5, 0.0));
        let next = sim.step(&[lone]).unwrap();
        assert_eq!(next[0].velocity, lone.velocity);
        assert_eq!(next[0].position, lone.position + lone.velocity);
        assert_eq!(next[0].acceleration, Vec3::ZERO);
        assert_eq!(sim.stats().total_neighbors, 0);
    }

    #[test]
    fn neighbors_exclude_self() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let boids = [
            Boid::new(Vec3::new(10.0, 10.0, 10.0), Vec3::ZERO),
            Boid::new(Vec3::new(11.0, 10.0, 10.0), Vec3::ZERO),
        ];
        sim.step(&boids).unwrap();
        assert_eq!(sim.stats().total_neighbors, 2);
        assert_eq!(sim.stats().average_neighbors(), 1.0);
    }

    #[test]
    fn update_params_rejects_structural_changes() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let mut params = small_params();
        params.cohesion_weight = 2.0;
        sim.update_params(params.clone()).unwrap();
        assert_eq!(sim.params().cohesion_weight, 2.0);

        params.cell_size = 20.0;
        assert!(sim.update_params(params).is_err());
    }

    #[test]
    fn speed_bound_holds_over_many_ticks() {
        let mut sim = FlockSimulation::new(small_params()).unwrap();
        let mut boids = sim.initialize(200).unwrap();
        let max_speed = sim.params().max_speed;
        for _ in 0..50 {
            boids = sim.step(&boids).unwrap();
            for boid in &boids {
                assert!(boid.speed() <= max_speed);
            }
        }
        assert_eq!(sim.stats().tick, 50);
    }
}
