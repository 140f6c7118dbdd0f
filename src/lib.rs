/*
 * Boid Flocking Engine - Module Definitions
 *
 * This file defines the module structure of the flocking engine. The pipeline
 * per tick is: spatial hash build -> parallel neighbor query and steering ->
 * integration -> buffer swap -> snapshot for renderers.
 */

// Re-export key components for easier access
pub use boid::Boid;
pub use debug::StepStats;
pub use error::{FlockError, Result};
pub use flock::Flock;
pub use params::{EdgeMode, ParamChanges, SimulationParams, SteeringMode, SteeringRules};
pub use physics::{FlockSimulation, StepPhase};
pub use snapshot::{FrameSnapshot, SnapshotEntry, SNAPSHOT_STRIDE};
pub use spatial_hash::{QueryBuffer, SpatialHash};

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod flock;
pub mod params;
pub mod physics;
pub mod rng;
pub mod snapshot;
pub mod spatial_hash;
pub mod steering;
