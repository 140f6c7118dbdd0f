/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that holds every tunable value
 * of the flocking engine. Parameters are validated once when a simulation is
 * constructed, can be loaded from a JSON file, and can be compared between
 * frames so a host knows whether a change needs a rebuild or only new rules.
 */

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};

/// How the three flocking rules turn a neighborhood into a force.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SteeringMode {
    /// Raw rule vectors (offset sum, mean velocity, offset to centroid), each
    /// clamped to `max_force`.
    #[default]
    Direct,
    /// Desired-velocity steering: `normalize(direction) * max_speed - velocity`,
    /// clamped to `max_force`.
    Reynolds,
}

/// What happens to agents near or beyond the bounding box.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Teleport to the opposite face when a coordinate leaves `[0, dimension]`.
    #[default]
    Wrap,
    /// Push back with a soft wall force inside `wall_margin` of each face.
    Avoid,
    /// No bounds handling.
    Open,
}

/// Parameters for the simulation; all are validated by [`SimulationParams::validate`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationParams {
    /// Seed for population generation.
    pub seed: u64,
    /// Number of boids created by a fresh flock.
    pub num_boids: usize,
    /// Capacity the spatial hash is sized for.
    pub max_agents: usize,
    /// Edge length of a grid cell.
    pub cell_size: f32,
    /// Radius of the neighborhood each boid reacts to.
    pub neighbour_radius: f32,
    /// Separation only reacts to neighbors strictly closer than this.
    pub separation_radius: f32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Per-component bound of the initial random velocity.
    pub initial_speed: f32,
    /// Size of the world box; positions live in `[0, bounds]`.
    pub bounds: Vec3,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub steering_mode: SteeringMode,
    pub edge_mode: EdgeMode,
    /// Distance from a face at which `EdgeMode::Avoid` starts pushing.
    pub wall_margin: f32,
    /// Strength of the `EdgeMode::Avoid` push per unit of penetration.
    pub wall_force: f32,
    /// Worker pool size; 0 lets rayon pick one thread per core.
    pub worker_threads: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: 0x5EED_B01D,
            num_boids: 1000,
            max_agents: 15000,
            cell_size: 50.0,
            neighbour_radius: 50.0,
            separation_radius: 25.0,
            max_speed: 5.0,
            max_force: 0.05,
            initial_speed: 2.0,
            bounds: Vec3::new(1000.0, 600.0, 600.0),
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            steering_mode: SteeringMode::Direct,
            edge_mode: EdgeMode::Wrap,
            wall_margin: 50.0,
            wall_force: 0.5,
            worker_threads: 0,
        }
    }
}

/// The subset of parameters the steering evaluator needs per agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringRules {
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub separation_radius: f32,
    pub mode: SteeringMode,
}

impl Default for SteeringRules {
    fn default() -> Self {
        SimulationParams::default().steering_rules()
    }
}

/// Result of comparing two parameter sets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParamChanges {
    /// `num_boids` or `seed` changed; the population has to be regenerated.
    pub population: bool,
    /// Index or worker pool layout changed; the simulation has to be rebuilt.
    pub structure: bool,
    /// Anything that only affects steering, integration or bounds handling.
    pub rules: bool,
}

impl ParamChanges {
    pub fn any(&self) -> bool {
        self.population || self.structure || self.rules
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

impl SimulationParams {
    /// Reject every configuration the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_agents == 0 {
            return Err(FlockError::InvalidConfig("max_agents must be positive"));
        }
        if !positive(self.cell_size) {
            return Err(FlockError::InvalidConfig("cell_size must be positive"));
        }
        if !positive(self.neighbour_radius) {
            return Err(FlockError::InvalidConfig("neighbour_radius must be positive"));
        }
        if !(positive(self.separation_radius) && self.separation_radius <= self.neighbour_radius) {
            return Err(FlockError::InvalidConfig(
                "separation_radius must be positive and at most neighbour_radius",
            ));
        }
        if !positive(self.max_speed) {
            return Err(FlockError::InvalidConfig("max_speed must be positive"));
        }
        if !positive(self.max_force) {
            return Err(FlockError::InvalidConfig("max_force must be positive"));
        }
        if !(positive(self.bounds.x) && positive(self.bounds.y) && positive(self.bounds.z)) {
            return Err(FlockError::InvalidConfig("bounds must be positive on every axis"));
        }
        if !non_negative(self.initial_speed) {
            return Err(FlockError::InvalidConfig("initial_speed must not be negative"));
        }
        if !(non_negative(self.separation_weight)
            && non_negative(self.alignment_weight)
            && non_negative(self.cohesion_weight))
        {
            return Err(FlockError::InvalidConfig("rule weights must not be negative"));
        }
        if !(non_negative(self.wall_margin) && non_negative(self.wall_force)) {
            return Err(FlockError::InvalidConfig(
                "wall_margin and wall_force must not be negative",
            ));
        }
        if self.num_boids > self.max_agents {
            return Err(FlockError::CapacityExceeded {
                requested: self.num_boids,
                capacity: self.max_agents,
            });
        }
        Ok(())
    }

    /// Parse and validate parameters from JSON. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: SimulationParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn steering_rules(&self) -> SteeringRules {
        SteeringRules {
            separation_weight: self.separation_weight,
            alignment_weight: self.alignment_weight,
            cohesion_weight: self.cohesion_weight,
            max_speed: self.max_speed,
            max_force: self.max_force,
            separation_radius: self.separation_radius,
            mode: self.steering_mode,
        }
    }

    /// Classify what changed relative to `previous`.
    pub fn changes_from(&self, previous: &SimulationParams) -> ParamChanges {
        let population = self.num_boids != previous.num_boids || self.seed != previous.seed;

        let structure = self.max_agents != previous.max_agents
            || self.cell_size != previous.cell_size
            || self.worker_threads != previous.worker_threads;

        let rules = self.neighbour_radius != previous.neighbour_radius
            || self.separation_radius != previous.separation_radius
            || self.max_speed != previous.max_speed
            || self.max_force != previous.max_force
            || self.initial_speed != previous.initial_speed
            || self.bounds != previous.bounds
            || self.separation_weight != previous.separation_weight
            || self.alignment_weight != previous.alignment_weight
            || self.cohesion_weight != previous.cohesion_weight
            || self.steering_mode != previous.steering_mode
            || self.edge_mode != previous.edge_mode
            || self.wall_margin != previous.wall_margin
            || self.wall_force != previous.wall_force;

        ParamChanges {
            population,
            structure,
            rules,
        }
    }

    // Parameter ranges for UI sliders
    pub fn num_boids_range(&self) -> std::ops::RangeInclusive<usize> {
        0..=self.max_agents
    }

    pub fn separation_radius_range(&self) -> std::ops::RangeInclusive<f32> {
        1.0..=self.neighbour_radius.max(1.0)
    }

    pub fn max_speed_range() -> std::ops::RangeInclusive<f32> {
        0.5..=20.0
    }

    pub fn max_force_range() -> std::ops::RangeInclusive<f32> {
        0.01..=1.0
    }

    pub fn weight_range() -> std::ops::RangeInclusive<f32> {
        0.0..=3.0
    }

    pub fn radius_range() -> std::ops::RangeInclusive<f32> {
        1.0..=200.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_cell_size_and_radius() {
        let params = SimulationParams {
            cell_size: 0.0,
            ..SimulationParams::default()
        };
        assert!(matches!(params.validate(), Err(FlockError::InvalidConfig(_))));

        let params = SimulationParams {
            neighbour_radius: -1.0,
            ..SimulationParams::default()
        };
        assert!(matches!(params.validate(), Err(FlockError::InvalidConfig(_))));

        let params = SimulationParams {
            cell_size: f32::NAN,
            ..SimulationParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn separation_radius_must_fit_inside_neighborhood() {
        for separation_radius in [0.0, -1.0, 51.0, f32::NAN] {
            let params = SimulationParams {
                neighbour_radius: 50.0,
                separation_radius,
                ..SimulationParams::default()
            };
            assert!(
                matches!(params.validate(), Err(FlockError::InvalidConfig(_))),
                "{separation_radius}"
            );
        }

        let params = SimulationParams {
            separation_radius: 50.0,
            ..SimulationParams::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.steering_rules().separation_radius, 50.0);

        let changes = params.changes_from(&SimulationParams::default());
        assert!(changes.rules && !changes.structure && !changes.population);
    }

    #[test]
    fn rejects_zero_capacity_and_oversized_population() {
        let params = SimulationParams {
            max_agents: 0,
            num_boids: 0,
            ..SimulationParams::default()
        };
        assert!(matches!(params.validate(), Err(FlockError::InvalidConfig(_))));

        let params = SimulationParams {
            max_agents: 10,
            num_boids: 11,
            ..SimulationParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(FlockError::CapacityExceeded {
                requested: 11,
                capacity: 10
            })
        ));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let params = SimulationParams::from_json_str(
            r#"{ "num_boids": 42, "separation_radius": 12.5, "steering_mode": "reynolds", "edge_mode": "avoid", "bounds": [10.0, 20.0, 30.0] }"#,
        )
        .unwrap();
        assert_eq!(params.num_boids, 42);
        assert_eq!(params.separation_radius, 12.5);
        assert_eq!(params.steering_mode, SteeringMode::Reynolds);
        assert_eq!(params.edge_mode, EdgeMode::Avoid);
        assert_eq!(params.bounds, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(params.cell_size, SimulationParams::default().cell_size);

        let json = params.to_json_string().unwrap();
        assert_eq!(SimulationParams::from_json_str(&json).unwrap(), params);
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let err = SimulationParams::from_json_str(r#"{ "cell_size": -5.0 }"#).unwrap_err();
        assert!(matches!(err, FlockError::InvalidConfig(_)));

        let err = SimulationParams::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, FlockError::ConfigParse(_)));
    }

    #[test]
    fn change_detection_separates_population_structure_and_rules() {
        let base = SimulationParams::default();
        assert!(!base.changes_from(&base).any());

        let more = SimulationParams {
            num_boids: base.num_boids + 1,
            ..base.clone()
        };
        let changes = more.changes_from(&base);
        assert!(changes.population && !changes.structure && !changes.rules);

        let coarser = SimulationParams {
            cell_size: base.cell_size * 2.0,
            ..base.clone()
        };
        assert!(coarser.changes_from(&base).structure);

        let heavier = SimulationParams {
            separation_weight: 2.5,
            ..base.clone()
        };
        let changes = heavier.changes_from(&base);
        assert!(changes.rules && !changes.population && !changes.structure);
    }
}
