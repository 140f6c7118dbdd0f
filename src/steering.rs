/*
 * Steering Module
 *
 * The three flocking rules, evaluated for one boid against its neighborhood:
 * 1. Separation: steer away from flockmates closer than the separation radius
 * 2. Alignment: steer towards the average heading of nearby flockmates
 * 3. Cohesion: steer towards the average position of nearby flockmates
 *
 * Every rule returns zero for an empty neighborhood, and any zero-length
 * direction contributes nothing instead of being normalized.
 */

use glam::Vec3;

use crate::boid::Boid;
use crate::params::{SteeringMode, SteeringRules};

/// Sum of offsets from each neighbor to `agent`. Not averaged, so the push
/// grows with crowd density.
pub fn separation(agent: &Boid, neighbors: &[Boid]) -> Vec3 {
    neighbors
        .iter()
        .fold(Vec3::ZERO, |sum, other| sum + (agent.position - other.position))
}

/// Offsets from the neighbors strictly closer than `radius`, skipping any that
/// share the agent's position.
fn close_offsets<'a>(
    agent: &'a Boid,
    neighbors: &'a [Boid],
    radius: f32,
) -> impl Iterator<Item = (Vec3, f32)> + 'a {
    let radius_squared = radius * radius;
    neighbors.iter().filter_map(move |other| {
        let diff = agent.position - other.position;
        let d_squared = diff.length_squared();
        (d_squared > 0.0 && d_squared < radius_squared).then_some((diff, d_squared))
    })
}

/// [`separation`] restricted to neighbors closer than `radius`.
pub fn separation_within(agent: &Boid, neighbors: &[Boid], radius: f32) -> Vec3 {
    close_offsets(agent, neighbors, radius).fold(Vec3::ZERO, |sum, (diff, _)| sum + diff)
}

/// Mean neighbor velocity.
pub fn alignment(neighbors: &[Boid]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let sum = neighbors.iter().fold(Vec3::ZERO, |sum, other| sum + other.velocity);
    sum / neighbors.len() as f32
}

/// Mean neighbor position (the raw centroid, not an offset).
pub fn cohesion(neighbors: &[Boid]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let sum = neighbors.iter().fold(Vec3::ZERO, |sum, other| sum + other.position);
    sum / neighbors.len() as f32
}

/// Weighted sum of the three rules, each clamped to `rules.max_force`.
///
/// `neighbors` must not contain `agent` itself. Only neighbors closer than
/// `rules.separation_radius` repel; cohesion pulls towards the centroid
/// (`centroid - position`).
pub fn total_steering(agent: &Boid, neighbors: &[Boid], rules: &SteeringRules) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }

    let (separation, alignment, cohesion) = match rules.mode {
        SteeringMode::Direct => direct_rules(agent, neighbors, rules),
        SteeringMode::Reynolds => reynolds_rules(agent, neighbors, rules),
    };

    separation * rules.separation_weight
        + alignment * rules.alignment_weight
        + cohesion * rules.cohesion_weight
}

fn direct_rules(agent: &Boid, neighbors: &[Boid], rules: &SteeringRules) -> (Vec3, Vec3, Vec3) {
    let away = separation_within(agent, neighbors, rules.separation_radius);
    (
        limit(away, rules.max_force),
        limit(alignment(neighbors), rules.max_force),
        limit(cohesion(neighbors) - agent.position, rules.max_force),
    )
}

fn reynolds_rules(agent: &Boid, neighbors: &[Boid], rules: &SteeringRules) -> (Vec3, Vec3, Vec3) {
    // Closer neighbors push harder: each offset is normalized and divided by distance
    let mut away = Vec3::ZERO;
    let mut count = 0;
    for (diff, d_squared) in close_offsets(agent, neighbors, rules.separation_radius) {
        away += diff / d_squared;
        count += 1;
    }
    if count > 0 {
        away /= count as f32;
    }

    (
        steer_towards(away, agent.velocity, rules),
        steer_towards(alignment(neighbors), agent.velocity, rules),
        steer_towards(cohesion(neighbors) - agent.position, agent.velocity, rules),
    )
}

// Steering = Desired - Velocity, with desired at full speed along `direction`
#[inline]
fn steer_towards(direction: Vec3, velocity: Vec3, rules: &SteeringRules) -> Vec3 {
    let length_squared = direction.length_squared();
    if !(length_squared > 0.0 && length_squared.is_finite()) {
        return Vec3::ZERO;
    }
    let desired = direction * (rules.max_speed / length_squared.sqrt());
    limit(desired - velocity, rules.max_force)
}

/// Clamp the length of `force` to `max_force`.
#[inline]
pub fn limit(force: Vec3, max_force: f32) -> Vec3 {
    force.clamp_length_max(max_force)
}
