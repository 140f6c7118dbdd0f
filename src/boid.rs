/*
 * Boid Module
 *
 * This module defines the Boid struct: the kinematic state of one agent.
 * A boid accumulates forces during a tick and integrates them once:
 * 1. velocity += acceleration, clamped to the maximum speed
 * 2. position += velocity
 * 3. acceleration is cleared for the next tick
 */

use glam::Vec3;
use rand::Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Boid {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl Boid {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
        }
    }

    /// A boid placed uniformly inside `[0, bounds)` with a small random velocity.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Vec3, initial_speed: f32) -> Self {
        let position = Vec3::new(
            rng.gen::<f32>() * bounds.x,
            rng.gen::<f32>() * bounds.y,
            rng.gen::<f32>() * bounds.z,
        );

        // Random initial velocity in [-initial_speed, initial_speed] per axis
        let velocity = if initial_speed > 0.0 {
            Vec3::new(
                rng.gen_range(-initial_speed..=initial_speed),
                rng.gen_range(-initial_speed..=initial_speed),
                rng.gen_range(-initial_speed..=initial_speed),
            )
        } else {
            Vec3::ZERO
        };

        Self::new(position, velocity)
    }

    // Apply a force to the boid
    #[inline]
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    /// Advance one tick. The speed limit is isotropic: the velocity magnitude is
    /// clamped, not its components.
    pub fn integrate(&mut self, max_speed: f32) {
        self.velocity = limit_speed(self.velocity + self.acceleration, max_speed);
        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
    }

    /// Teleport any coordinate outside `[0, dimension]` to the opposite face.
    /// Coordinates exactly on a face stay where they are.
    pub fn wrap_bounds(&mut self, bounds: Vec3) {
        self.position.x = wrap_axis(self.position.x, bounds.x);
        self.position.y = wrap_axis(self.position.y, bounds.y);
        self.position.z = wrap_axis(self.position.z, bounds.z);
    }

    /// Soft-wall force pushing the boid back inside `[margin, dimension - margin]`.
    pub fn avoid_bounds(&self, bounds: Vec3, margin: f32, wall_force: f32) -> Vec3 {
        Vec3::new(
            avoid_axis(self.position.x, bounds.x, margin, wall_force),
            avoid_axis(self.position.y, bounds.y, margin, wall_force),
            avoid_axis(self.position.z, bounds.z, margin, wall_force),
        )
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

// `clamp_length_max` can land an ulp above the limit; shave until it holds
#[inline]
fn limit_speed(velocity: Vec3, max_speed: f32) -> Vec3 {
    let mut velocity = velocity.clamp_length_max(max_speed);
    while velocity.length() > max_speed {
        velocity *= 1.0 - f32::EPSILON;
    }
    velocity
}

#[inline]
fn wrap_axis(value: f32, dimension: f32) -> f32 {
    if value < 0.0 {
        dimension
    } else if value > dimension {
        0.0
    } else {
        value
    }
}

#[inline]
fn avoid_axis(value: f32, dimension: f32, margin: f32, wall_force: f32) -> f32 {
    if value < margin {
        (margin - value) * wall_force
    } else if value > dimension - margin {
        (dimension - margin - value) * wall_force
    } else {
        0.0
    }
}
