/*
 * Agent Module
 *
 * This module defines the Agent struct, the plain per-entity record the
 * simulator steps every tick. Renderers look agents up by AgentId and read
 * position/orientation; nothing else about rendering lives here.
 *
 * Speed and acceleration limits are enforced by clamping on every write:
 * - |velocity| <= max_speed
 * - |acceleration| <= max_acceleration
 */

use glam::{Quat, Vec3};

use crate::error::{FlockError, Result};

/// Index of an agent in the simulator's population.
pub type AgentId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Prey,
    /// Driven purely by external control; never steers with the flock.
    Predator,
}

#[derive(Clone, Debug)]
pub struct Agent {
    role: Role,
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    orientation: Quat,
    max_speed: f32,
    max_acceleration: f32,
    close_range: f32,
    visible_range: f32,
    visible_angle: f32,
}

// Shared clamp used by both velocity and acceleration writes.
// A limit that is not positive (or NaN) clamps to zero, never flipping direction.
#[inline]
pub fn clamp_length(v: Vec3, max: f32) -> Vec3 {
    if !(max > 0.0) {
        return Vec3::ZERO;
    }
    let length_squared = v.length_squared();
    if length_squared > max * max {
        if length_squared > 0.0 {
            v * (max / length_squared.sqrt())
        } else {
            Vec3::ZERO
        }
    } else {
        v
    }
}

fn non_negative(value: f32) -> f32 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

impl Agent {
    // Limits that are negative or NaN are stored as zero
    pub fn new(role: Role, position: Vec3, max_speed: f32, max_acceleration: f32) -> Self {
        Self {
            role,
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            max_speed: non_negative(max_speed),
            max_acceleration: non_negative(max_acceleration),
            close_range: 1.5,
            visible_range: 5.0,
            visible_angle: std::f32::consts::PI,
        }
    }

    pub fn prey(position: Vec3, velocity: Vec3, max_speed: f32, max_acceleration: f32) -> Self {
        let mut agent = Self::new(Role::Prey, position, max_speed, max_acceleration);
        agent.set_velocity(velocity);
        agent
    }

    pub fn predator(position: Vec3, max_speed: f32, max_acceleration: f32) -> Self {
        Self::new(Role::Predator, position, max_speed, max_acceleration)
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    #[inline]
    pub fn visible_angle(&self) -> f32 {
        self.visible_angle
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn max_acceleration(&self) -> f32 {
        self.max_acceleration
    }

    pub fn close_range(&self) -> f32 {
        self.close_range
    }

    pub fn visible_range(&self) -> f32 {
        self.visible_range
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    // Stores the velocity, scaled down to max_speed if it is too fast
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = clamp_length(velocity, self.max_speed);
    }

    pub fn set_acceleration(&mut self, acceleration: Vec3) {
        self.acceleration = clamp_length(acceleration, self.max_acceleration);
    }

    // Clamped into [0, 2π]
    pub fn set_visible_angle(&mut self, angle: f32) {
        self.visible_angle = angle.clamp(0.0, std::f32::consts::TAU);
    }

    // Rejects a non-positive speed limit or a negative acceleration limit, then
    // re-clamps the current velocity and acceleration under the new limits
    pub fn set_limits(&mut self, max_speed: f32, max_acceleration: f32) -> Result<()> {
        if !(max_speed.is_finite() && max_speed > 0.0) {
            return Err(FlockError::invalid("agent max_speed must be positive"));
        }
        if !(max_acceleration.is_finite() && max_acceleration >= 0.0) {
            return Err(FlockError::invalid("agent max_acceleration must not be negative"));
        }
        self.max_speed = max_speed;
        self.max_acceleration = max_acceleration;
        self.enforce_limits();
        Ok(())
    }

    // Both radii are checked before either is stored
    pub fn set_perception(&mut self, close_range: f32, visible_range: f32) -> Result<()> {
        for (name, radius) in [("close_range", close_range), ("visible_range", visible_range)] {
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(FlockError::invalid(format!("agent {name} must be a non-negative number")));
            }
        }
        self.close_range = close_range;
        self.visible_range = visible_range;
        Ok(())
    }

    fn enforce_limits(&mut self) {
        self.velocity = clamp_length(self.velocity, self.max_speed);
        self.acceleration = clamp_length(self.acceleration, self.max_acceleration);
    }
}
