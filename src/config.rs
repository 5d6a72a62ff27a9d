/*
 * Configuration Module
 *
 * Static configuration for a flock run: population and spawn distribution,
 * world bounds, tick size, octree tuning, predator setup and the initial
 * parameter vector. Loaded from JSON; every field falls back to its default.
 */

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::error::{FlockError, Result};
use crate::octree::{DEFAULT_CAPACITY, DEFAULT_MAX_DEPTH};
use crate::params::FlockParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the population generator.
    pub seed: u64,
    /// Number of prey; the predator is added on top.
    pub num_prey: usize,
    pub spawn_mean: Vec3,
    pub spawn_stddev: Vec3,
    /// Per-axis standard deviation of the initial prey velocity.
    pub velocity_stddev: Vec3,
    pub lower_bounds: Vec3,
    pub upper_bounds: Vec3,
    /// Width of the band inside the bounds where boundary steering kicks in.
    pub margin: f32,
    /// Restoring acceleration per unit of penetration into the margin.
    pub turn_factor: f32,
    /// Fixed tick size in seconds.
    pub dt: f32,
    pub node_capacity: usize,
    pub max_depth: u32,
    /// Target wall-clock time for one tick; overruns are logged.
    pub frame_budget_ms: f32,
    /// Time constant of the exponential turn toward the velocity direction.
    pub orientation_time_constant: f32,
    /// Model-space axis that should point along the velocity.
    pub model_forward: Vec3,
    pub predator_start: Vec3,
    /// Constant acceleration carried by the predator until overridden.
    pub predator_acceleration: Vec3,
    /// Speed the predator is set to by a control input; None uses max_speed.
    pub predator_speed: Option<f32>,
    /// Query the octree (true) or scan the whole population (false).
    pub use_spatial_index: bool,
    /// Compute agent updates on the rayon pool.
    pub parallel: bool,
    pub params: FlockParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_prey: 200,
            spawn_mean: Vec3::ZERO,
            spawn_stddev: Vec3::splat(10.0),
            velocity_stddev: Vec3::splat(10.0),
            lower_bounds: Vec3::splat(-40.0),
            upper_bounds: Vec3::splat(40.0),
            margin: 8.0,
            turn_factor: 1.0,
            dt: 0.05,
            node_capacity: DEFAULT_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            frame_budget_ms: 16.6,
            orientation_time_constant: 0.2,
            model_forward: Vec3::NEG_Z,
            predator_start: Vec3::ZERO,
            predator_acceleration: Vec3::ZERO,
            predator_speed: None,
            use_spatial_index: true,
            parallel: false,
            params: FlockParams::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.lower_bounds, self.upper_bounds)
    }

    // Wall-clock budget for one tick; must be positive and fit in a Duration
    pub fn frame_budget(&self) -> Result<Duration> {
        if !(self.frame_budget_ms.is_finite() && self.frame_budget_ms > 0.0) {
            return Err(FlockError::invalid("frame_budget_ms must be positive"));
        }
        Duration::try_from_secs_f32(self.frame_budget_ms / 1000.0)
            .map_err(|e| FlockError::invalid(format!("frame_budget_ms out of range: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;

        if !self.bounds().is_valid() {
            return Err(FlockError::invalid("world bounds must be finite with lower <= upper"));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(FlockError::invalid("margin must be a non-negative number"));
        }
        if !(self.turn_factor.is_finite() && self.turn_factor >= 0.0) {
            return Err(FlockError::invalid("turn_factor must be a non-negative number"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(FlockError::invalid("dt must be positive"));
        }
        if self.node_capacity == 0 {
            return Err(FlockError::invalid("node_capacity must be positive"));
        }
        if self.max_depth == 0 {
            return Err(FlockError::invalid("max_depth must be positive"));
        }
        self.frame_budget()?;
        if !(self.orientation_time_constant.is_finite() && self.orientation_time_constant > 0.0) {
            return Err(FlockError::invalid("orientation_time_constant must be positive"));
        }
        if self.model_forward.try_normalize().is_none() {
            return Err(FlockError::invalid("model_forward must be a non-zero vector"));
        }
        if !(self.spawn_mean.is_finite() && self.spawn_stddev.is_finite() && self.velocity_stddev.is_finite()) {
            return Err(FlockError::invalid("spawn distribution must be finite"));
        }
        if self.spawn_stddev.min_element() < 0.0 || self.velocity_stddev.min_element() < 0.0 {
            return Err(FlockError::invalid("spawn standard deviations must not be negative"));
        }
        if !(self.predator_start.is_finite() && self.predator_acceleration.is_finite()) {
            return Err(FlockError::invalid("predator start and acceleration must be finite"));
        }
        if let Some(speed) = self.predator_speed {
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(FlockError::invalid("predator_speed must be a non-negative number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = SimConfig::from_json_str(r#"{ "num_prey": 12, "params": { "max_speed": 3.0 } }"#).unwrap();
        assert_eq!(config.num_prey, 12);
        assert_eq!(config.params.max_speed, 3.0);
        assert_eq!(config.params.close_range, FlockParams::default().close_range);
        assert_eq!(config.node_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn json_round_trip_keeps_bounds() {
        let config = SimConfig::default();
        let parsed = SimConfig::from_json_str(&config.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed.bounds(), config.bounds());
    }

    #[test]
    fn zero_capacity_fails_fast() {
        let result = SimConfig::from_json_str(r#"{ "node_capacity": 0 }"#);
        assert!(matches!(result, Err(FlockError::InvalidConfig(_))));
    }

    #[test]
    fn inverted_bounds_fail_fast() {
        let config = SimConfig {
            lower_bounds: Vec3::new(0.0, -1.0, -1.0),
            upper_bounds: Vec3::new(-1.0, 1.0, 1.0),
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unrepresentable_frame_budget_fails_fast() {
        for frame_budget_ms in [1e30, f32::INFINITY, 0.0, -5.0] {
            let config = SimConfig {
                frame_budget_ms,
                ..SimConfig::default()
            };
            assert!(matches!(config.validate(), Err(FlockError::InvalidConfig(_))));
        }
        let config = SimConfig::default();
        let budget = config.frame_budget().unwrap();
        assert!(budget > Duration::from_millis(16) && budget < Duration::from_millis(17));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(SimConfig::from_json_str("{ nope"), Err(FlockError::Parse(_))));
    }
}
