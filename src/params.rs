/*
 * Simulation Parameters Module
 *
 * This module defines the FlockParams struct: the tunable parameter vector
 * shared by every prey agent. Front ends adjust these at runtime; the
 * simulator validates them before pushing them onto the population.
 */

use std::f32::consts::{PI, TAU};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockParams {
    /// Personal-space radius used for separation (full circle, no heading filter).
    pub close_range: f32,
    /// Sight radius used for alignment and cohesion.
    pub visible_range: f32,
    /// Full opening angle of the forward view cone, in radians.
    pub visible_angle: f32,
    pub alignment_strength: f32,
    pub cohesion_strength: f32,
    pub separation_strength: f32,
    pub max_speed: f32,
    pub max_acceleration: f32,
    /// Extra separation multiplier applied to predators inside close range.
    pub predator_avoidance_weight: f32,
}

impl Default for FlockParams {
    fn default() -> Self {
        Self {
            close_range: 1.5,
            visible_range: 5.0,
            visible_angle: PI,
            alignment_strength: 1.0,
            cohesion_strength: 1.0,
            separation_strength: 1.5,
            max_speed: 8.0,
            max_acceleration: 15.0,
            predator_avoidance_weight: 2.0,
        }
    }
}

fn check(ok: bool, msg: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(FlockError::invalid(msg))
    }
}

impl FlockParams {
    // Reject values the steering pipeline cannot work with. Nothing is clamped here.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.close_range,
            self.visible_range,
            self.visible_angle,
            self.alignment_strength,
            self.cohesion_strength,
            self.separation_strength,
            self.max_speed,
            self.max_acceleration,
            self.predator_avoidance_weight,
        ];
        check(values.iter().all(|v| v.is_finite()), "flock parameters must be finite")?;
        check(self.close_range >= 0.0, "close_range must not be negative")?;
        check(self.visible_range >= 0.0, "visible_range must not be negative")?;
        check(
            (0.0..=TAU).contains(&self.visible_angle),
            "visible_angle must lie in [0, 2π]",
        )?;
        check(
            self.alignment_strength >= 0.0 && self.cohesion_strength >= 0.0 && self.separation_strength >= 0.0,
            "steering strengths must not be negative",
        )?;
        check(self.max_speed > 0.0, "max_speed must be positive")?;
        check(self.max_acceleration >= 0.0, "max_acceleration must not be negative")?;
        check(
            self.predator_avoidance_weight >= 0.0,
            "predator_avoidance_weight must not be negative",
        )
    }

    // Documented ranges for UI sliders
    pub fn close_range_range() -> RangeInclusive<f32> {
        0.0..=10.0
    }

    pub fn visible_range_range() -> RangeInclusive<f32> {
        0.0..=20.0
    }

    pub fn visible_angle_range() -> RangeInclusive<f32> {
        0.0..=PI
    }

    pub fn strength_range() -> RangeInclusive<f32> {
        0.05..=10.0
    }

    pub fn max_speed_range() -> RangeInclusive<f32> {
        0.05..=30.0
    }

    pub fn max_acceleration_range() -> RangeInclusive<f32> {
        0.0..=30.0
    }

    pub fn predator_avoidance_range() -> RangeInclusive<f32> {
        0.0..=10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(FlockParams::default().validate().is_ok());
    }

    #[test]
    fn negative_radius_is_rejected() {
        let params = FlockParams {
            close_range: -0.1,
            ..FlockParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn angle_outside_full_turn_is_rejected() {
        let too_wide = FlockParams {
            visible_angle: TAU + 0.01,
            ..FlockParams::default()
        };
        assert!(too_wide.validate().is_err());

        let full = FlockParams {
            visible_angle: TAU,
            ..FlockParams::default()
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn nan_is_rejected() {
        let params = FlockParams {
            cohesion_strength: f32::NAN,
            ..FlockParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_max_speed_is_rejected() {
        let params = FlockParams {
            max_speed: 0.0,
            ..FlockParams::default()
        };
        assert!(params.validate().is_err());
    }
}
