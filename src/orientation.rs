/*
 * Orientation Module
 *
 * Derives a render-only heading from the velocity. Orientation never feeds
 * back into the physics.
 */

use std::f32::consts::PI;

use glam::{Quat, Vec3};

/// Below this speed the previous orientation is kept.
pub const MIN_HEADING_SPEED: f32 = 1e-3;

// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
// Antiparallel inputs rotate by π about an arbitrary axis perpendicular to `from`.
pub fn shortest_arc(from: Vec3, to: Vec3) -> Quat {
    let dot = from.dot(to);
    if dot < -1.0 + 1e-6 {
        return Quat::from_axis_angle(from.any_orthonormal_vector(), PI);
    }
    if dot > 1.0 - 1e-6 {
        return Quat::IDENTITY;
    }
    let axis = from.cross(to);
    Quat::from_xyzw(axis.x, axis.y, axis.z, 1.0 + dot).normalize()
}

// Exponential approach toward `target`: after `time_constant` seconds about
// 63% of the remaining turn is done, whatever the tick size.
pub fn smooth_toward(current: Quat, target: Quat, dt: f32, time_constant: f32) -> Quat {
    let blend = 1.0 - (-dt / time_constant).exp();
    current.slerp(target, blend).normalize()
}

// New orientation for an agent moving at `velocity`, or None when too slow
pub fn heading_orientation(
    current: Quat,
    velocity: Vec3,
    model_forward: Vec3,
    dt: f32,
    time_constant: f32,
) -> Option<Quat> {
    if velocity.length() <= MIN_HEADING_SPEED {
        return None;
    }
    let target = shortest_arc(model_forward.normalize(), velocity.normalize());
    Some(smooth_toward(current, target, dt, time_constant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn shortest_arc_maps_axis_onto_target() {
        let to = Vec3::new(1.0, 2.0, -0.5).normalize();
        let q = shortest_arc(Vec3::NEG_Z, to);
        assert!(close(q * Vec3::NEG_Z, to));
    }

    #[test]
    fn antiparallel_turns_half_way_round() {
        let q = shortest_arc(Vec3::NEG_Z, Vec3::Z);
        assert!(close(q * Vec3::NEG_Z, Vec3::Z));
        assert!((q.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn smoothing_converges_and_is_step_independent() {
        let target = shortest_arc(Vec3::NEG_Z, Vec3::X);

        // One 0.2 s step vs. four 0.05 s steps land on the same rotation
        let single = smooth_toward(Quat::IDENTITY, target, 0.2, 0.2);
        let mut stepped = Quat::IDENTITY;
        for _ in 0..4 {
            stepped = smooth_toward(stepped, target, 0.05, 0.2);
        }
        assert!(single.angle_between(stepped) < 1e-3);

        let mut q = Quat::IDENTITY;
        for _ in 0..200 {
            q = smooth_toward(q, target, 0.05, 0.2);
        }
        assert!(q.angle_between(target) < 1e-3);
    }

    #[test]
    fn slow_agents_keep_their_orientation() {
        assert!(heading_orientation(Quat::IDENTITY, Vec3::splat(1e-4), Vec3::NEG_Z, 0.1, 0.2).is_none());
    }
}
