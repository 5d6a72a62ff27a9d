/*
 * Steering Module
 *
 * The flocking rules as pure functions over the tick snapshot:
 * 1. Separation: move away from everyone in close range, harder from predators
 * 2. Alignment: match the average velocity of visible prey
 * 3. Cohesion: move toward the centroid of visible prey
 * plus soft boundary steering that pushes agents back from the world edges.
 */

use glam::Vec3;

use crate::agent::{Agent, AgentId, Role};
use crate::bounds::Aabb;
use crate::params::FlockParams;

// The individual terms before weighting, kept separately for inspection
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub boundary: Vec3,
}

impl SteeringForces {
    // Weighted sum; clamping to max_acceleration happens on the agent
    pub fn combined(&self, params: &FlockParams) -> Vec3 {
        self.separation * params.separation_strength
            + self.alignment * params.alignment_strength
            + self.cohesion * params.cohesion_strength
            + self.boundary
    }
}

// Sum of offsets away from every close neighbor. A predator neighbor adds an
// extra offset scaled by predator_avoidance_weight on top of its plain one.
pub fn separation(me: &Agent, agents: &[Agent], close: &[AgentId], predator_avoidance_weight: f32) -> Vec3 {
    let mut steering = Vec3::ZERO;
    for &id in close {
        let other = &agents[id];
        let away = me.position() - other.position();
        steering += away;
        match other.role() {
            Role::Prey => {}
            Role::Predator => steering += away * predator_avoidance_weight,
        }
    }
    steering
}

// Average velocity of visible prey minus our own; zero when nobody is visible
pub fn alignment(me: &Agent, agents: &[Agent], visible: &[AgentId]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for &id in visible {
        let other = &agents[id];
        match other.role() {
            Role::Prey => {
                sum += other.velocity();
                count += 1;
            }
            Role::Predator => {}
        }
    }

    if count > 0 {
        sum / count as f32 - me.velocity()
    } else {
        Vec3::ZERO
    }
}

// Centroid of visible prey minus our position; zero when nobody is visible
pub fn cohesion(me: &Agent, agents: &[Agent], visible: &[AgentId]) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0;
    for &id in visible {
        let other = &agents[id];
        match other.role() {
            Role::Prey => {
                sum += other.position();
                count += 1;
            }
            Role::Predator => {}
        }
    }

    if count > 0 {
        sum / count as f32 - me.position()
    } else {
        Vec3::ZERO
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BoundarySteering {
    pub bounds: Aabb,
    pub margin: f32,
    pub turn_factor: f32,
}

impl BoundarySteering {
    // Per axis: restoring acceleration proportional to how deep the position
    // sits inside the margin band (or beyond the bound itself)
    pub fn force(&self, position: Vec3) -> Vec3 {
        let inner_lower = self.bounds.lower + Vec3::splat(self.margin);
        let inner_upper = self.bounds.upper - Vec3::splat(self.margin);

        let mut force = Vec3::ZERO;
        for axis in 0..3 {
            if position[axis] < inner_lower[axis] {
                force[axis] += self.turn_factor * (inner_lower[axis] - position[axis]);
            }
            if position[axis] > inner_upper[axis] {
                force[axis] -= self.turn_factor * (position[axis] - inner_upper[axis]);
            }
        }
        force
    }
}

pub fn compute(
    me: &Agent,
    agents: &[Agent],
    close: &[AgentId],
    visible: &[AgentId],
    params: &FlockParams,
    boundary: &BoundarySteering,
) -> SteeringForces {
    SteeringForces {
        separation: separation(me, agents, close, params.predator_avoidance_weight),
        alignment: alignment(me, agents, visible),
        cohesion: cohesion(me, agents, visible),
        boundary: boundary.force(me.position()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prey(position: Vec3, velocity: Vec3) -> Agent {
        Agent::prey(position, velocity, 10.0, 10.0)
    }

    fn boundary() -> BoundarySteering {
        BoundarySteering {
            bounds: Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)),
            margin: 2.0,
            turn_factor: 0.5,
        }
    }

    #[test]
    fn separation_sums_offsets() {
        let agents = vec![
            prey(Vec3::ZERO, Vec3::ZERO),
            prey(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO),
            prey(Vec3::new(0.0, -1.0, 0.0), Vec3::ZERO),
        ];
        let s = separation(&agents[0], &agents, &[1, 2], 2.0);
        assert_eq!(s, Vec3::new(-0.5, 1.0, 0.0));
    }

    #[test]
    fn predator_offset_is_amplified() {
        let agents = vec![
            prey(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
            Agent::predator(Vec3::new(0.0, 0.5, 0.0), 10.0, 10.0),
        ];
        let away = Vec3::new(1.0, -0.5, 0.0);
        let s = separation(&agents[0], &agents, &[1], 2.0);
        assert!((s - (away + 2.0 * away)).length() < 1e-6);
    }

    #[test]
    fn no_visible_neighbors_means_no_alignment_or_cohesion() {
        let agents = vec![prey(Vec3::new(3.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 3.0))];
        assert_eq!(alignment(&agents[0], &agents, &[]), Vec3::ZERO);
        assert_eq!(cohesion(&agents[0], &agents, &[]), Vec3::ZERO);
    }

    #[test]
    fn alignment_and_cohesion_average_visible_prey() {
        let agents = vec![
            prey(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)),
            prey(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            prey(Vec3::new(0.0, 4.0, 0.0), Vec3::new(0.0, 3.0, 0.0)),
        ];
        let a = alignment(&agents[0], &agents, &[1, 2]);
        let c = cohesion(&agents[0], &agents, &[1, 2]);
        assert_eq!(a, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(c, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn predators_do_not_attract_or_align() {
        let agents = vec![
            prey(Vec3::ZERO, Vec3::X),
            Agent::predator(Vec3::new(1.0, 0.0, 0.0), 10.0, 10.0),
        ];
        assert_eq!(alignment(&agents[0], &agents, &[1]), Vec3::ZERO);
        assert_eq!(cohesion(&agents[0], &agents, &[1]), Vec3::ZERO);
    }

    #[test]
    fn boundary_pushes_inward_near_each_side() {
        let b = boundary();
        let near_lower = b.force(Vec3::new(-10.0 + 1.0, 0.0, 0.0));
        let near_upper = b.force(Vec3::new(10.0 - 1.0, 0.0, 0.0));
        assert!(near_lower.x > 0.0);
        assert!(near_upper.x < 0.0);
        assert!((near_lower.x - 0.5).abs() < 1e-6);
        assert_eq!(near_lower.y, 0.0);
    }

    #[test]
    fn boundary_is_zero_in_the_interior() {
        assert_eq!(boundary().force(Vec3::new(3.0, -5.0, 7.9)), Vec3::ZERO);
    }

    #[test]
    fn combined_weights_each_term() {
        let forces = SteeringForces {
            separation: Vec3::X,
            alignment: Vec3::Y,
            cohesion: Vec3::Z,
            boundary: Vec3::new(1.0, 1.0, 1.0),
        };
        let params = FlockParams {
            separation_strength: 2.0,
            alignment_strength: 3.0,
            cohesion_strength: 4.0,
            ..FlockParams::default()
        };
        assert_eq!(forces.combined(&params), Vec3::new(3.0, 4.0, 5.0));
    }
}
