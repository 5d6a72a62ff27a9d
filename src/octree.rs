/*
 * Octree Module
 *
 * This module defines the Octree spatial index used for neighbor lookups.
 * It recursively splits the world box into 8 octants so a range query only
 * visits nodes whose box intersects the query sphere, instead of scanning
 * the whole population.
 *
 * The tree borrows a snapshot of the population for exactly one tick and is
 * rebuilt from scratch on the next one:
 * - Nodes live in a flat arena and refer to their children by index
 * - Agents are stored as AgentId handles into the snapshot
 * - Agents outside the root box are dropped, not errored
 */

use std::f32::consts::TAU;

use glam::Vec3;

use crate::agent::{Agent, AgentId};
use crate::bounds::Aabb;
use crate::error::{FlockError, Result};

pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// View angle that disables heading filtering.
pub const FULL_CIRCLE: f32 = TAU;

/// Common behaviour of the neighbor lookups the simulator can use.
pub trait NeighborQuery {
    /// Appends to `out` every agent within `radius` of `agent` whose direction
    /// lies within `view_angle / 2` of `agent`'s heading. Never includes `agent`.
    fn query(&self, agent: AgentId, radius: f32, view_angle: f32, out: &mut Vec<AgentId>);
}

// Distance + heading cone test shared by the tree and the brute-force scan.
// A zero heading, or a candidate at the exact same position, skips the cone test.
#[inline]
pub fn in_view(origin: Vec3, heading: Option<Vec3>, candidate: Vec3, radius: f32, view_angle: f32) -> bool {
    let offset = candidate - origin;
    if offset.length_squared() > radius * radius {
        return false;
    }
    if view_angle >= FULL_CIRCLE {
        return true;
    }
    match (heading, offset.try_normalize()) {
        (Some(heading), Some(direction)) => {
            heading.dot(direction).clamp(-1.0, 1.0).acos() <= view_angle * 0.5
        }
        _ => true,
    }
}

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    depth: u32,
    contained: Vec<AgentId>,
    // Children occupy first_child..first_child + 8 in the arena
    first_child: Option<usize>,
}

impl Node {
    fn new(bounds: Aabb, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            contained: Vec::new(),
            first_child: None,
        }
    }
}

pub struct Octree<'a> {
    agents: &'a [Agent],
    nodes: Vec<Node>,
    capacity: usize,
    max_depth: u32,
    indexed: usize,
}

impl<'a> Octree<'a> {
    // Build the tree by inserting every agent of the snapshot into an empty root
    pub fn new(bounds: Aabb, capacity: usize, max_depth: u32, agents: &'a [Agent]) -> Result<Self> {
        if capacity == 0 {
            return Err(FlockError::invalid("octree node capacity must be positive"));
        }
        if max_depth == 0 {
            return Err(FlockError::invalid("octree max depth must be positive"));
        }
        if !bounds.is_valid() {
            return Err(FlockError::invalid("octree bounds must be finite with lower <= upper"));
        }

        let mut tree = Self {
            agents,
            nodes: vec![Node::new(bounds, 0)],
            capacity,
            max_depth,
            indexed: 0,
        };
        for id in 0..agents.len() {
            if tree.insert(id) {
                tree.indexed += 1;
            }
        }
        Ok(tree)
    }

    /// Number of agents represented in the tree.
    pub fn indexed_count(&self) -> usize {
        self.indexed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    // Returns false when the agent lies outside the root and is left untracked
    fn insert(&mut self, id: AgentId) -> bool {
        let position = self.agents[id].position();
        if !self.nodes[0].bounds.contains(position) {
            return false;
        }

        let mut current = 0;
        loop {
            let first_child = match self.nodes[current].first_child {
                Some(first_child) => first_child,
                None => {
                    let node = &self.nodes[current];
                    if node.contained.len() < self.capacity || node.depth >= self.max_depth {
                        self.nodes[current].contained.push(id);
                        return true;
                    }
                    self.subdivide(current)
                }
            };
            current = first_child + self.nodes[current].bounds.octant_of(position);
        }
    }

    // Split a full leaf into 8 octants and move its agents down
    fn subdivide(&mut self, index: usize) -> usize {
        let first_child = self.nodes.len();
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth + 1;

        for octant in 0..8 {
            self.nodes.push(Node::new(bounds.octant(octant), depth));
        }

        let migrating = std::mem::take(&mut self.nodes[index].contained);
        for id in migrating {
            let octant = bounds.octant_of(self.agents[id].position());
            self.nodes[first_child + octant].contained.push(id);
        }

        self.nodes[index].first_child = Some(first_child);
        first_child
    }
}

impl NeighborQuery for Octree<'_> {
    fn query(&self, agent: AgentId, radius: f32, view_angle: f32, out: &mut Vec<AgentId>) {
        let me = &self.agents[agent];
        let origin = me.position();
        let heading = me.velocity().try_normalize();
        let radius_sq = radius * radius;

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];

            // Prune on distance only; the cone is checked per candidate
            if node.bounds.distance_squared_to(origin) > radius_sq {
                continue;
            }

            for &other in &node.contained {
                if other == agent {
                    continue;
                }
                if in_view(origin, heading, self.agents[other].position(), radius, view_angle) {
                    out.push(other);
                }
            }

            if let Some(first_child) = node.first_child {
                stack.extend(first_child..first_child + 8);
            }
        }
    }
}

/// O(n) scan over the same snapshot with the same predicate as the tree.
/// Candidates outside `bounds` are skipped so results match the tree exactly.
pub struct BruteForce<'a> {
    pub agents: &'a [Agent],
    pub bounds: Aabb,
}

impl NeighborQuery for BruteForce<'_> {
    fn query(&self, agent: AgentId, radius: f32, view_angle: f32, out: &mut Vec<AgentId>) {
        let me = &self.agents[agent];
        let origin = me.position();
        let heading = me.velocity().try_normalize();

        for (other, candidate) in self.agents.iter().enumerate() {
            if other == agent || !self.bounds.contains(candidate.position()) {
                continue;
            }
            if in_view(origin, heading, candidate.position(), radius, view_angle) {
                out.push(other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn prey_at(x: f32, y: f32, z: f32, velocity: Vec3) -> Agent {
        Agent::prey(Vec3::new(x, y, z), velocity, 100.0, 100.0)
    }

    fn world() -> Aabb {
        Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0))
    }

    fn sorted(mut ids: Vec<AgentId>) -> Vec<AgentId> {
        ids.sort_unstable();
        ids
    }

    fn query_sorted(index: &dyn NeighborQuery, id: AgentId, radius: f32, angle: f32) -> Vec<AgentId> {
        let mut out = Vec::new();
        index.query(id, radius, angle, &mut out);
        sorted(out)
    }

    #[test]
    fn rejects_zero_capacity() {
        let agents = vec![prey_at(0.0, 0.0, 0.0, Vec3::ZERO)];
        assert!(Octree::new(world(), 0, DEFAULT_MAX_DEPTH, &agents).is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let agents: Vec<Agent> = Vec::new();
        let bounds = Aabb::new(Vec3::splat(1.0), Vec3::splat(-1.0));
        assert!(Octree::new(bounds, 4, DEFAULT_MAX_DEPTH, &agents).is_err());
    }

    #[test]
    fn subdivides_past_capacity() {
        let agents: Vec<Agent> = (0..20)
            .map(|i| prey_at(-9.0 + i as f32 * 0.9, 0.5, -0.5, Vec3::ZERO))
            .collect();
        let tree = Octree::new(world(), 2, DEFAULT_MAX_DEPTH, &agents).unwrap();
        assert_eq!(tree.indexed_count(), 20);
        assert!(tree.node_count() > 1);
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn coincident_agents_stop_at_max_depth() {
        let agents: Vec<Agent> = (0..50).map(|_| prey_at(1.0, 1.0, 1.0, Vec3::ZERO)).collect();
        let tree = Octree::new(world(), 1, 3, &agents).unwrap();
        assert_eq!(tree.indexed_count(), 50);
        assert!(tree.depth() <= 3);

        let found = query_sorted(&tree, 0, 0.1, FULL_CIRCLE);
        assert_eq!(found, (1..50).collect::<Vec<_>>());
    }

    #[test]
    fn every_indexed_agent_lives_in_exactly_one_node() {
        let agents: Vec<Agent> = (0..64)
            .map(|i| {
                let f = i as f32;
                prey_at((f * 1.7) % 19.0 - 9.5, (f * 3.1) % 19.0 - 9.5, (f * 0.7) % 19.0 - 9.5, Vec3::ZERO)
            })
            .collect();
        let tree = Octree::new(world(), 3, DEFAULT_MAX_DEPTH, &agents).unwrap();

        let mut seen: Vec<AgentId> = tree.nodes.iter().flat_map(|n| n.contained.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());

        for node in &tree.nodes {
            if node.first_child.is_some() {
                assert!(node.contained.is_empty());
            }
            for &id in &node.contained {
                assert!(node.bounds.contains(agents[id].position()));
            }
        }
    }

    #[test]
    fn agent_just_outside_upper_bound_is_dropped() {
        let agents = vec![
            prey_at(9.5, 0.0, 0.0, Vec3::ZERO),
            prey_at(10.0, 0.0, 0.0, Vec3::ZERO),
            prey_at(10.0 + 1e-3, 0.0, 0.0, Vec3::ZERO),
        ];
        let tree = Octree::new(world(), 4, DEFAULT_MAX_DEPTH, &agents).unwrap();
        assert_eq!(tree.indexed_count(), 2);

        let found = query_sorted(&tree, 0, 5.0, FULL_CIRCLE);
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn heading_cone_filters_candidates_behind() {
        let agents = vec![
            prey_at(0.0, 0.0, 0.0, Vec3::X),
            prey_at(1.0, 0.0, 0.0, Vec3::ZERO),
            prey_at(-1.0, 0.0, 0.0, Vec3::ZERO),
            prey_at(0.2, 1.0, 0.0, Vec3::ZERO),
        ];
        let tree = Octree::new(world(), 1, DEFAULT_MAX_DEPTH, &agents).unwrap();

        // Half-angle of π/2 keeps the mostly-sideways neighbor, drops the one behind
        assert_eq!(query_sorted(&tree, 0, 2.0, PI), vec![1, 3]);
        assert_eq!(query_sorted(&tree, 0, 2.0, PI / 2.0), vec![1]);
        assert_eq!(query_sorted(&tree, 0, 2.0, FULL_CIRCLE), vec![1, 2, 3]);
    }

    #[test]
    fn stationary_agent_sees_all_around() {
        let agents = vec![
            prey_at(0.0, 0.0, 0.0, Vec3::ZERO),
            prey_at(-1.0, 0.0, 0.0, Vec3::ZERO),
            prey_at(0.0, 0.0, 1.0, Vec3::ZERO),
        ];
        let tree = Octree::new(world(), 8, DEFAULT_MAX_DEPTH, &agents).unwrap();
        assert_eq!(query_sorted(&tree, 0, 2.0, 0.0), vec![1, 2]);
    }

    #[test]
    fn predators_are_indexed_like_prey() {
        let agents = vec![
            prey_at(0.0, 0.0, 0.0, Vec3::ZERO),
            Agent::predator(Vec3::new(0.5, 0.0, 0.0), 5.0, 5.0),
        ];
        let tree = Octree::new(world(), 8, DEFAULT_MAX_DEPTH, &agents).unwrap();
        let found = query_sorted(&tree, 0, 1.0, FULL_CIRCLE);
        assert_eq!(found, vec![1]);
        assert_eq!(agents[found[0]].role(), Role::Predator);
    }

    #[test]
    fn zero_width_world_indexes_every_agent_on_its_plane() {
        let bounds = Aabb::new(Vec3::new(-4.0, 2.0, 7.5), Vec3::new(4.0, 6.0, 7.5));
        let agents: Vec<Agent> = (0..30)
            .map(|i| prey_at(-4.0 + (i % 9) as f32, 2.0 + (i % 5) as f32, 7.5, Vec3::ZERO))
            .chain([prey_at(0.0, 4.0, 7.5 + 1e-3, Vec3::ZERO)])
            .collect();
        let tree = Octree::new(bounds, 1, 5, &agents).unwrap();
        let scan = BruteForce { agents: &agents, bounds };

        assert_eq!(tree.indexed_count(), 30);
        assert!(tree.depth() <= 5);
        for id in 0..agents.len() {
            assert_eq!(query_sorted(&tree, id, 1.5, FULL_CIRCLE), query_sorted(&scan, id, 1.5, FULL_CIRCLE));
        }
    }

    // Empty, thin or ordinary extent for one axis
    fn arb_extent() -> impl Strategy<Value = f32> {
        prop_oneof![Just(0.0f32), 1e-3f32..0.5, 0.5f32..30.0]
    }

    // Random box anywhere in space, plus agents drawn from a margin around it.
    // Some agents are snapped onto corners and midpoint planes.
    fn arb_world() -> impl Strategy<Value = (Aabb, Vec<Agent>)> {
        (
            (-50.0f32..50.0, -50.0f32..50.0, -50.0f32..50.0),
            (arb_extent(), arb_extent(), arb_extent()),
        )
            .prop_flat_map(|((x, y, z), (w, h, d))| {
                let lower = Vec3::new(x, y, z);
                let bounds = Aabb::new(lower, lower + Vec3::new(w, h, d));
                let agent = (
                    (-0.25f32..1.25, -0.25f32..1.25, -0.25f32..1.25),
                    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0),
                    any::<bool>(),
                )
                    .prop_map(move |((fx, fy, fz), (vx, vy, vz), snap)| {
                        let mut frac = Vec3::new(fx, fy, fz);
                        if snap {
                            frac = (frac * 2.0).round() * 0.5;
                        }
                        let position = bounds.lower + frac * bounds.size();
                        Agent::prey(position, Vec3::new(vx, vy, vz), 100.0, 100.0)
                    });
                proptest::collection::vec(agent, 1..100).prop_map(move |agents| (bounds, agents))
            })
    }

    proptest! {
        #[test]
        fn proptest_tree_matches_brute_force(
            (bounds, agents) in arb_world(),
            capacity in 1usize..6,
            max_depth in 1u32..=DEFAULT_MAX_DEPTH,
            radius_fraction in 0.0f32..0.6,
            angle in 0.0f32..TAU,
        ) {
            let radius = radius_fraction * bounds.size().max_element() + 0.1;
            let tree = Octree::new(bounds, capacity, max_depth, &agents).unwrap();
            let scan = BruteForce { agents: &agents, bounds };

            prop_assert!(tree.depth() <= max_depth);
            prop_assert_eq!(
                tree.indexed_count(),
                agents.iter().filter(|a| bounds.contains(a.position())).count()
            );
            for id in 0..agents.len() {
                prop_assert_eq!(
                    query_sorted(&tree, id, radius, angle),
                    query_sorted(&scan, id, radius, angle)
                );
            }
        }
    }
}
