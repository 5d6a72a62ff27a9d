/*
 * Simulator Module
 *
 * This module defines the FlockSimulator, which owns the population and
 * advances it one tick at a time:
 * 1. Snapshot the population and rebuild the octree over the snapshot
 * 2. For every prey: query close and visible neighbors, combine steering
 * 3. Integrate every agent (semi-implicit Euler) and derive its heading
 * 4. Swap the new states in, then apply pending predator control
 * 5. Report ticks that overran the frame budget
 *
 * All reads in steps 2-3 go to the snapshot and all writes go to a fresh
 * buffer, so results do not depend on population order or on whether the
 * update runs on the rayon pool.
 */

use std::time::{Duration, Instant};

use glam::{Quat, Vec3};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::agent::{Agent, AgentId, Role};
use crate::config::SimConfig;
use crate::control::{ControlDirection, PendingControl};
use crate::debug::TickStats;
use crate::error::{FlockError, Result};
use crate::octree::{BruteForce, NeighborQuery, Octree, FULL_CIRCLE};
use crate::orientation::heading_orientation;
use crate::params::FlockParams;
use crate::rng::{create_rng, spawn_population};
use crate::steering::{self, BoundarySteering, SteeringForces};

pub struct FlockSimulator {
    config: SimConfig,
    agents: Vec<Agent>,
    predator: Option<AgentId>,
    control: PendingControl,
    stats: TickStats,
    budget: Duration,
    ticks: u64,
    overruns: u64,
}

// Neighbor sets of one agent for one tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    pub close: Vec<AgentId>,
    pub visible: Vec<AgentId>,
}

impl FlockSimulator {
    // Spawn one predator plus config.num_prey prey from the configured seed
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let agents = spawn_population(&config, &mut rng)?;
        Self::with_agents(config, agents)
    }

    // Use an explicit population; at most one agent may be a predator
    pub fn with_agents(config: SimConfig, agents: Vec<Agent>) -> Result<Self> {
        config.validate()?;
        let budget = config.frame_budget()?;

        let mut predators = agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| agent.role() == Role::Predator)
            .map(|(id, _)| id);
        let predator = predators.next();
        if predators.next().is_some() {
            return Err(FlockError::invalid("population may contain at most one predator"));
        }

        info!(
            agents = agents.len(),
            predator = predator.is_some(),
            seed = config.seed,
            "Creating flock simulator"
        );

        let params = config.params;
        let mut simulator = Self {
            config,
            agents,
            predator,
            control: PendingControl::default(),
            stats: TickStats::default(),
            budget,
            ticks: 0,
            overruns: 0,
        };
        simulator.apply_params(&params)?;
        Ok(simulator)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &FlockParams {
        &self.config.params
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Direct access for per-agent overrides through the agent's checked setters.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn predator_id(&self) -> Option<AgentId> {
        self.predator
    }

    pub fn predator(&self) -> Option<&Agent> {
        self.predator.and_then(|id| self.agents.get(id))
    }

    // What renderers read after every tick
    pub fn poses(&self) -> impl Iterator<Item = (AgentId, Vec3, Quat)> + '_ {
        self.agents
            .iter()
            .enumerate()
            .map(|(id, agent)| (id, agent.position(), agent.orientation()))
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn overrun_count(&self) -> u64 {
        self.overruns
    }

    // Validate, store and push the parameter vector onto the population
    pub fn set_params(&mut self, params: FlockParams) -> Result<()> {
        params.validate()?;
        if params != self.config.params {
            info!(?params, "Updating flock parameters");
        }
        self.apply_params(&params)?;
        self.config.params = params;
        Ok(())
    }

    fn apply_params(&mut self, params: &FlockParams) -> Result<()> {
        for agent in &mut self.agents {
            agent.set_limits(params.max_speed, params.max_acceleration)?;
            match agent.role() {
                Role::Prey => {
                    agent.set_perception(params.close_range, params.visible_range)?;
                    agent.set_visible_angle(params.visible_angle);
                }
                Role::Predator => {}
            }
        }
        Ok(())
    }

    pub fn set_use_spatial_index(&mut self, enabled: bool) {
        self.config.use_spatial_index = enabled;
    }

    pub fn set_parallel(&mut self, enabled: bool) {
        self.config.parallel = enabled;
    }

    pub fn set_predator_acceleration(&mut self, acceleration: Vec3) {
        if let Some(predator) = self.predator.and_then(|id| self.agents.get_mut(id)) {
            predator.set_acceleration(acceleration);
        }
    }

    /// Record a control direction for the next tick. The last one asserted wins.
    pub fn push_control(&mut self, direction: ControlDirection) {
        self.control.assert(direction);
    }

    pub fn pending_control(&self) -> Option<ControlDirection> {
        self.control.peek()
    }

    /// Advance by the configured fixed tick size.
    pub fn step(&mut self) -> &TickStats {
        self.tick(self.config.dt)
    }

    pub fn tick(&mut self, dt: f32) -> &TickStats {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(dt, "Ignoring invalid tick size; advancing by zero");
            0.0
        };

        let start = Instant::now();

        // Phase 1: snapshot + index
        let snapshot = self.agents.clone();
        let tree = self.build_tree(&snapshot);
        let scan = BruteForce {
            agents: &snapshot,
            bounds: self.config.bounds(),
        };
        let index: &(dyn NeighborQuery + Sync) = match &tree {
            Some(tree) => tree,
            None => &scan,
        };
        let build_time = start.elapsed();

        // Phase 2: compute every new state from the snapshot
        let update_start = Instant::now();
        let updated: Vec<Agent> = if self.config.parallel {
            (0..snapshot.len())
                .into_par_iter()
                .map(|id| self.advance_agent(id, &snapshot, index, dt))
                .collect()
        } else {
            (0..snapshot.len())
                .map(|id| self.advance_agent(id, &snapshot, index, dt))
                .collect()
        };

        let (indexed_agents, index_nodes, index_depth) = match &tree {
            Some(tree) => (tree.indexed_count(), tree.node_count(), tree.depth()),
            None => (
                snapshot.iter().filter(|a| scan.bounds.contains(a.position())).count(),
                0,
                0,
            ),
        };

        // Phase 3: swap in the new buffer, then predator control
        self.agents = updated;
        let control_applied = self.apply_control();
        let update_time = update_start.elapsed();

        let total_time = start.elapsed();
        let budget = self.budget;
        let over_budget = total_time > budget;

        self.ticks += 1;
        if over_budget {
            self.overruns += 1;
            warn!(
                tick = self.ticks,
                total_ms = total_time.as_secs_f64() * 1000.0,
                budget_ms = self.config.frame_budget_ms,
                agents = self.agents.len(),
                "Tick exceeded frame budget"
            );
        }
        debug!(
            tick = self.ticks,
            build_us = build_time.as_micros() as u64,
            update_us = update_time.as_micros() as u64,
            "Tick complete"
        );
        trace!(indexed_agents, index_nodes, index_depth, "Index statistics");

        self.stats = TickStats {
            tick: self.ticks,
            build_time,
            update_time,
            total_time,
            budget,
            over_budget,
            indexed_agents,
            index_nodes,
            index_depth,
            control_applied,
        };
        &self.stats
    }

    // None when the spatial index is disabled (or could not be built)
    fn build_tree<'a>(&self, snapshot: &'a [Agent]) -> Option<Octree<'a>> {
        if !self.config.use_spatial_index {
            return None;
        }
        match Octree::new(self.config.bounds(), self.config.node_capacity, self.config.max_depth, snapshot) {
            Ok(tree) => Some(tree),
            Err(err) => {
                warn!(%err, "Falling back to brute-force neighbor scan");
                None
            }
        }
    }

    fn boundary(&self) -> BoundarySteering {
        BoundarySteering {
            bounds: self.config.bounds(),
            margin: self.config.margin,
            turn_factor: self.config.turn_factor,
        }
    }

    fn neighborhood(agent: &Agent, id: AgentId, index: &dyn NeighborQuery) -> Neighborhood {
        let mut close = Vec::new();
        let mut visible = Vec::new();
        index.query(id, agent.close_range(), FULL_CIRCLE, &mut close);
        index.query(id, agent.visible_range(), agent.visible_angle(), &mut visible);
        Neighborhood { close, visible }
    }

    fn forces(&self, id: AgentId, snapshot: &[Agent], index: &dyn NeighborQuery) -> SteeringForces {
        let me = &snapshot[id];
        let neighborhood = Self::neighborhood(me, id, index);
        steering::compute(
            me,
            snapshot,
            &neighborhood.close,
            &neighborhood.visible,
            &self.config.params,
            &self.boundary(),
        )
    }

    fn advance_agent(&self, id: AgentId, snapshot: &[Agent], index: &dyn NeighborQuery, dt: f32) -> Agent {
        let mut agent = snapshot[id].clone();

        match agent.role() {
            Role::Prey => {
                let forces = self.forces(id, snapshot, index);
                agent.set_acceleration(forces.combined(&self.config.params));
            }
            // Keeps whatever acceleration was last supplied from outside
            Role::Predator => {}
        }

        agent.set_velocity(agent.velocity() + agent.acceleration() * dt);
        agent.set_position(agent.position() + agent.velocity() * dt);

        if let Some(orientation) = heading_orientation(
            agent.orientation(),
            agent.velocity(),
            self.config.model_forward,
            dt,
            self.config.orientation_time_constant,
        ) {
            agent.set_orientation(orientation);
        }

        agent
    }

    fn apply_control(&mut self) -> bool {
        let Some(direction) = self.control.take() else {
            return false;
        };
        let speed = self.config.predator_speed.unwrap_or(self.config.params.max_speed);
        match self.predator.and_then(|id| self.agents.get_mut(id)) {
            Some(predator) => {
                predator.set_velocity(direction.unit_vector() * speed);
                true
            }
            None => {
                debug!(?direction, "Control input ignored; no predator in the population");
                false
            }
        }
    }

    // Neighbor sets of `id` against the current population state
    pub fn neighbors(&self, id: AgentId) -> Option<Neighborhood> {
        let agent = self.agents.get(id)?;
        let tree = self.build_tree(&self.agents);
        let scan = BruteForce {
            agents: &self.agents,
            bounds: self.config.bounds(),
        };
        let index: &dyn NeighborQuery = match &tree {
            Some(tree) => tree,
            None => &scan,
        };
        let mut neighborhood = Self::neighborhood(agent, id, index);
        neighborhood.close.sort_unstable();
        neighborhood.visible.sort_unstable();
        Some(neighborhood)
    }

    // Unweighted steering terms `id` would receive if a tick ran now
    pub fn steering_for(&self, id: AgentId) -> Option<SteeringForces> {
        self.agents.get(id)?;
        let tree = self.build_tree(&self.agents);
        let scan = BruteForce {
            agents: &self.agents,
            bounds: self.config.bounds(),
        };
        let index: &dyn NeighborQuery = match &tree {
            Some(tree) => tree,
            None => &scan,
        };
        Some(self.forces(id, &self.agents, index))
    }
}
