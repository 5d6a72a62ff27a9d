/*
 * Debug Information Module
 *
 * Per-tick timing and index diagnostics reported by the simulator.
 *
 * Includes metrics for:
 * - Index rebuild time and agent update time
 * - How many agents the octree actually holds this tick
 * - Whether the tick blew the frame budget
 */

use std::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct TickStats {
    pub tick: u64,
    pub build_time: Duration,
    pub update_time: Duration,
    pub total_time: Duration,
    pub budget: Duration,
    pub over_budget: bool,
    /// Agents represented in the index (out-of-bounds agents are not).
    pub indexed_agents: usize,
    pub index_nodes: usize,
    pub index_depth: u32,
    pub control_applied: bool,
}

impl TickStats {
    pub fn total_ms(&self) -> f64 {
        self.total_time.as_secs_f64() * 1000.0
    }
}
