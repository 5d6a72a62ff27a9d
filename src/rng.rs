/*
 * Random Population Module
 *
 * The population generator is always constructed from an explicit seed and
 * passed in; nothing in the crate draws from thread-local randomness.
 */

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Normal};

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::{FlockError, Result};

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

// Independent normal distribution per axis
struct AxisNormal([Normal<f32>; 3]);

impl AxisNormal {
    fn new(mean: Vec3, stddev: Vec3) -> Result<Self> {
        let axis = |m: f32, s: f32| {
            Normal::new(m, s).map_err(|e| FlockError::invalid(format!("spawn distribution: {e}")))
        };
        Ok(Self([
            axis(mean.x, stddev.x)?,
            axis(mean.y, stddev.y)?,
            axis(mean.z, stddev.z)?,
        ]))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(self.0[0].sample(rng), self.0[1].sample(rng), self.0[2].sample(rng))
    }
}

// Spawn the population: the predator first (AgentId 0), then num_prey prey.
// Prey velocities are clamped to max_speed on construction.
pub fn spawn_population<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Vec<Agent>> {
    let params = &config.params;
    let positions = AxisNormal::new(config.spawn_mean, config.spawn_stddev)?;
    let velocities = AxisNormal::new(Vec3::ZERO, config.velocity_stddev)?;

    let mut agents = Vec::with_capacity(config.num_prey + 1);

    let mut predator = Agent::predator(config.predator_start, params.max_speed, params.max_acceleration);
    predator.set_acceleration(config.predator_acceleration);
    agents.push(predator);

    for _ in 0..config.num_prey {
        let position = positions.sample(rng);
        let velocity = velocities.sample(rng);
        agents.push(Agent::prey(position, velocity, params.max_speed, params.max_acceleration));
    }

    Ok(agents)
}
