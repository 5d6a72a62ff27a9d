/*
 * Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure for the 3D flocking core.
 * Rendering and on-screen controls are consumers of this crate; the optional
 * viewer module (feature "viewer") is one such consumer.
 */

// Re-export key components for easier access
pub use agent::{Agent, AgentId, Role};
pub use bounds::Aabb;
pub use config::SimConfig;
pub use control::ControlDirection;
pub use debug::TickStats;
pub use error::FlockError;
pub use octree::{BruteForce, NeighborQuery, Octree, FULL_CIRCLE};
pub use params::FlockParams;
pub use simulator::{FlockSimulator, Neighborhood};
pub use steering::SteeringForces;

// Define modules
pub mod agent;
pub mod bounds;
pub mod config;
pub mod control;
pub mod debug;
pub mod error;
pub mod octree;
pub mod orientation;
pub mod params;
pub mod rng;
pub mod simulator;
pub mod steering;

#[cfg(feature = "viewer")]
pub mod viewer;
