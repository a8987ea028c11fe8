//! RustCrowdPlanning - motion planning and crowd navigation for 3D agents
//!
//! This crate provides configuration spaces for spherical and line segment
//! agents among spherical obstacles, sampled roadmap and RRT* planners, and
//! local interaction models (time-to-collision, flocking) that move many
//! agents along their planned paths.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod configuration_space;
pub mod path_planning;
pub mod acting;

// Re-export common types for convenience
pub use common::{AgentDescription, Bounds, Metric, Obstacle, Path3D, Vec3};
pub use common::{ConfigurationSpace, LocalCollisionResolver, NearestNeighbors, Simulation};
pub use common::{RoboticsError, RoboticsResult};
