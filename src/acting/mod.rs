//! Agents and the models that move them
//!
//! Agents follow milestone paths produced by the planners. Local resolvers
//! adjust their motion to avoid one another, and the simulation drivers tie
//! planners, agents and resolvers together behind control signals.

pub mod agent;
pub mod ttc;
pub mod flocking;
pub mod system;

pub use agent::*;
pub use ttc::*;
pub use flocking::*;
pub use system::*;
