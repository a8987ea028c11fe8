//! Utility modules for rust_crowd_planning

pub mod sampling;
pub mod visualization;

pub use sampling::Sampler;
pub use visualization::{colors, DrawOptions, Visualizer};
