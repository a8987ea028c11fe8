//! Common traits defining the seams between planners, spaces and drivers

use crate::acting::{Agent, ControlSignal, Frame};
use crate::common::error::RoboticsResult;
use crate::common::types::*;

/// Collision oracle over an agent's configurations
pub trait ConfigurationSpace {
    /// Configuration lies in bounds and clears every obstacle
    fn is_valid(&self, q: &Vec3) -> bool;

    /// Straight move from `a` to `b` is valid at every point
    fn is_valid_edge(&self, a: &Vec3, b: &Vec3) -> bool;

    /// Sampling domain
    fn bounds(&self) -> &Bounds;

    /// Distance measure consistent with how edges are interpolated
    fn metric(&self) -> Metric {
        Metric::Euclidean
    }
}

impl<T: ConfigurationSpace + ?Sized> ConfigurationSpace for Box<T> {
    fn is_valid(&self, q: &Vec3) -> bool {
        (**self).is_valid(q)
    }

    fn is_valid_edge(&self, a: &Vec3, b: &Vec3) -> bool {
        (**self).is_valid_edge(a, b)
    }

    fn bounds(&self) -> &Bounds {
        (**self).bounds()
    }

    fn metric(&self) -> Metric {
        (**self).metric()
    }
}

/// Point set supporting nearest and radius queries
pub trait NearestNeighbors {
    /// Add a point, returning its index
    fn insert(&mut self, point: Vec3) -> usize;

    /// Index of the closest point, first one on ties
    fn nearest(&self, query: &Vec3) -> Option<usize>;

    /// Indices of all points within `radius` (inclusive), ascending
    fn within_radius(&self, query: &Vec3, radius: f64) -> Vec<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Frame-stepped navigation driver
pub trait Simulation {
    /// Handle a discrete control signal
    fn apply(&mut self, signal: ControlSignal) -> RoboticsResult<()>;

    /// Advance by `dt` seconds
    fn step(&mut self, dt: f64);

    /// Snapshot for display
    fn frame(&self) -> Frame;
}

/// Local interaction model moving every agent by one time step
pub trait LocalCollisionResolver {
    /// Reads all agent states before writing any of them
    fn resolve(&self, agents: &mut [Agent], obstacles: &[Obstacle], dt: f64);
}
