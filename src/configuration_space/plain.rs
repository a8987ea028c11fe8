//! Exhaustive configuration space for a spherical agent

use crate::common::{AgentDescription, Bounds, ConfigurationSpace, Obstacle, RoboticsResult, Vec3};
use crate::configuration_space::{point_clears, segment_clears, validate_obstacles};

/// Checks every obstacle on every query, O(m)
#[derive(Debug, Clone)]
pub struct PlainConfigurationSpace {
    agent_radius: f64,
    obstacles: Vec<Obstacle>,
    bounds: Bounds,
}

impl PlainConfigurationSpace {
    pub fn new(
        description: &AgentDescription,
        obstacles: Vec<Obstacle>,
        bounds: Bounds,
    ) -> RoboticsResult<Self> {
        validate_obstacles(&obstacles)?;
        Ok(Self {
            agent_radius: description.radius,
            obstacles,
            bounds,
        })
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

impl ConfigurationSpace for PlainConfigurationSpace {
    fn is_valid(&self, q: &Vec3) -> bool {
        self.bounds.contains(q)
            && self
                .obstacles
                .iter()
                .all(|obstacle| point_clears(obstacle, q, self.agent_radius))
    }

    fn is_valid_edge(&self, a: &Vec3, b: &Vec3) -> bool {
        // the box is convex, so in-bounds endpoints keep the whole segment inside
        self.bounds.contains(a)
            && self.bounds.contains(b)
            && self
                .obstacles
                .iter()
                .all(|obstacle| segment_clears(obstacle, a, b, self.agent_radius))
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}
