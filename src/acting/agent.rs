//! Agent following a milestone path

use serde::{Deserialize, Serialize};

use crate::common::{
    ensure_positive, AgentDescription, ConfigurationSpace, Metric, Path3D, RoboticsResult, Vec3,
};

/// Motion parameters shared by every agent of a system
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Travel speed toward the next milestone
    pub speed: f64,
    /// A milestone closer than this counts as reached
    pub milestone_tolerance: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 20.0,
            milestone_tolerance: 2.0,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        ensure_positive("agent speed", self.speed)?;
        ensure_positive("milestone tolerance", self.milestone_tolerance)
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    description: AgentDescription,
    config: AgentConfig,
    metric: Metric,
    position: Vec3,
    velocity: Vec3,
    path: Path3D,
    milestone: usize,
    paused: bool,
}

impl Agent {
    pub fn new(description: AgentDescription, config: AgentConfig) -> RoboticsResult<Self> {
        config.validate()?;
        Ok(Self {
            description,
            config,
            metric: Metric::Euclidean,
            position: description.start,
            velocity: Vec3::zeros(),
            path: Path3D::new(),
            milestone: 0,
            paused: false,
        })
    }

    /// Measure positions with `metric`, e.g. the wrapped orientation axis
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Move toward the next milestone at constant speed
    pub fn update(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        let Some(next) = self.next_milestone() else {
            self.velocity = Vec3::zeros();
            return;
        };

        let to_next = self.metric.difference(&self.position, &next);
        if to_next.norm() < self.config.milestone_tolerance {
            self.milestone += 1;
            return;
        }

        self.velocity = to_next.normalize() * self.config.speed;
        self.position = self.metric.wrap(self.position + self.velocity * dt);
    }

    /// Shortcut to the furthest milestone reachable by a straight valid move, then update
    pub fn smooth_update<S: ConfigurationSpace + ?Sized>(&mut self, dt: f64, space: &S) {
        if self.paused {
            return;
        }
        let last = self.path.len().saturating_sub(1);
        for target in (self.milestone + 2..=last).rev() {
            if space.is_valid_edge(&self.position, &self.path.points[target]) {
                self.milestone = target - 1;
                break;
            }
        }
        self.update(dt);
    }

    /// Replace the path and restart from the description's start
    pub fn set_path(&mut self, path: Path3D) {
        self.path = path;
        self.milestone = 0;
        self.position = self.description.start;
        self.velocity = Vec3::zeros();
    }

    /// Snap to the current milestone and advance the milestone pointer
    pub fn step_forward(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.position = self.path.points[self.milestone];
        if self.milestone + 1 < self.path.len() {
            self.milestone += 1;
        }
    }

    pub fn step_backward(&mut self) {
        if self.path.is_empty() {
            return;
        }
        self.position = self.path.points[self.milestone];
        self.milestone = self.milestone.saturating_sub(1);
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Velocity the path asks for; zero when paused or at the end of the path
    pub fn goal_velocity(&self) -> Vec3 {
        if self.paused {
            return Vec3::zeros();
        }
        match self.next_milestone() {
            Some(next) => {
                let to_next = self.metric.difference(&self.position, &next);
                let dist = to_next.norm();
                if dist > 0.0 {
                    to_next * (self.config.speed / dist)
                } else {
                    Vec3::zeros()
                }
            }
            None => Vec3::zeros(),
        }
    }

    /// Move by an externally computed displacement, then advance past a reached milestone
    pub fn apply_displacement(&mut self, displacement: Vec3) {
        if self.paused {
            return;
        }
        self.position = self.metric.wrap(self.position + displacement);
        if let Some(next) = self.next_milestone() {
            if self.metric.distance(&self.position, &next) < self.config.milestone_tolerance {
                self.milestone += 1;
            }
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn next_milestone(&self) -> Option<Vec3> {
        self.path.points.get(self.milestone + 1).copied()
    }

    /// True once the last milestone has been reached
    pub fn finished(&self) -> bool {
        self.milestone + 1 >= self.path.len()
    }

    pub fn position(&self) -> &Vec3 {
        &self.position
    }

    pub fn velocity(&self) -> &Vec3 {
        &self.velocity
    }

    pub fn radius(&self) -> f64 {
        self.description.radius
    }

    pub fn description(&self) -> &AgentDescription {
        &self.description
    }

    pub fn path(&self) -> &Path3D {
        &self.path
    }

    pub fn milestone(&self) -> usize {
        self.milestone
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
