//! Flocking (separation, cohesion, alignment) local interaction

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::acting::Agent;
use crate::common::{ensure_positive, LocalCollisionResolver, Obstacle, RoboticsError, RoboticsResult, Vec3};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockingConfig {
    /// Neighbors closer than this influence each other
    pub impact_radius: f64,
    pub separation_k: f64,
    pub cohesion_k: f64,
    pub alignment_k: f64,
    /// Cap on the summed flocking force
    pub max_force: f64,
    /// Flock of each agent by index. Agents only flock with their own group;
    /// empty means a single flock and agents past the end belong to group 0.
    #[serde(default)]
    pub groups: Vec<usize>,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            impact_radius: 8.0,
            separation_k: 2000.0,
            cohesion_k: 10.5,
            alignment_k: 15.0,
            max_force: 500.0,
            groups: Vec::new(),
        }
    }
}

impl FlockingConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        ensure_positive("impact radius", self.impact_radius)?;
        ensure_positive("flocking max force", self.max_force)?;
        for (name, value) in [
            ("separation k", self.separation_k),
            ("cohesion k", self.cohesion_k),
            ("alignment k", self.alignment_k),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RoboticsError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

fn unit_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize(1e-12).unwrap_or_else(Vec3::zeros)
}

/// Agents steer toward their next milestone while keeping apart from,
/// drifting toward and matching the velocity of neighbors in range
#[derive(Debug, Clone, Default)]
pub struct FlockingResolver {
    config: FlockingConfig,
}

impl FlockingResolver {
    pub fn new(config: FlockingConfig) -> RoboticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FlockingConfig {
        &self.config
    }

    pub fn group_of(&self, agent: usize) -> usize {
        self.config.groups.get(agent).copied().unwrap_or(0)
    }

    /// Flocking force on agent `i` given everyone's positions and velocities
    fn force_on(&self, i: usize, positions: &[Vec3], velocities: &[Vec3]) -> Vec3 {
        let cfg = &self.config;
        let mut separation = Vec3::zeros();
        let mut centroid = Vec3::zeros();
        let mut alignment = Vec3::zeros();
        let mut neighbors = 0usize;
        let group = self.group_of(i);

        for (j, other) in positions.iter().enumerate() {
            if j == i || self.group_of(j) != group {
                continue;
            }
            let away = positions[i] - other;
            let distance = away.norm();
            if distance <= 0.0 || distance >= cfg.impact_radius {
                continue;
            }
            neighbors += 1;
            separation += away / distance * (cfg.separation_k * (cfg.impact_radius - distance));
            centroid += other;
            alignment += unit_or_zero(velocities[j] - velocities[i]) * cfg.alignment_k;
        }

        if neighbors == 0 {
            return Vec3::zeros();
        }

        let cohesion = unit_or_zero(centroid / neighbors as f64 - positions[i]) * cfg.cohesion_k;
        let force = separation + cohesion + alignment;
        let magnitude = force.norm();
        if magnitude > cfg.max_force {
            force * (cfg.max_force / magnitude)
        } else {
            force
        }
    }
}

/// Push `position` out of every obstacle it overlaps; returns the corrected
/// position and the velocity with its inward component removed
fn resolve_obstacles(position: Vec3, velocity: Vec3, radius: f64, obstacles: &[Obstacle]) -> (Vec3, Vec3) {
    let mut position = position;
    let mut velocity = velocity;

    for obstacle in obstacles {
        let outward = position - obstacle.center;
        let reach = obstacle.radius + radius;
        if outward.norm() < reach {
            let normal = outward.try_normalize(1e-12).unwrap_or_else(Vec3::x);
            position = obstacle.center + normal * reach;
            let inward = velocity.dot(&normal);
            if inward < 0.0 {
                velocity -= normal * inward;
            }
        }
    }

    (position, velocity)
}

impl LocalCollisionResolver for FlockingResolver {
    fn resolve(&self, agents: &mut [Agent], obstacles: &[Obstacle], dt: f64) {
        let positions: Vec<Vec3> = agents.iter().map(|agent| *agent.position()).collect();
        let velocities: Vec<Vec3> = agents.iter().map(|agent| *agent.velocity()).collect();
        let goal_velocities: Vec<Vec3> = agents.iter().map(Agent::goal_velocity).collect();
        let forces: Vec<Vec3> = (0..agents.len())
            .map(|i| self.force_on(i, &positions, &velocities))
            .collect();

        for (i, agent) in agents.iter_mut().enumerate() {
            if agent.is_paused() {
                continue;
            }
            let velocity = goal_velocities[i] + forces[i] * dt;
            let moved = positions[i] + velocity * dt;
            let (target, velocity) = resolve_obstacles(moved, velocity, agent.radius(), obstacles);
            agent.set_velocity(velocity);
            agent.apply_displacement(target - positions[i]);
        }
        trace!(agents = agents.len(), "applied flocking step");
    }
}
