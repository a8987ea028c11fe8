//! Predictive time-to-collision (TTC) local collision avoidance
//!
//! Every agent wants to travel at its goal velocity. Pairs that are on course
//! to touch within the look-ahead feel a repulsive force scaled by
//! `k / τ^power`, nearly stationary neighbors and obstacles are pushed out of
//! a personal space, and overlapping pairs receive a correction force.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::acting::Agent;
use crate::common::{ensure_positive, LocalCollisionResolver, Obstacle, RoboticsError, RoboticsResult, Vec3};

// Below this length a separation vector has no usable direction.
const DIRECTION_EPSILON: f64 = 1e-9;

/// TTC force model constants
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TtcConfig {
    /// Gain of the anticipatory force
    pub k: f64,
    /// Cap on the summed force per agent
    pub max_force: f64,
    /// Exponent applied to the time to collision
    pub power: f64,
    /// Extra clearance kept from nearly stationary neighbors
    pub personal_space: f64,
    /// Gain of the personal space force; zero disables that branch
    pub separation_k: f64,
    /// Gain pushing interpenetrating agents apart
    pub collision_correction_k: f64,
    /// Squared relative speed under which a pair counts as stationary
    pub stationary_speed_sq: f64,
}

impl Default for TtcConfig {
    fn default() -> Self {
        Self {
            k: 10.0,
            max_force: 500.0,
            power: 2.0,
            personal_space: 6.0,
            separation_k: 40.0,
            collision_correction_k: 10.0,
            stationary_speed_sq: 2.0,
        }
    }
}

impl TtcConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        ensure_positive("TTC max force", self.max_force)?;
        ensure_positive("TTC power", self.power)?;
        for (name, value) in [
            ("TTC k", self.k),
            ("TTC personal space", self.personal_space),
            ("TTC separation k", self.separation_k),
            ("TTC collision correction k", self.collision_correction_k),
            ("TTC stationary speed", self.stationary_speed_sq),
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

/// Position, velocity and radius of one participant in a pairwise interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f64,
}

impl Body {
    pub fn new(position: Vec3, velocity: Vec3, radius: f64) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }
}

/// Unit vector along `v`, falling back to +x for a degenerate vector
fn direction_or_fallback(v: &Vec3) -> Vec3 {
    let norm = v.norm();
    if norm < DIRECTION_EPSILON {
        Vec3::x()
    } else {
        v / norm
    }
}

/// Earliest positive time at which the two bodies touch, if they are
/// approaching and not already overlapping
pub fn time_to_collision(i: &Body, j: &Body) -> Option<f64> {
    let xji = j.position - i.position;
    let vji = j.velocity - i.velocity;
    let rij = i.radius + j.radius;

    let a = vji.dot(&vji);
    let b = xji.dot(&vji);
    let c = xji.dot(&xji) - rij * rij;
    let disc = b * b - a * c;
    if a <= 0.0 || disc <= 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / a;
    let t2 = (-b + sqrt_disc) / a;
    if t1 > 0.0 && t2 > 0.0 {
        Some(t1.min(t2))
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct TtcResolver {
    config: TtcConfig,
}

impl TtcResolver {
    pub fn new(config: TtcConfig) -> RoboticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TtcConfig {
        &self.config
    }

    /// Force felt by `i` due to `j`. Obstacles always use the personal space rule.
    pub fn pair_force(&self, i: &Body, j: &Body, with_obstacle: bool) -> Vec3 {
        let cfg = &self.config;
        let xji = j.position - i.position;
        let vji = j.velocity - i.velocity;
        let rij = i.radius + j.radius;
        let distance = xji.norm();
        let direction = direction_or_fallback(&xji);

        let a = vji.dot(&vji);
        if cfg.separation_k > 0.0
            && (with_obstacle || a < cfg.stationary_speed_sq || distance < DIRECTION_EPSILON)
        {
            let impact_radius = rij + cfg.personal_space;
            if distance < impact_radius {
                return -direction * (cfg.separation_k * (impact_radius - distance));
            }
            return Vec3::zeros();
        }

        let b = xji.dot(&vji);
        let c = xji.dot(&xji) - rij * rij;
        let disc = b * b - a * c;
        if a <= 0.0 || disc <= 0.0 {
            return Vec3::zeros();
        }

        let sqrt_disc = disc.sqrt();
        let t1 = (-b - sqrt_disc) / a;
        let t2 = (-b + sqrt_disc) / a;
        if t1 < 0.0 && t2 < 0.0 {
            return Vec3::zeros();
        }
        if t1 > 0.0 && t2 > 0.0 {
            let tau = t1.min(t2);
            return -direction * (cfg.k / tau.powf(cfg.power));
        }

        // already overlapping
        -direction * (cfg.collision_correction_k * (rij - distance))
    }

    /// Summed and capped force on every agent, computed from a snapshot
    pub fn forces(&self, bodies: &[Body], obstacles: &[Obstacle]) -> Vec<Vec3> {
        let mut forces = vec![Vec3::zeros(); bodies.len()];

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let force = self.pair_force(&bodies[i], &bodies[j], false);
                forces[i] += force;
                forces[j] -= force;
            }
        }

        for (i, body) in bodies.iter().enumerate() {
            for obstacle in obstacles {
                let other = Body::new(obstacle.center, Vec3::zeros(), obstacle.radius);
                forces[i] += self.pair_force(body, &other, true);
            }
        }

        for force in &mut forces {
            let magnitude = force.norm();
            if magnitude > self.config.max_force {
                *force *= self.config.max_force / magnitude;
            }
        }

        forces
    }
}

impl LocalCollisionResolver for TtcResolver {
    fn resolve(&self, agents: &mut [Agent], obstacles: &[Obstacle], dt: f64) {
        let bodies: Vec<Body> = agents
            .iter()
            .map(|agent| Body::new(*agent.position(), agent.goal_velocity(), agent.radius()))
            .collect();
        let forces = self.forces(&bodies, obstacles);

        for ((agent, body), force) in agents.iter_mut().zip(&bodies).zip(&forces) {
            let velocity = body.velocity + force * dt;
            agent.set_velocity(velocity);
            agent.apply_displacement(velocity * dt);
        }
        trace!(agents = agents.len(), "applied TTC step");
    }
}
