//! Rotation-aware configuration space for a line segment agent
//!
//! A configuration is `(θ·s, y, z)`: the agent is a segment of half-length
//! `r` centered at `(y, z)` in the plane x = 0, rotated by θ. The scale `s`
//! keeps the angular axis commensurate with the positional ones so that the
//! roadmap's edge length bound means something along every axis.

use std::f64::consts::PI;

use crate::common::{
    ensure_positive, segment_point_distance, AgentDescription, Bounds, ConfigurationSpace, Metric, Obstacle,
    RoboticsResult, Vec3,
};
use crate::configuration_space::validate_obstacles;

/// Line segment agent among spherical obstacles with a periodic orientation axis
#[derive(Debug, Clone)]
pub struct LineSegmentConfigurationSpace {
    half_length: f64,
    obstacles: Vec<Obstacle>,
    bounds: Bounds,
    orientation_scale: f64,
    edge_resolution: f64,
}

impl LineSegmentConfigurationSpace {
    pub fn new(
        description: &AgentDescription,
        obstacles: Vec<Obstacle>,
        bounds: Bounds,
        orientation_scale: f64,
    ) -> RoboticsResult<Self> {
        validate_obstacles(&obstacles)?;
        ensure_positive("orientation scale", orientation_scale)?;
        Ok(Self {
            half_length: description.radius,
            obstacles,
            bounds,
            orientation_scale,
            edge_resolution: 0.5,
        })
    }

    /// Largest distance any point of the segment may move between two edge samples
    pub fn with_edge_resolution(mut self, edge_resolution: f64) -> RoboticsResult<Self> {
        ensure_positive("edge resolution", edge_resolution)?;
        self.edge_resolution = edge_resolution;
        Ok(self)
    }

    pub fn orientation_scale(&self) -> f64 {
        self.orientation_scale
    }

    /// Orientation in radians encoded by a configuration
    pub fn orientation(&self, q: &Vec3) -> f64 {
        q.x / self.orientation_scale
    }

    /// The two segment end points in world space
    pub fn endpoints(&self, q: &Vec3) -> (Vec3, Vec3) {
        let theta = self.orientation(q);
        let center = Vec3::new(0.0, q.y, q.z);
        let half = Vec3::new(0.0, theta.cos(), theta.sin()) * self.half_length;
        (center - half, center + half)
    }

    fn clears_obstacles(&self, q: &Vec3) -> bool {
        let (p1, p2) = self.endpoints(q);
        self.obstacles
            .iter()
            .all(|obstacle| segment_point_distance(&p1, &p2, &obstacle.center) - obstacle.radius > 0.0)
    }
}

impl ConfigurationSpace for LineSegmentConfigurationSpace {
    fn is_valid(&self, q: &Vec3) -> bool {
        self.bounds.contains_yz(q) && self.clears_obstacles(q)
    }

    fn is_valid_edge(&self, a: &Vec3, b: &Vec3) -> bool {
        let metric = self.metric();
        let delta = metric.difference(a, b);
        let translation = (delta.y * delta.y + delta.z * delta.z).sqrt();
        let sweep = self.half_length * (delta.x / self.orientation_scale).abs();
        let n_steps = (translation.max(sweep) / self.edge_resolution).ceil().max(1.0) as usize;

        (0..=n_steps).all(|i| {
            let q = metric.interpolate(a, b, i as f64 / n_steps as f64);
            self.is_valid(&q)
        })
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn metric(&self) -> Metric {
        Metric::WrappedX {
            period: 2.0 * PI * self.orientation_scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_space() -> LineSegmentConfigurationSpace {
        let description = AgentDescription::new(Vec3::zeros(), Vec3::zeros(), 10.0).unwrap();
        let bounds = Bounds::new(Vec3::new(0.0, -50.0, -50.0), Vec3::new(2.0 * PI, 50.0, 50.0)).unwrap();
        let obstacles = vec![Obstacle::new(Vec3::new(0.0, 0.0, 8.0), 2.0)];
        LineSegmentConfigurationSpace::new(&description, obstacles, bounds, 1.0).unwrap()
    }

    #[test]
    fn test_orientation_changes_validity() {
        let space = create_test_space();
        assert!(space.is_valid(&Vec3::new(0.0, 0.0, 0.0)));
        assert!(!space.is_valid(&Vec3::new(PI / 2.0, 0.0, 0.0)));
        assert!(space.is_valid(&Vec3::new(PI, 0.0, 0.0)));
    }

    #[test]
    fn test_orientation_axis_is_not_bounded() {
        let space = create_test_space();
        assert!(space.is_valid(&Vec3::new(-0.3, 0.0, 0.0)));
        assert!(!space.is_valid(&Vec3::new(0.0, 51.0, 0.0)));
    }

    #[test]
    fn test_edge_rotates_across_wrap_boundary() {
        let space = create_test_space();
        let a = Vec3::new(0.1, 0.0, 0.0);
        let b = Vec3::new(2.0 * PI - 0.1, 0.0, 0.0);
        // the short way passes through θ = 0, the long way through θ = π/2
        assert!(space.is_valid_edge(&a, &b));
        assert!((space.metric().distance(&a, &b) - 0.2).abs() < 1e-10);
        assert!(!space.is_valid_edge(&a, &Vec3::new(PI - 0.1, 0.0, 0.0)));
    }

    #[test]
    fn test_endpoints() {
        let space = create_test_space();
        let (p1, p2) = space.endpoints(&Vec3::new(PI / 2.0, 1.0, 2.0));
        assert!((p1 - Vec3::new(0.0, 1.0, -8.0)).norm() < 1e-9);
        assert!((p2 - Vec3::new(0.0, 1.0, 12.0)).norm() < 1e-9);
    }
}
