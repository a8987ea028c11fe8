//! Common types used throughout rust_crowd_planning

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::common::error::{ensure_positive, RoboticsError, RoboticsResult};

/// 3D vector used for positions, velocities, forces and configurations
pub type Vec3 = Vector3<f64>;

/// Static spherical obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f64,
}

impl Obstacle {
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn validate(&self) -> RoboticsResult<()> {
        ensure_positive("obstacle radius", self.radius)
    }
}

/// Start/goal configuration and body extent of one agent.
///
/// For a line segment agent `radius` is the half-length of the segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentDescription {
    pub start: Vec3,
    pub goal: Vec3,
    pub radius: f64,
}

impl AgentDescription {
    pub fn new(start: Vec3, goal: Vec3, radius: f64) -> RoboticsResult<Self> {
        ensure_positive("agent radius", radius)?;
        Ok(Self { start, goal, radius })
    }
}

/// Axis aligned sampling domain, inclusive on every face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> RoboticsResult<Self> {
        if (0..3).any(|i| !(min[i] <= max[i]) || !min[i].is_finite() || !max[i].is_finite()) {
            return Err(RoboticsError::InvalidParameter(format!(
                "bounds min {:?} exceeds max {:?}",
                min.as_slice(),
                max.as_slice()
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, q: &Vec3) -> bool {
        (0..3).all(|i| q[i] >= self.min[i] && q[i] <= self.max[i])
    }

    /// Containment check ignoring the x axis (used when x encodes orientation)
    pub fn contains_yz(&self, q: &Vec3) -> bool {
        (1..3).all(|i| q[i] >= self.min[i] && q[i] <= self.max[i])
    }
}

/// Distance measure over configurations.
///
/// `WrappedX` treats the x coordinate as periodic, which is how orientation
/// is stored by the rotation-aware configuration space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metric {
    Euclidean,
    WrappedX { period: f64 },
}

impl Metric {
    /// Shortest displacement taking `from` to `to`
    pub fn difference(&self, from: &Vec3, to: &Vec3) -> Vec3 {
        let mut d = to - from;
        if let Metric::WrappedX { period } = *self {
            d.x = wrap_signed(d.x, period);
        }
        d
    }

    pub fn distance(&self, a: &Vec3, b: &Vec3) -> f64 {
        self.difference(a, b).norm()
    }

    /// Bring a configuration back into the canonical range
    pub fn wrap(&self, q: Vec3) -> Vec3 {
        match *self {
            Metric::Euclidean => q,
            Metric::WrappedX { period } => Vec3::new(q.x.rem_euclid(period), q.y, q.z),
        }
    }

    /// Point at fraction `t` along the shortest move from `from` to `to`
    pub fn interpolate(&self, from: &Vec3, to: &Vec3, t: f64) -> Vec3 {
        from + self.difference(from, to) * t
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean
    }
}

fn wrap_signed(dx: f64, period: f64) -> f64 {
    let r = dx.rem_euclid(period);
    if r > period / 2.0 {
        r - period
    } else {
        r
    }
}

/// Distance from `p` to the closest point of segment `ab`
pub fn segment_point_distance(a: &Vec3, b: &Vec3, p: &Vec3) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Path represented as a sequence of configurations, start first
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path3D {
    pub points: Vec<Vec3>,
}

impl Path3D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<&Vec3> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Vec3> {
        self.points.last()
    }

    pub fn total_length(&self, metric: &Metric) -> f64 {
        use itertools::Itertools;
        self.points
            .iter()
            .tuple_windows()
            .map(|(a, b)| metric.distance(a, b))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_bounds_inclusive() {
        let bounds = Bounds::new(Vec3::new(0.0, -1.0, -1.0), Vec3::new(0.0, 1.0, 1.0)).unwrap();
        assert!(bounds.contains(&Vec3::new(0.0, 1.0, -1.0)));
        assert!(!bounds.contains(&Vec3::new(0.0, 1.0001, 0.0)));
        assert!(Bounds::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros()).is_err());
    }

    #[test]
    fn test_wrapped_metric_takes_short_way() {
        let metric = Metric::WrappedX { period: 2.0 * PI };
        let a = Vec3::new(0.1, 0.0, 0.0);
        let b = Vec3::new(2.0 * PI - 0.1, 0.0, 0.0);
        assert!((metric.distance(&a, &b) - 0.2).abs() < 1e-10);
        assert!((metric.difference(&a, &b).x + 0.2).abs() < 1e-10);
        let wrapped = metric.wrap(Vec3::new(-0.1, 3.0, 4.0));
        assert!((wrapped.x - (2.0 * PI - 0.1)).abs() < 1e-10);
        assert_eq!(wrapped.y, 3.0);
    }

    #[test]
    fn test_segment_point_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 10.0, 0.0);
        assert!((segment_point_distance(&a, &b, &Vec3::new(3.0, 5.0, 0.0)) - 3.0).abs() < 1e-10);
        assert!((segment_point_distance(&a, &b, &Vec3::new(0.0, 14.0, 0.0)) - 4.0).abs() < 1e-10);
        assert!((segment_point_distance(&a, &a, &Vec3::new(0.0, 2.0, 0.0)) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_path_total_length() {
        let path = Path3D::from_points(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ]);
        assert_eq!(path.edge_count(), 2);
        assert!((path.total_length(&Metric::Euclidean) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_agent_description_rejects_bad_radius() {
        assert!(AgentDescription::new(Vec3::zeros(), Vec3::zeros(), 0.0).is_err());
    }
}
