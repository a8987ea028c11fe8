//! Bounding sphere hierarchy over spherical obstacles
//!
//! Obstacles are organised once into a binary tree. Each branch stores a
//! sphere enclosing both children, so a query whose inflated region misses a
//! branch bound can skip every obstacle below it. Leaves run the same
//! clearance predicate as [`PlainConfigurationSpace`](super::PlainConfigurationSpace).

use tracing::debug;

use crate::common::{
    segment_point_distance, AgentDescription, Bounds, ConfigurationSpace, Obstacle, RoboticsResult, Vec3,
};
use crate::configuration_space::{point_clears, segment_clears, validate_obstacles};

// Relative slack added to branch bounds so rounding never makes a bound
// smaller than the spheres it encloses.
const BOUND_SLACK: f64 = 1e-9;

/// Sphere enclosing a set of obstacles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundingSphere {
    fn of(obstacle: &Obstacle) -> Self {
        Self {
            center: obstacle.center,
            radius: obstacle.radius,
        }
    }

    /// Smallest sphere containing both `self` and `other`, padded by the slack
    fn merge(&self, other: &BoundingSphere) -> BoundingSphere {
        let offset = other.center - self.center;
        let d = offset.norm();
        let merged = if d + other.radius <= self.radius {
            *self
        } else if d + self.radius <= other.radius {
            *other
        } else {
            let radius = (d + self.radius + other.radius) / 2.0;
            BoundingSphere {
                center: self.center + offset * ((radius - self.radius) / d),
                radius,
            }
        };
        BoundingSphere {
            center: merged.center,
            radius: merged.radius + BOUND_SLACK * (1.0 + merged.radius),
        }
    }

    pub fn contains(&self, other: &BoundingSphere) -> bool {
        (other.center - self.center).norm() + other.radius <= self.radius
    }
}

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        obstacle: Obstacle,
    },
    Branch {
        bound: BoundingSphere,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn build(obstacles: &mut [Obstacle]) -> BvhNode {
        if obstacles.len() == 1 {
            return BvhNode::Leaf { obstacle: obstacles[0] };
        }

        let axis = largest_spread_axis(obstacles);
        obstacles.sort_by(|a, b| a.center[axis].total_cmp(&b.center[axis]));
        let mid = obstacles.len() / 2;
        let (lower, upper) = obstacles.split_at_mut(mid);

        let left = BvhNode::build(lower);
        let right = BvhNode::build(upper);
        let bound = left.bound().merge(&right.bound());
        BvhNode::Branch {
            bound,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn bound(&self) -> BoundingSphere {
        match self {
            BvhNode::Leaf { obstacle } => BoundingSphere::of(obstacle),
            BvhNode::Branch { bound, .. } => *bound,
        }
    }

    fn point_collides(&self, q: &Vec3, agent_radius: f64) -> bool {
        match self {
            BvhNode::Leaf { obstacle } => !point_clears(obstacle, q, agent_radius),
            BvhNode::Branch { bound, left, right } => {
                if (q - bound.center).norm() > bound.radius + agent_radius {
                    return false;
                }
                left.point_collides(q, agent_radius) || right.point_collides(q, agent_radius)
            }
        }
    }

    fn segment_collides(&self, a: &Vec3, b: &Vec3, agent_radius: f64) -> bool {
        match self {
            BvhNode::Leaf { obstacle } => !segment_clears(obstacle, a, b, agent_radius),
            BvhNode::Branch { bound, left, right } => {
                if segment_point_distance(a, b, &bound.center) > bound.radius + agent_radius {
                    return false;
                }
                left.segment_collides(a, b, agent_radius) || right.segment_collides(a, b, agent_radius)
            }
        }
    }

    fn collect_bounds(&self, depth: usize, out: &mut Vec<(usize, BoundingSphere)>) {
        out.push((depth, self.bound()));
        if let BvhNode::Branch { left, right, .. } = self {
            left.collect_bounds(depth + 1, out);
            right.collect_bounds(depth + 1, out);
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

fn largest_spread_axis(obstacles: &[Obstacle]) -> usize {
    let mut min = Vec3::repeat(f64::INFINITY);
    let mut max = Vec3::repeat(f64::NEG_INFINITY);
    for obstacle in obstacles {
        min = min.inf(&obstacle.center);
        max = max.sup(&obstacle.center);
    }
    (max - min).imax()
}

/// Configuration space for a spherical agent backed by a bounding sphere tree
#[derive(Debug, Clone)]
pub struct BoundingSphereHierarchy {
    agent_radius: f64,
    root: Option<BvhNode>,
    obstacle_count: usize,
    bounds: Bounds,
}

impl BoundingSphereHierarchy {
    pub fn new(
        description: &AgentDescription,
        obstacles: Vec<Obstacle>,
        bounds: Bounds,
    ) -> RoboticsResult<Self> {
        validate_obstacles(&obstacles)?;
        let obstacle_count = obstacles.len();
        let mut obstacles = obstacles;
        let root = if obstacles.is_empty() {
            None
        } else {
            Some(BvhNode::build(&mut obstacles))
        };
        let space = Self {
            agent_radius: description.radius,
            root,
            obstacle_count,
            bounds,
        };
        debug!(obstacles = obstacle_count, depth = space.depth(), "built bounding sphere hierarchy");
        Ok(space)
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacle_count
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, BvhNode::depth)
    }

    /// Every node bound paired with its depth, parents before children
    pub fn bounding_spheres(&self) -> Vec<(usize, BoundingSphere)> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            root.collect_bounds(0, &mut out);
        }
        out
    }
}

impl ConfigurationSpace for BoundingSphereHierarchy {
    fn is_valid(&self, q: &Vec3) -> bool {
        self.bounds.contains(q)
            && !self
                .root
                .as_ref()
                .map_or(false, |root| root.point_collides(q, self.agent_radius))
    }

    fn is_valid_edge(&self, a: &Vec3, b: &Vec3) -> bool {
        self.bounds.contains(a)
            && self.bounds.contains(b)
            && !self
                .root
                .as_ref()
                .map_or(false, |root| root.segment_collides(a, b, self.agent_radius))
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }
}
