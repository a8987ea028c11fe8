//! Optimal Rapidly-exploring Random Tree (RRT*)
//!
//! The tree grows incrementally: each call to [`OptimalTree::grow_tree`] adds
//! up to `n` nodes, choosing the cheapest collision-free parent among nearby
//! nodes and rewiring neighbors through the new node when that shortens their
//! route from the root.

use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{
    ensure_positive, ConfigurationSpace, Metric, NearestNeighbors, Path3D, RoboticsError, RoboticsResult, Vec3,
};
use crate::path_planning::neighbors::LinearScan;
use crate::utils::Sampler;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub position: Vec3,
    /// Path length from the root
    pub cost: f64,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl TreeNode {
    fn new(position: Vec3, cost: f64, parent: Option<usize>) -> Self {
        Self {
            position,
            cost,
            parent,
            children: Vec::new(),
        }
    }
}

/// Configuration parameters for RRT*
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrtStarConfig {
    /// Longest edge a single extension may add
    pub step_size: f64,
    /// Radius searched for a cheaper parent and for rewiring
    pub neighborhood_radius: f64,
    /// Probability of sampling the goal instead of a uniform configuration
    pub goal_sample_rate: f64,
    pub seed: u64,
}

impl Default for RrtStarConfig {
    fn default() -> Self {
        Self {
            step_size: 5.0,
            neighborhood_radius: 15.0,
            goal_sample_rate: 0.05,
            seed: 0,
        }
    }
}

impl RrtStarConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        ensure_positive("step size", self.step_size)?;
        ensure_positive("neighborhood radius", self.neighborhood_radius)?;
        if !(0.0..=1.0).contains(&self.goal_sample_rate) {
            return Err(RoboticsError::InvalidParameter(format!(
                "goal sample rate must lie in [0, 1], got {}",
                self.goal_sample_rate
            )));
        }
        Ok(())
    }
}

/// RRT* tree rooted at the start configuration
#[derive(Debug, Clone)]
pub struct OptimalTree {
    nodes: Vec<TreeNode>,
    index: LinearScan,
    goal: Vec3,
    goal_index: Option<usize>,
    metric: Metric,
    config: RrtStarConfig,
    sampler: Sampler,
    goal_bias: Bernoulli,
}

impl OptimalTree {
    pub fn new(start: Vec3, goal: Vec3, config: RrtStarConfig) -> RoboticsResult<Self> {
        config.validate()?;
        let goal_bias = Bernoulli::new(config.goal_sample_rate)
            .map_err(|e| RoboticsError::InvalidParameter(format!("goal sample rate: {}", e)))?;

        let mut index = LinearScan::new(Metric::Euclidean);
        index.insert(start);

        Ok(Self {
            nodes: vec![TreeNode::new(start, 0.0, None)],
            index,
            goal,
            goal_index: if start == goal { Some(0) } else { None },
            metric: Metric::Euclidean,
            sampler: Sampler::new(config.seed),
            config,
            goal_bias,
        })
    }

    /// Run `n` sampling iterations against `space`.
    ///
    /// Returns the number of nodes added; iterations whose extension is
    /// blocked or degenerate add nothing.
    pub fn grow_tree<S: ConfigurationSpace + ?Sized>(&mut self, n: usize, space: &S) -> usize {
        self.metric = space.metric();
        self.index.set_metric(self.metric);
        let bounds = *space.bounds();
        let before = self.nodes.len();

        for _ in 0..n {
            let sample = self.sampler.sample_with_goal_bias(&bounds, &self.goal, &self.goal_bias);
            let nearest = match self.index.nearest(&sample) {
                Some(i) => i,
                None => continue,
            };
            let Some(candidate) = self.steer(nearest, &sample) else {
                continue;
            };
            if !space.is_valid_edge(&self.nodes[nearest].position, &candidate) {
                continue;
            }

            let near = self.index.within_radius(&candidate, self.config.neighborhood_radius);
            let parent = self.choose_parent(nearest, &near, &candidate, space);
            let new_index = self.add_node(candidate, parent);
            self.rewire(new_index, &near, space);

            if self.goal_index.is_none() && candidate == self.goal {
                info!(nodes = self.nodes.len(), cost = self.nodes[new_index].cost, "RRT* reached goal");
                self.goal_index = Some(new_index);
            }
        }

        let added = self.nodes.len() - before;
        debug!(iterations = n, added, nodes = self.nodes.len(), "grew RRT* tree");
        added
    }

    /// Bounded step from node `from` toward `target`; `None` for a zero-length step
    fn steer(&self, from: usize, target: &Vec3) -> Option<Vec3> {
        let origin = self.nodes[from].position;
        let delta = self.metric.difference(&origin, target);
        let dist = delta.norm();

        if dist <= 0.0 {
            None
        } else if dist <= self.config.step_size {
            Some(*target)
        } else {
            Some(self.metric.wrap(origin + delta * (self.config.step_size / dist)))
        }
    }

    fn choose_parent<S: ConfigurationSpace + ?Sized>(
        &self,
        nearest: usize,
        near: &[usize],
        candidate: &Vec3,
        space: &S,
    ) -> usize {
        let mut best = nearest;
        let mut best_cost = self.cost_through(nearest, candidate);

        for &i in near {
            if i == nearest {
                continue;
            }
            let cost = self.cost_through(i, candidate);
            if cost < best_cost && space.is_valid_edge(&self.nodes[i].position, candidate) {
                best = i;
                best_cost = cost;
            }
        }

        best
    }

    fn rewire<S: ConfigurationSpace + ?Sized>(&mut self, new_index: usize, near: &[usize], space: &S) {
        let new_position = self.nodes[new_index].position;
        let parent = self.nodes[new_index].parent;

        for &i in near {
            if Some(i) == parent {
                continue;
            }
            let cost = self.cost_through(new_index, &self.nodes[i].position);
            if cost >= self.nodes[i].cost {
                continue;
            }
            // re-parenting an ancestor would close a cycle
            if self.is_ancestor(i, new_index) {
                continue;
            }
            if !space.is_valid_edge(&new_position, &self.nodes[i].position) {
                continue;
            }

            if let Some(old_parent) = self.nodes[i].parent {
                self.nodes[old_parent].children.retain(|&c| c != i);
            }
            self.nodes[i].parent = Some(new_index);
            self.nodes[new_index].children.push(i);

            let delta = cost - self.nodes[i].cost;
            self.propagate_cost(i, delta);
        }
    }

    /// Shift the cost of `root` and all of its descendants by `delta`
    fn propagate_cost(&mut self, root: usize, delta: f64) {
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            self.nodes[i].cost += delta;
            stack.extend(self.nodes[i].children.iter().copied());
        }
    }

    fn is_ancestor(&self, candidate: usize, mut node: usize) -> bool {
        while let Some(parent) = self.nodes[node].parent {
            if parent == candidate {
                return true;
            }
            node = parent;
        }
        false
    }

    fn add_node(&mut self, position: Vec3, parent: usize) -> usize {
        let index = self.nodes.len();
        let cost = self.cost_through(parent, &position);
        self.nodes.push(TreeNode::new(position, cost, Some(parent)));
        self.nodes[parent].children.push(index);
        self.index.insert(position);
        index
    }

    fn cost_through(&self, parent: usize, position: &Vec3) -> f64 {
        self.nodes[parent].cost + self.metric.distance(&self.nodes[parent].position, position)
    }

    /// Root to goal when the goal is in the tree, otherwise root to the node
    /// closest to the goal
    pub fn search(&self) -> Path3D {
        let target = match self.goal_index {
            Some(i) => i,
            None => self.index.nearest(&self.goal).unwrap_or(0),
        };

        let mut points = vec![self.nodes[target].position];
        let mut current = target;
        while let Some(parent) = self.nodes[current].parent {
            points.push(self.nodes[parent].position);
            current = parent;
        }
        points.reverse();
        Path3D::from_points(points)
    }

    /// Cost from the root to the goal node, once the goal has been reached
    pub fn goal_cost(&self) -> Option<f64> {
        self.goal_index.map(|i| self.nodes[i].cost)
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_index.is_some()
    }

    pub fn goal(&self) -> &Vec3 {
        &self.goal
    }

    pub fn root(&self) -> &Vec3 {
        &self.nodes[0].position
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Parent to child segments
    pub fn edges(&self) -> Vec<(Vec3, Vec3)> {
        self.nodes
            .iter()
            .filter_map(|node| node.parent.map(|p| (self.nodes[p].position, node.position)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }
}
