//! Graph search over a roadmap's adjacency lists
//!
//! All algorithms record predecessor ids and reconstruct the vertex sequence
//! from the goal back to the start. A disconnected goal yields `None`.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{Metric, RoboticsError, RoboticsResult, Vec3};

/// Roadmap vertex with its collision-checked neighbors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: usize,
    pub position: Vec3,
    /// (neighbor id, edge cost) in insertion order
    pub neighbors: Vec<(usize, f64)>,
}

impl Vertex {
    pub fn new(id: usize, position: Vec3) -> Self {
        Self {
            id,
            position,
            neighbors: Vec::new(),
        }
    }
}

/// Search strategy used to extract a path from a roadmap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SearchAlgorithm {
    DepthFirst,
    BreadthFirst,
    UniformCost,
    AStar,
    /// Heuristic inflated by ε ≥ 1
    WeightedAStar(f64),
}

impl SearchAlgorithm {
    pub fn weighted_a_star(epsilon: f64) -> RoboticsResult<Self> {
        let algorithm = SearchAlgorithm::WeightedAStar(epsilon);
        algorithm.validate()?;
        Ok(algorithm)
    }

    pub fn validate(&self) -> RoboticsResult<()> {
        match *self {
            SearchAlgorithm::WeightedAStar(epsilon) if !(epsilon.is_finite() && epsilon >= 1.0) => {
                Err(RoboticsError::InvalidParameter(format!(
                    "weighted A* epsilon must be >= 1, got {}",
                    epsilon
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchAlgorithm::DepthFirst => "DFS",
            SearchAlgorithm::BreadthFirst => "BFS",
            SearchAlgorithm::UniformCost => "UCS",
            SearchAlgorithm::AStar => "A*",
            SearchAlgorithm::WeightedAStar(_) => "weighted A*",
        }
    }
}

/// Run `algorithm` from `start` to `goal`, returning the vertex ids on the path
pub fn search(
    vertices: &[Vertex],
    metric: &Metric,
    algorithm: SearchAlgorithm,
    start: usize,
    goal: usize,
) -> Option<Vec<usize>> {
    match algorithm {
        SearchAlgorithm::DepthFirst => depth_first(vertices, start, goal),
        SearchAlgorithm::BreadthFirst => breadth_first(vertices, start, goal),
        SearchAlgorithm::UniformCost => best_first(vertices, metric, start, goal, 0.0),
        SearchAlgorithm::AStar => best_first(vertices, metric, start, goal, 1.0),
        SearchAlgorithm::WeightedAStar(epsilon) => best_first(vertices, metric, start, goal, epsilon),
    }
}

fn depth_first(vertices: &[Vertex], start: usize, goal: usize) -> Option<Vec<usize>> {
    let mut visited = vec![false; vertices.len()];
    let mut predecessor: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut stack = vec![(start, None)];

    while let Some((current, from)) = stack.pop() {
        if visited[current] {
            continue;
        }
        visited[current] = true;
        predecessor[current] = from;

        if current == goal {
            return Some(reconstruct_path(&predecessor, goal));
        }

        // reversed so the first inserted neighbor is expanded first
        for &(next, _) in vertices[current].neighbors.iter().rev() {
            if !visited[next] {
                stack.push((next, Some(current)));
            }
        }
    }

    None
}

fn breadth_first(vertices: &[Vertex], start: usize, goal: usize) -> Option<Vec<usize>> {
    let mut visited = vec![false; vertices.len()];
    let mut predecessor: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut queue = VecDeque::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return Some(reconstruct_path(&predecessor, goal));
        }

        for &(next, _) in &vertices[current].neighbors {
            if !visited[next] {
                visited[next] = true;
                predecessor[next] = Some(current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Uniform-cost (weight 0), A* (weight 1) and weighted A* (weight ε).
///
/// Closed vertices are never reopened; with a consistent heuristic this keeps
/// A* optimal and bounds weighted A* by ε times the optimal cost.
fn best_first(
    vertices: &[Vertex],
    metric: &Metric,
    start: usize,
    goal: usize,
    heuristic_weight: f64,
) -> Option<Vec<usize>> {
    let goal_position = vertices[goal].position;
    let heuristic = |id: usize| heuristic_weight * metric.distance(&vertices[id].position, &goal_position);

    let mut cost = vec![f64::INFINITY; vertices.len()];
    let mut predecessor: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut closed = vec![false; vertices.len()];
    let mut open = BinaryHeap::new();
    // insertion counter breaks priority ties first-in first-out
    let mut sequence = 0usize;

    cost[start] = 0.0;
    open.push(Reverse((OrderedFloat(heuristic(start)), sequence, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if closed[current] {
            continue;
        }
        if current == goal {
            return Some(reconstruct_path(&predecessor, goal));
        }
        closed[current] = true;

        for &(next, edge_cost) in &vertices[current].neighbors {
            if closed[next] {
                continue;
            }
            let new_cost = cost[current] + edge_cost;
            if new_cost < cost[next] {
                cost[next] = new_cost;
                predecessor[next] = Some(current);
                sequence += 1;
                open.push(Reverse((OrderedFloat(new_cost + heuristic(next)), sequence, next)));
            }
        }
    }

    None
}

fn reconstruct_path(predecessor: &[Option<usize>], goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(previous) = predecessor[current] {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
