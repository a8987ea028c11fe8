//! Probabilistic Road-Map (PRM) shared by one or more agents
//!
//! The roadmap samples free configurations once, connects every pair within
//! the maximum edge length whose straight move is collision free, and then
//! answers independent start/goal queries for each registered agent.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::common::{
    ensure_positive, AgentDescription, ConfigurationSpace, Metric, NearestNeighbors, Path3D, RoboticsError,
    RoboticsResult, Vec3,
};
use crate::path_planning::graph_search::{self, SearchAlgorithm, Vertex};
use crate::path_planning::neighbors::{GridIndex, LinearScan};
use crate::utils::Sampler;

/// Configuration for roadmap construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapConfig {
    /// Number of free configurations to sample
    pub sample_count: usize,
    /// Longest edge the roadmap may contain
    pub max_edge_length: f64,
    /// Seed of the sampling stream
    pub seed: u64,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            sample_count: 10_000,
            max_edge_length: 10.0,
            seed: 0,
        }
    }
}

impl RoadmapConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        if self.sample_count == 0 {
            return Err(RoboticsError::InvalidParameter(
                "sample count must be positive".to_string(),
            ));
        }
        ensure_positive("max edge length", self.max_edge_length)
    }
}

/// Roadmap graph. Agent `k` owns vertices `2k` (start) and `2k + 1` (goal).
#[derive(Debug, Clone)]
pub struct Roadmap {
    vertices: Vec<Vertex>,
    agent_count: usize,
    edge_count: usize,
    metric: Metric,
}

impl Roadmap {
    /// Register the start/goal pairs of every agent sharing this roadmap
    pub fn new(descriptions: &[AgentDescription]) -> RoboticsResult<Self> {
        if descriptions.is_empty() {
            return Err(RoboticsError::InvalidParameter(
                "roadmap needs at least one agent".to_string(),
            ));
        }

        let mut vertices = Vec::with_capacity(descriptions.len() * 2);
        for description in descriptions {
            vertices.push(Vertex::new(vertices.len(), description.start));
            vertices.push(Vertex::new(vertices.len(), description.goal));
        }

        Ok(Self {
            vertices,
            agent_count: descriptions.len(),
            edge_count: 0,
            metric: Metric::Euclidean,
        })
    }

    /// Sample, filter and connect a roadmap in one go. Fails with
    /// `PlanningError` when the space leaves no free configuration to sample.
    pub fn build<S: ConfigurationSpace + ?Sized>(
        descriptions: &[AgentDescription],
        space: &S,
        config: &RoadmapConfig,
    ) -> RoboticsResult<Self> {
        config.validate()?;
        let mut roadmap = Self::new(descriptions)?;
        let mut sampler = Sampler::new(config.seed);
        let candidates = sampler.sample_free(space, config.sample_count);
        if candidates.is_empty() {
            return Err(RoboticsError::PlanningError(
                "no collision-free configuration could be sampled".to_string(),
            ));
        }
        roadmap.generate_vertices(&candidates, space);
        roadmap.generate_adjacencies(config.max_edge_length, space)?;
        Ok(roadmap)
    }

    /// Keep the candidates the space accepts. Start and goal vertices are
    /// always retained; previously generated samples and edges are dropped.
    pub fn generate_vertices<S: ConfigurationSpace + ?Sized>(&mut self, candidates: &[Vec3], space: &S) -> usize {
        self.vertices.truncate(self.agent_count * 2);
        for vertex in &mut self.vertices {
            vertex.neighbors.clear();
        }
        self.edge_count = 0;

        for q in candidates {
            if space.is_valid(q) {
                let id = self.vertices.len();
                self.vertices.push(Vertex::new(id, *q));
            }
        }

        let kept = self.vertices.len() - self.agent_count * 2;
        debug!(candidates = candidates.len(), kept, "generated roadmap vertices");
        kept
    }

    /// Connect every vertex pair within `max_edge_length` by a valid straight edge
    pub fn generate_adjacencies<S: ConfigurationSpace + ?Sized>(
        &mut self,
        max_edge_length: f64,
        space: &S,
    ) -> RoboticsResult<usize> {
        ensure_positive("max edge length", max_edge_length)?;
        self.metric = space.metric();

        match self.metric {
            Metric::Euclidean => {
                let mut index = GridIndex::new(max_edge_length);
                self.connect_with(&mut index, max_edge_length, space);
            }
            Metric::WrappedX { .. } => {
                let mut index = LinearScan::new(self.metric);
                self.connect_with(&mut index, max_edge_length, space);
            }
        }

        info!(
            vertices = self.vertices.len(),
            edges = self.edge_count,
            "generated roadmap adjacencies"
        );
        Ok(self.edge_count)
    }

    fn connect_with<N, S>(&mut self, index: &mut N, max_edge_length: f64, space: &S)
    where
        N: NearestNeighbors,
        S: ConfigurationSpace + ?Sized,
    {
        for vertex in &mut self.vertices {
            vertex.neighbors.clear();
        }
        self.edge_count = 0;

        for vertex in &self.vertices {
            index.insert(vertex.position);
        }

        for i in 0..self.vertices.len() {
            let position = self.vertices[i].position;
            for j in index.within_radius(&position, max_edge_length) {
                if j <= i {
                    continue;
                }
                let other = self.vertices[j].position;
                if space.is_valid_edge(&position, &other) {
                    let cost = self.metric.distance(&position, &other);
                    self.vertices[i].neighbors.push((j, cost));
                    self.vertices[j].neighbors.push((i, cost));
                    self.edge_count += 1;
                }
            }
        }
    }

    /// Path between two vertex ids; empty when the goal is unreachable
    pub fn search(&self, algorithm: SearchAlgorithm, start: usize, goal: usize) -> RoboticsResult<Path3D> {
        algorithm.validate()?;
        for id in [start, goal] {
            if id >= self.vertices.len() {
                return Err(RoboticsError::InvalidParameter(format!(
                    "vertex {} does not exist ({} vertices)",
                    id,
                    self.vertices.len()
                )));
            }
        }

        let path = match graph_search::search(&self.vertices, &self.metric, algorithm, start, goal) {
            Some(ids) => Path3D::from_points(ids.into_iter().map(|id| self.vertices[id].position).collect()),
            None => Path3D::new(),
        };
        debug!(
            algorithm = algorithm.name(),
            start,
            goal,
            milestones = path.len(),
            "roadmap search finished"
        );
        Ok(path)
    }

    /// Path between the registered start and goal of agent `agent_index`
    pub fn search_for_agent(&self, algorithm: SearchAlgorithm, agent_index: usize) -> RoboticsResult<Path3D> {
        let (start, goal) = self.endpoints(agent_index).ok_or_else(|| {
            RoboticsError::InvalidParameter(format!(
                "agent {} is not registered ({} agents)",
                agent_index, self.agent_count
            ))
        })?;
        self.search(algorithm, start, goal)
    }

    /// Start and goal vertex ids of an agent
    pub fn endpoints(&self, agent_index: usize) -> Option<(usize, usize)> {
        if agent_index < self.agent_count {
            Some((2 * agent_index, 2 * agent_index + 1))
        } else {
            None
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Every undirected edge once, as its end configurations
    pub fn edges(&self) -> Vec<(Vec3, Vec3)> {
        let mut edges = Vec::with_capacity(self.edge_count);

        for (i, vertex) in self.vertices.iter().enumerate() {
            for &(j, _) in &vertex.neighbors {
                if i < j {
                    edges.push((vertex.position, self.vertices[j].position));
                }
            }
        }

        edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn path_cost(&self, path: &Path3D) -> f64 {
        path.total_length(&self.metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Bounds, Obstacle};
    use crate::configuration_space::{BoundingSphereHierarchy, PlainConfigurationSpace};
    use itertools::Itertools;

    const ALL: [SearchAlgorithm; 5] = [
        SearchAlgorithm::DepthFirst,
        SearchAlgorithm::BreadthFirst,
        SearchAlgorithm::UniformCost,
        SearchAlgorithm::AStar,
        SearchAlgorithm::WeightedAStar(1.5),
    ];

    fn plane_bounds() -> Bounds {
        Bounds::new(Vec3::new(0.0, -100.0, -100.0), Vec3::new(0.0, 100.0, 100.0)).unwrap()
    }

    fn scenario_description() -> AgentDescription {
        AgentDescription::new(Vec3::new(0.0, 90.0, -90.0), Vec3::new(0.0, -90.0, 90.0), 2.0).unwrap()
    }

    fn scenario_space(description: &AgentDescription) -> BoundingSphereHierarchy {
        BoundingSphereHierarchy::new(description, vec![Obstacle::new(Vec3::zeros(), 10.0)], plane_bounds()).unwrap()
    }

    fn small_roadmap(seed: u64) -> (Roadmap, PlainConfigurationSpace) {
        let description = scenario_description();
        let obstacles = vec![
            Obstacle::new(Vec3::new(0.0, 0.0, 0.0), 25.0),
            Obstacle::new(Vec3::new(0.0, 55.0, 40.0), 15.0),
            Obstacle::new(Vec3::new(0.0, -50.0, -45.0), 20.0),
        ];
        let space = PlainConfigurationSpace::new(&description, obstacles, plane_bounds()).unwrap();
        let config = RoadmapConfig {
            sample_count: 1500,
            max_edge_length: 15.0,
            seed,
        };
        let roadmap = Roadmap::build(&[description], &space, &config).unwrap();
        (roadmap, space)
    }

    #[test]
    fn test_requires_an_agent() {
        assert!(Roadmap::new(&[]).is_err());
    }

    #[test]
    fn test_rejects_bad_config() {
        let description = scenario_description();
        let space = scenario_space(&description);
        let zero_samples = RoadmapConfig {
            sample_count: 0,
            ..Default::default()
        };
        assert!(Roadmap::build(&[description], &space, &zero_samples).is_err());
        let mut roadmap = Roadmap::new(&[description]).unwrap();
        assert!(roadmap.generate_adjacencies(0.0, &space).is_err());
    }

    #[test]
    fn test_fully_blocked_space_is_a_planning_error() {
        let description = AgentDescription::new(Vec3::zeros(), Vec3::new(0.0, 5.0, 5.0), 1.0).unwrap();
        let bounds = Bounds::new(Vec3::new(0.0, -10.0, -10.0), Vec3::new(0.0, 10.0, 10.0)).unwrap();
        let space = PlainConfigurationSpace::new(&description, vec![Obstacle::new(Vec3::zeros(), 20.0)], bounds).unwrap();
        let config = RoadmapConfig {
            sample_count: 10,
            ..Default::default()
        };
        let result = Roadmap::build(&[description], &space, &config);
        assert!(matches!(result, Err(RoboticsError::PlanningError(_))));
    }

    #[test]
    fn test_vertices_and_edges_are_valid() {
        let (roadmap, space) = small_roadmap(11);
        for vertex in &roadmap.vertices()[2..] {
            assert!(space.is_valid(&vertex.position));
        }
        for (a, b) in roadmap.edges() {
            assert!(space.is_valid_edge(&a, &b));
            assert!((a - b).norm() <= 15.0);
        }
        assert_eq!(roadmap.edges().len(), roadmap.edge_count());
    }

    #[test]
    fn test_start_and_goal_always_retained() {
        let description = AgentDescription::new(Vec3::zeros(), Vec3::new(0.0, 50.0, 50.0), 2.0).unwrap();
        let space = scenario_space(&description);
        let mut roadmap = Roadmap::new(&[description]).unwrap();
        let kept = roadmap.generate_vertices(&[Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, 40.0, 40.0)], &space);
        assert_eq!(kept, 1);
        assert_eq!(roadmap.vertex_count(), 3);
        assert_eq!(roadmap.vertices()[0].position, Vec3::zeros());
    }

    #[test]
    fn test_cost_based_searches_agree() {
        let (roadmap, _) = small_roadmap(5);
        let ucs = roadmap.search_for_agent(SearchAlgorithm::UniformCost, 0).unwrap();
        let a_star = roadmap.search_for_agent(SearchAlgorithm::AStar, 0).unwrap();
        let unit_weight = roadmap.search_for_agent(SearchAlgorithm::WeightedAStar(1.0), 0).unwrap();
        let inflated = roadmap.search_for_agent(SearchAlgorithm::WeightedAStar(2.0), 0).unwrap();
        assert!(!a_star.is_empty());

        let optimal = roadmap.path_cost(&a_star);
        assert!((roadmap.path_cost(&ucs) - optimal).abs() < 1e-6);
        assert!((roadmap.path_cost(&unit_weight) - optimal).abs() < 1e-6);
        assert!(roadmap.path_cost(&inflated) <= 2.0 * optimal + 1e-6);
    }

    #[test]
    fn test_breadth_first_has_fewest_edges() {
        let (roadmap, _) = small_roadmap(9);
        let bfs = roadmap.search_for_agent(SearchAlgorithm::BreadthFirst, 0).unwrap();
        assert!(!bfs.is_empty());
        for algorithm in ALL {
            let path = roadmap.search_for_agent(algorithm, 0).unwrap();
            assert!(bfs.edge_count() <= path.edge_count(), "{} beat BFS", algorithm.name());
        }
    }

    #[test]
    fn test_every_search_returns_connected_path() {
        let (roadmap, space) = small_roadmap(3);
        let description = scenario_description();
        for algorithm in ALL {
            let path = roadmap.search_for_agent(algorithm, 0).unwrap();
            assert_eq!(path.first(), Some(&description.start));
            assert_eq!(path.last(), Some(&description.goal));
            for (a, b) in path.points.iter().tuple_windows() {
                assert!(space.is_valid_edge(a, b));
            }
        }
    }

    #[test]
    fn test_enclosed_goal_gives_empty_paths() {
        // goal sits inside an obstacle wider than any edge
        let description = AgentDescription::new(Vec3::new(0.0, 90.0, -90.0), Vec3::zeros(), 2.0).unwrap();
        let space = scenario_space(&description);
        let config = RoadmapConfig {
            sample_count: 800,
            max_edge_length: 10.0,
            seed: 2,
        };
        let roadmap = Roadmap::build(&[description], &space, &config).unwrap();
        assert!(roadmap.vertices()[1].neighbors.is_empty());
        for algorithm in ALL {
            assert!(roadmap.search_for_agent(algorithm, 0).unwrap().is_empty());
        }
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let (roadmap, _) = small_roadmap(1);
        assert!(roadmap.search_for_agent(SearchAlgorithm::AStar, 1).is_err());
        assert!(roadmap.search(SearchAlgorithm::AStar, 0, roadmap.vertex_count()).is_err());
        assert!(roadmap.search(SearchAlgorithm::WeightedAStar(0.2), 0, 1).is_err());
    }

    #[test]
    fn test_agents_share_one_roadmap() {
        let first = scenario_description();
        let second = AgentDescription::new(Vec3::new(0.0, -90.0, -90.0), Vec3::new(0.0, 90.0, 90.0), 2.0).unwrap();
        let space = scenario_space(&first);
        let config = RoadmapConfig {
            sample_count: 2000,
            max_edge_length: 15.0,
            seed: 4,
        };
        let roadmap = Roadmap::build(&[first, second], &space, &config).unwrap();
        assert_eq!(roadmap.agent_count(), 2);
        assert_eq!(roadmap.endpoints(1), Some((2, 3)));
        let path = roadmap.search_for_agent(SearchAlgorithm::AStar, 1).unwrap();
        assert_eq!(path.first(), Some(&second.start));
        assert_eq!(path.last(), Some(&second.goal));
    }

    #[test]
    fn test_scenario_ten_thousand_samples() {
        let description = scenario_description();
        let space = scenario_space(&description);
        let config = RoadmapConfig {
            sample_count: 10_000,
            max_edge_length: 10.0,
            seed: 0,
        };
        let roadmap = Roadmap::build(&[description], &space, &config).unwrap();
        assert_eq!(roadmap.vertex_count(), 10_002);

        let path = roadmap.search_for_agent(SearchAlgorithm::AStar, 0).unwrap();
        assert!(!path.is_empty());
        assert_eq!(path.first(), Some(&description.start));
        assert_eq!(path.last(), Some(&description.goal));
        for (a, b) in path.points.iter().tuple_windows() {
            assert!(space.is_valid_edge(a, b));
            assert!((a - b).norm() <= 10.0);
        }
    }
}
