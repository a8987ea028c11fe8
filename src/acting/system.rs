//! Frame-stepped simulation drivers
//!
//! [`MultiAgentSystem`] shares one roadmap between many agents and moves them
//! with the selected interaction model. [`TreeNavigator`] drives a single
//! agent along paths extracted from a growing RRT* tree. Both consume
//! [`ControlSignal`]s and report their state as a serializable [`Frame`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::acting::{Agent, AgentConfig, FlockingConfig, FlockingResolver, TtcConfig, TtcResolver};
use crate::common::{
    AgentDescription, ConfigurationSpace, LocalCollisionResolver, Obstacle, RoboticsError, RoboticsResult,
    Simulation, Vec3,
};
use crate::path_planning::{OptimalTree, Roadmap, RoadmapConfig, RrtStarConfig, SearchAlgorithm};

/// How agents move between milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Follow the path, ignoring other agents
    Guided,
    /// Time-to-collision avoidance between agents and obstacles
    Ttc,
    Flocking,
    /// Follow the path, shortcutting to visible milestones
    Smooth,
}

/// Discrete user input consumed by a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlSignal {
    StepForward,
    StepBackward,
    TogglePause,
    /// Assign every agent its roadmap path found with the given algorithm
    Search(SearchAlgorithm),
    /// Assign the tree's current best path
    SearchTree,
    /// Run this many more tree iterations
    GrowTree(usize),
    SetInteraction(InteractionMode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentFrame {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f64,
    pub path: Vec<Vec3>,
    pub milestone: usize,
    pub paused: bool,
}

impl From<&Agent> for AgentFrame {
    fn from(agent: &Agent) -> Self {
        Self {
            position: *agent.position(),
            velocity: *agent.velocity(),
            radius: agent.radius(),
            path: agent.path().points.clone(),
            milestone: agent.milestone(),
            paused: agent.is_paused(),
        }
    }
}

/// Snapshot of a simulation for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub time: f64,
    pub mode: InteractionMode,
    pub agents: Vec<AgentFrame>,
    /// Roadmap vertices or tree nodes
    pub vertices: Vec<Vec3>,
    /// Roadmap edges or tree parent-child segments
    pub edges: Vec<(Vec3, Vec3)>,
}

impl Frame {
    pub fn to_json(&self) -> RoboticsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Tunables of a [`MultiAgentSystem`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemConfig {
    pub roadmap: RoadmapConfig,
    pub agent: AgentConfig,
    pub ttc: TtcConfig,
    pub flocking: FlockingConfig,
}

impl SystemConfig {
    pub fn validate(&self) -> RoboticsResult<()> {
        self.roadmap.validate()?;
        self.agent.validate()?;
        self.ttc.validate()?;
        self.flocking.validate()
    }
}

/// Many agents sharing one roadmap
pub struct MultiAgentSystem<S: ConfigurationSpace> {
    space: S,
    obstacles: Vec<Obstacle>,
    roadmap: Roadmap,
    agents: Vec<Agent>,
    ttc: TtcResolver,
    flocking: FlockingResolver,
    mode: InteractionMode,
    time: f64,
}

impl<S: ConfigurationSpace> MultiAgentSystem<S> {
    /// Build the shared roadmap and place every agent at its start.
    ///
    /// `obstacles` are the ones the local resolvers react to; usually the
    /// same set the space was built from.
    pub fn new(
        descriptions: &[AgentDescription],
        space: S,
        obstacles: Vec<Obstacle>,
        config: &SystemConfig,
    ) -> RoboticsResult<Self> {
        config.validate()?;
        let roadmap = Roadmap::build(descriptions, &space, &config.roadmap)?;
        let metric = space.metric();
        let agents = descriptions
            .iter()
            .map(|d| Agent::new(*d, config.agent).map(|agent| agent.with_metric(metric)))
            .collect::<RoboticsResult<Vec<_>>>()?;

        info!(
            agents = agents.len(),
            vertices = roadmap.vertex_count(),
            edges = roadmap.edge_count(),
            "multi-agent system ready"
        );

        Ok(Self {
            space,
            obstacles,
            roadmap,
            agents,
            ttc: TtcResolver::new(config.ttc)?,
            flocking: FlockingResolver::new(config.flocking.clone())?,
            mode: InteractionMode::Guided,
            time: 0.0,
        })
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn roadmap(&self) -> &Roadmap {
        &self.roadmap
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    fn assign_paths(&mut self, algorithm: SearchAlgorithm) -> RoboticsResult<()> {
        algorithm.validate()?;
        for (i, agent) in self.agents.iter_mut().enumerate() {
            let path = self.roadmap.search_for_agent(algorithm, i)?;
            if path.is_empty() {
                debug!(agent = i, algorithm = algorithm.name(), "no roadmap path");
            }
            agent.set_path(path);
        }
        Ok(())
    }
}

impl<S: ConfigurationSpace> Simulation for MultiAgentSystem<S> {
    fn apply(&mut self, signal: ControlSignal) -> RoboticsResult<()> {
        match signal {
            ControlSignal::StepForward => self.agents.iter_mut().for_each(Agent::step_forward),
            ControlSignal::StepBackward => self.agents.iter_mut().for_each(Agent::step_backward),
            ControlSignal::TogglePause => self.agents.iter_mut().for_each(Agent::toggle_pause),
            ControlSignal::Search(algorithm) => self.assign_paths(algorithm)?,
            ControlSignal::SetInteraction(mode) => self.mode = mode,
            ControlSignal::SearchTree | ControlSignal::GrowTree(_) => {
                return Err(RoboticsError::InvalidParameter(format!(
                    "{:?} needs a tree driver",
                    signal
                )))
            }
        }
        Ok(())
    }

    fn step(&mut self, dt: f64) {
        match self.mode {
            InteractionMode::Guided => self.agents.iter_mut().for_each(|agent| agent.update(dt)),
            InteractionMode::Smooth => {
                let space = &self.space;
                self.agents.iter_mut().for_each(|agent| agent.smooth_update(dt, space));
            }
            InteractionMode::Ttc => self.ttc.resolve(&mut self.agents, &self.obstacles, dt),
            InteractionMode::Flocking => self.flocking.resolve(&mut self.agents, &self.obstacles, dt),
        }
        self.time += dt;
    }

    fn frame(&self) -> Frame {
        Frame {
            time: self.time,
            mode: self.mode,
            agents: self.agents.iter().map(AgentFrame::from).collect(),
            vertices: self.roadmap.vertices().iter().map(|v| v.position).collect(),
            edges: self.roadmap.edges(),
        }
    }
}

/// One agent following an incrementally grown RRT* tree
pub struct TreeNavigator<S: ConfigurationSpace> {
    space: S,
    tree: OptimalTree,
    agent: Agent,
    mode: InteractionMode,
    time: f64,
}

impl<S: ConfigurationSpace> TreeNavigator<S> {
    pub fn new(
        description: AgentDescription,
        space: S,
        tree_config: RrtStarConfig,
        agent_config: AgentConfig,
    ) -> RoboticsResult<Self> {
        let tree = OptimalTree::new(description.start, description.goal, tree_config)?;
        let agent = Agent::new(description, agent_config)?.with_metric(space.metric());
        Ok(Self {
            space,
            tree,
            agent,
            mode: InteractionMode::Guided,
            time: 0.0,
        })
    }

    pub fn tree(&self) -> &OptimalTree {
        &self.tree
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

impl<S: ConfigurationSpace> Simulation for TreeNavigator<S> {
    fn apply(&mut self, signal: ControlSignal) -> RoboticsResult<()> {
        match signal {
            ControlSignal::StepForward => self.agent.step_forward(),
            ControlSignal::StepBackward => self.agent.step_backward(),
            ControlSignal::TogglePause => self.agent.toggle_pause(),
            ControlSignal::SearchTree => self.agent.set_path(self.tree.search()),
            ControlSignal::GrowTree(iterations) => {
                self.tree.grow_tree(iterations, &self.space);
            }
            ControlSignal::SetInteraction(mode @ (InteractionMode::Guided | InteractionMode::Smooth)) => {
                self.mode = mode
            }
            ControlSignal::Search(_) | ControlSignal::SetInteraction(_) => {
                return Err(RoboticsError::InvalidParameter(format!(
                    "{:?} is not supported by a tree driver",
                    signal
                )))
            }
        }
        Ok(())
    }

    fn step(&mut self, dt: f64) {
        match self.mode {
            InteractionMode::Smooth => self.agent.smooth_update(dt, &self.space),
            _ => self.agent.update(dt),
        }
        self.time += dt;
    }

    fn frame(&self) -> Frame {
        Frame {
            time: self.time,
            mode: self.mode,
            agents: vec![AgentFrame::from(&self.agent)],
            vertices: self.tree.nodes().iter().map(|n| n.position).collect(),
            edges: self.tree.edges(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Bounds;
    use crate::configuration_space::BoundingSphereHierarchy;

    fn plane_bounds() -> Bounds {
        Bounds::new(Vec3::new(0.0, -100.0, -100.0), Vec3::new(0.0, 100.0, 100.0)).unwrap()
    }

    fn obstacles() -> Vec<Obstacle> {
        vec![Obstacle::new(Vec3::zeros(), 10.0)]
    }

    fn descriptions() -> Vec<AgentDescription> {
        vec![
            AgentDescription::new(Vec3::new(0.0, 90.0, -90.0), Vec3::new(0.0, -90.0, 90.0), 2.0).unwrap(),
            AgentDescription::new(Vec3::new(0.0, -90.0, 90.0), Vec3::new(0.0, 90.0, -90.0), 2.0).unwrap(),
        ]
    }

    fn create_test_system() -> MultiAgentSystem<BoundingSphereHierarchy> {
        let descriptions = descriptions();
        let space = BoundingSphereHierarchy::new(&descriptions[0], obstacles(), plane_bounds()).unwrap();
        let config = SystemConfig {
            roadmap: RoadmapConfig {
                sample_count: 2000,
                max_edge_length: 15.0,
                seed: 8,
            },
            ..Default::default()
        };
        MultiAgentSystem::new(&descriptions, space, obstacles(), &config).unwrap()
    }

    fn create_test_navigator() -> TreeNavigator<BoundingSphereHierarchy> {
        let description =
            AgentDescription::new(Vec3::new(0.0, 70.0, -60.0), Vec3::new(0.0, -10.0, 10.0), 2.5).unwrap();
        let space = BoundingSphereHierarchy::new(&description, obstacles(), plane_bounds()).unwrap();
        let config = RrtStarConfig {
            goal_sample_rate: 0.2,
            seed: 6,
            ..Default::default()
        };
        TreeNavigator::new(description, space, config, AgentConfig::default()).unwrap()
    }

    #[test]
    fn test_search_assigns_every_agent_a_path() {
        let mut system = create_test_system();
        system.apply(ControlSignal::Search(SearchAlgorithm::AStar)).unwrap();
        for (agent, description) in system.agents().iter().zip(descriptions()) {
            assert_eq!(agent.path().first(), Some(&description.start));
            assert_eq!(agent.path().last(), Some(&description.goal));
        }
    }

    #[test]
    fn test_roadmap_driver_rejects_tree_signals() {
        let mut system = create_test_system();
        assert!(system.apply(ControlSignal::GrowTree(10)).is_err());
        assert!(system.apply(ControlSignal::SearchTree).is_err());
        assert!(system.apply(ControlSignal::Search(SearchAlgorithm::WeightedAStar(0.5))).is_err());
    }

    #[test]
    fn test_signals_reach_every_agent() {
        let mut system = create_test_system();
        system.apply(ControlSignal::Search(SearchAlgorithm::BreadthFirst)).unwrap();
        system.apply(ControlSignal::StepForward).unwrap();
        system.apply(ControlSignal::StepForward).unwrap();
        assert!(system.agents().iter().all(|agent| agent.milestone() == 2));
        system.apply(ControlSignal::StepBackward).unwrap();
        assert!(system.agents().iter().all(|agent| agent.milestone() == 1));
        system.apply(ControlSignal::TogglePause).unwrap();
        assert!(system.agents().iter().all(Agent::is_paused));
    }

    #[test]
    fn test_every_mode_moves_agents() {
        for mode in [
            InteractionMode::Guided,
            InteractionMode::Smooth,
            InteractionMode::Ttc,
            InteractionMode::Flocking,
        ] {
            let mut system = create_test_system();
            system.apply(ControlSignal::Search(SearchAlgorithm::AStar)).unwrap();
            system.apply(ControlSignal::SetInteraction(mode)).unwrap();
            for _ in 0..5 {
                system.step(0.1);
            }
            assert_eq!(system.mode(), mode);
            for (agent, description) in system.agents().iter().zip(descriptions()) {
                assert_ne!(*agent.position(), description.start, "{:?}", mode);
            }
        }
    }

    #[test]
    fn test_frame_serializes() {
        let mut system = create_test_system();
        system.apply(ControlSignal::Search(SearchAlgorithm::UniformCost)).unwrap();
        system.step(0.1);
        let frame = system.frame();
        assert_eq!(frame.agents.len(), 2);
        assert_eq!(frame.vertices.len(), system.roadmap().vertex_count());
        assert_eq!(frame.edges.len(), system.roadmap().edge_count());
        assert!((frame.time - 0.1).abs() < 1e-12);

        let json = frame.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "Guided");
        assert_eq!(value["agents"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tree_navigator_signals() {
        let mut navigator = create_test_navigator();
        navigator.apply(ControlSignal::GrowTree(3000)).unwrap();
        assert!(navigator.tree().len() > 1);
        navigator.apply(ControlSignal::SearchTree).unwrap();
        assert_eq!(navigator.agent().path(), &navigator.tree().search());

        navigator.apply(ControlSignal::SetInteraction(InteractionMode::Smooth)).unwrap();
        navigator.step(0.1);
        assert_ne!(*navigator.agent().position(), Vec3::new(0.0, 70.0, -60.0));

        let frame = navigator.frame();
        assert_eq!(frame.vertices.len(), navigator.tree().len());
        assert_eq!(frame.edges.len(), navigator.tree().len() - 1);
    }

    #[test]
    fn test_tree_driver_rejects_roadmap_signals() {
        let mut navigator = create_test_navigator();
        assert!(navigator.apply(ControlSignal::Search(SearchAlgorithm::AStar)).is_err());
        assert!(navigator.apply(ControlSignal::SetInteraction(InteractionMode::Ttc)).is_err());
        assert!(navigator.apply(ControlSignal::SetInteraction(InteractionMode::Guided)).is_ok());
    }
}
