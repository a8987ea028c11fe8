// Roadmap search demo
//
// Builds a 10k sample roadmap around a single obstacle, compares the five
// search algorithms and then walks the agent along the A* path.

use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_crowd_planning::acting::{ControlSignal, MultiAgentSystem, SystemConfig};
use rust_crowd_planning::configuration_space::BoundingSphereHierarchy;
use rust_crowd_planning::path_planning::SearchAlgorithm;
use rust_crowd_planning::utils::{DrawOptions, Visualizer};
use rust_crowd_planning::{AgentDescription, Bounds, Obstacle, RoboticsResult, Simulation, Vec3};

const SIDE: f64 = 100.0;
const DT: f64 = 0.1;

fn main() -> RoboticsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let plot = std::env::args().any(|arg| arg == "--plot");

    let bounds = Bounds::new(Vec3::new(0.0, -SIDE, -SIDE), Vec3::new(0.0, SIDE, SIDE))?;
    let obstacles = vec![Obstacle::new(Vec3::zeros(), SIDE * 0.1)];
    let description = AgentDescription::new(
        Vec3::new(0.0, SIDE * 0.9, -SIDE * 0.9),
        Vec3::new(0.0, -SIDE * 0.9, SIDE * 0.9),
        SIDE * 0.02,
    )?;
    let space = BoundingSphereHierarchy::new(&description, obstacles.clone(), bounds)?;
    let mut system = MultiAgentSystem::new(&[description], space, obstacles.clone(), &SystemConfig::default())?;

    for algorithm in [
        SearchAlgorithm::DepthFirst,
        SearchAlgorithm::BreadthFirst,
        SearchAlgorithm::UniformCost,
        SearchAlgorithm::AStar,
        SearchAlgorithm::weighted_a_star(2.0)?,
    ] {
        let path = system.roadmap().search_for_agent(algorithm, 0)?;
        info!(
            algorithm = algorithm.name(),
            milestones = path.len(),
            cost = system.roadmap().path_cost(&path),
            "search finished"
        );
    }

    system.apply(ControlSignal::Search(SearchAlgorithm::AStar))?;
    for step in 0..400 {
        system.step(DT);
        if step % 20 == 0 {
            println!("{}", serde_json::to_string(&system.frame().agents)?);
        }
        if system.agents().iter().all(|agent| agent.finished()) {
            info!(step, "agent reached goal");
            break;
        }
    }

    if plot {
        let mut vis = Visualizer::new(DrawOptions::default());
        vis.set_title("Roadmap A*").set_bounds(bounds);
        vis.draw(&system.frame(), &obstacles).show()?;
    }

    Ok(())
}
