// TTC crowd demo
//
// Agents start on a circle and cross to the opposite side through a field of
// obstacles, avoiding each other with the time-to-collision force model.

use itertools::Itertools;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_crowd_planning::acting::{ControlSignal, InteractionMode, MultiAgentSystem, SystemConfig};
use rust_crowd_planning::configuration_space::BoundingSphereHierarchy;
use rust_crowd_planning::path_planning::{RoadmapConfig, SearchAlgorithm};
use rust_crowd_planning::utils::{DrawOptions, Visualizer};
use rust_crowd_planning::{AgentDescription, Bounds, Obstacle, RoboticsResult, Simulation, Vec3};

const SIDE: f64 = 100.0;
const NUM_AGENTS: usize = 12;
const AGENT_RADIUS: f64 = 2.0;
const DT: f64 = 0.1;

fn main() -> RoboticsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let plot = std::env::args().any(|arg| arg == "--plot");

    let bounds = Bounds::new(Vec3::new(0.0, -SIDE, -SIDE), Vec3::new(0.0, SIDE, SIDE))?;
    let obstacles = vec![
        Obstacle::new(Vec3::new(0.0, 0.0, 0.0), 12.0),
        Obstacle::new(Vec3::new(0.0, 40.0, 30.0), 8.0),
        Obstacle::new(Vec3::new(0.0, -35.0, -40.0), 8.0),
        Obstacle::new(Vec3::new(0.0, -40.0, 35.0), 6.0),
    ];

    let descriptions = (0..NUM_AGENTS)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / NUM_AGENTS as f64;
            let on_circle = Vec3::new(0.0, angle.cos(), angle.sin()) * SIDE * 0.8;
            AgentDescription::new(on_circle, -on_circle, AGENT_RADIUS)
        })
        .collect::<RoboticsResult<Vec<_>>>()?;

    let space = BoundingSphereHierarchy::new(&descriptions[0], obstacles.clone(), bounds)?;
    let config = SystemConfig {
        roadmap: RoadmapConfig {
            sample_count: 5000,
            max_edge_length: 15.0,
            seed: 7,
        },
        ..Default::default()
    };
    let mut system = MultiAgentSystem::new(&descriptions, space, obstacles.clone(), &config)?;
    system.apply(ControlSignal::Search(SearchAlgorithm::AStar))?;
    system.apply(ControlSignal::SetInteraction(InteractionMode::Ttc))?;

    let mut min_separation = f64::INFINITY;
    for step in 0..1500 {
        system.step(DT);
        for (a, b) in system.agents().iter().tuple_combinations() {
            let gap = (a.position() - b.position()).norm() - a.radius() - b.radius();
            min_separation = min_separation.min(gap);
        }
        if step % 50 == 0 {
            println!("{}", serde_json::to_string(&system.frame().agents)?);
        }
        if system.agents().iter().all(|agent| agent.finished()) {
            info!(step, "all agents arrived");
            break;
        }
    }
    info!(min_separation, "crowd run finished");

    if plot {
        let mut vis = Visualizer::new(DrawOptions::default());
        vis.set_title("TTC crowd").set_bounds(bounds);
        vis.draw(&system.frame(), &obstacles).show()?;
    }

    Ok(())
}
