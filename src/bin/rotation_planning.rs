// Rotation-aware planning demo
//
// A long line segment has to turn to slip between two columns of obstacles.
// Its orientation is planned as the scaled x coordinate of the roadmap.

use std::f64::consts::PI;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_crowd_planning::acting::{AgentConfig, ControlSignal, InteractionMode, MultiAgentSystem, SystemConfig};
use rust_crowd_planning::configuration_space::LineSegmentConfigurationSpace;
use rust_crowd_planning::path_planning::{RoadmapConfig, SearchAlgorithm};
use rust_crowd_planning::{AgentDescription, Bounds, Obstacle, RoboticsResult, Simulation, Vec3};

const SIDE: f64 = 100.0;
const ORIENTATION_SCALE: f64 = 25.0;
const DT: f64 = 0.1;

fn main() -> RoboticsResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bounds = Bounds::new(
        Vec3::new(0.0, -SIDE, -SIDE),
        Vec3::new(2.0 * PI * ORIENTATION_SCALE, SIDE, SIDE),
    )?;
    let obstacles: Vec<Obstacle> = (0..5)
        .flat_map(|i| {
            let z = -SIDE + 20.0 * i as f64;
            [
                Obstacle::new(Vec3::new(0.0, SIDE * 0.7, z), 8.0),
                Obstacle::new(Vec3::new(0.0, -SIDE * 0.7, z), 8.0),
            ]
        })
        .collect();
    let description = AgentDescription::new(
        Vec3::new(PI * ORIENTATION_SCALE, -SIDE * 0.9, -SIDE * 0.9),
        Vec3::new(0.0, SIDE * 0.9, -SIDE * 0.9),
        60.0,
    )?;
    let space = LineSegmentConfigurationSpace::new(&description, obstacles.clone(), bounds, ORIENTATION_SCALE)?;

    let config = SystemConfig {
        roadmap: RoadmapConfig {
            sample_count: 25_000,
            max_edge_length: 10.0,
            seed: 3,
        },
        agent: AgentConfig {
            speed: 10.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut system = MultiAgentSystem::new(&[description], space, Vec::new(), &config)?;
    system.apply(ControlSignal::Search(SearchAlgorithm::AStar))?;
    system.apply(ControlSignal::SetInteraction(InteractionMode::Smooth))?;

    let milestones = system.agents()[0].path().len();
    info!(milestones, "rotation path found");

    for step in 0..2000 {
        system.step(DT);
        if step % 50 == 0 {
            let agent = &system.agents()[0];
            let (p1, p2) = system.space().endpoints(agent.position());
            info!(
                orientation = system.space().orientation(agent.position()),
                y = agent.position().y,
                z = agent.position().z,
                "segment at ({:.1}, {:.1}) - ({:.1}, {:.1})",
                p1.y,
                p1.z,
                p2.y,
                p2.z
            );
        }
        if system.agents()[0].finished() {
            break;
        }
    }
    println!("{}", serde_json::to_string(&system.frame().agents)?);

    Ok(())
}
