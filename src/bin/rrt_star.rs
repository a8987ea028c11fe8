// RRT* demo
//
// Grows an optimal tree around an obstacle, keeps refining it in batches and
// lets the agent follow the smoothed result.

use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_crowd_planning::acting::{AgentConfig, ControlSignal, InteractionMode, TreeNavigator};
use rust_crowd_planning::configuration_space::PlainConfigurationSpace;
use rust_crowd_planning::path_planning::RrtStarConfig;
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
        Vec3::new(0.0, SIDE * 0.7, -SIDE * 0.6),
        Vec3::new(0.0, -SIDE * 0.1, SIDE * 0.1),
        SIDE * 0.025,
    )?;
    let space = PlainConfigurationSpace::new(&description, obstacles.clone(), bounds)?;
    let mut navigator = TreeNavigator::new(description, space, RrtStarConfig::default(), AgentConfig::default())?;

    navigator.apply(ControlSignal::GrowTree(1000))?;
    for _ in 0..10 {
        navigator.apply(ControlSignal::GrowTree(100))?;
        info!(
            nodes = navigator.tree().len(),
            goal_cost = ?navigator.tree().goal_cost(),
            "refined tree"
        );
    }

    navigator.apply(ControlSignal::SearchTree)?;
    navigator.apply(ControlSignal::SetInteraction(InteractionMode::Smooth))?;
    for _ in 0..300 {
        navigator.step(DT);
        if navigator.agent().finished() {
            break;
        }
    }
    let frame = navigator.frame();
    println!("{}", serde_json::to_string(&frame.agents)?);

    if plot {
        let mut vis = Visualizer::new(DrawOptions {
            graph: true,
            ..Default::default()
        });
        vis.set_title("RRT*").set_bounds(bounds);
        vis.draw(&frame, &obstacles).show()?;
    }

    Ok(())
}
