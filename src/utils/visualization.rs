//! Visualization utilities for rust_crowd_planning
//!
//! Plots a [`Frame`] with gnuplot, projected onto the y-z plane the demos
//! run in. What gets drawn is decided by explicit [`DrawOptions`].

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};
use serde::{Deserialize, Serialize};

use crate::acting::Frame;
use crate::common::{Bounds, Obstacle, RoboticsError, RoboticsResult, Vec3};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00AA00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#AAAAAA";

    pub const OBSTACLE: &str = BLACK;
    pub const GRAPH: &str = GRAY;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const AGENT: &str = "#35C788";
}

/// Which layers of a frame to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOptions {
    pub obstacles: bool,
    pub graph: bool,
    pub paths: bool,
    pub agents: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            obstacles: true,
            graph: false,
            paths: true,
            agents: true,
        }
    }
}

/// Points on a circle of `radius` around `center` in the y-z plane
fn circle(center: &Vec3, radius: f64) -> (Vec<f64>, Vec<f64>) {
    (0..=36)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::PI / 18.0;
            (center.y + radius * angle.cos(), center.z + radius * angle.sin())
        })
        .unzip()
}

pub struct Visualizer {
    figure: Figure,
    title: String,
    options: DrawOptions,
    bounds: Option<Bounds>,
}

impl Visualizer {
    pub fn new(options: DrawOptions) -> Self {
        Self {
            figure: Figure::new(),
            title: String::new(),
            options,
            bounds: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Fix the plotted range to the y-z extent of `bounds`
    pub fn set_bounds(&mut self, bounds: Bounds) -> &mut Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn options(&self) -> &DrawOptions {
        &self.options
    }

    /// Draw everything the options enable into a single plot
    pub fn draw(&mut self, frame: &Frame, obstacles: &[Obstacle]) -> &mut Self {
        let options = self.options;
        let title = self.title.clone();
        let bounds = self.bounds;
        self.figure.clear_axes();
        let axes = self.figure.axes2d();

        if !title.is_empty() {
            axes.set_title(&title, &[]);
        }
        axes.set_x_label("y", &[]);
        axes.set_y_label("z", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
        if let Some(b) = bounds {
            axes.set_x_range(AutoOption::Fix(b.min.y), AutoOption::Fix(b.max.y));
            axes.set_y_range(AutoOption::Fix(b.min.z), AutoOption::Fix(b.max.z));
        }

        if options.graph {
            for (a, b) in &frame.edges {
                axes.lines(&[a.y, b.y], &[a.z, b.z], &[Color(colors::GRAPH), LineWidth(0.5)]);
            }
        }

        if options.obstacles {
            for obstacle in obstacles {
                let (ys, zs) = circle(&obstacle.center, obstacle.radius);
                axes.lines(&ys, &zs, &[Color(colors::OBSTACLE), LineWidth(2.0)]);
            }
        }

        if options.paths {
            for agent in frame.agents.iter().filter(|a| a.path.len() > 1) {
                let ys: Vec<f64> = agent.path.iter().map(|p| p.y).collect();
                let zs: Vec<f64> = agent.path.iter().map(|p| p.z).collect();
                axes.lines(&ys, &zs, &[Color(colors::PATH), LineWidth(2.0)]);
            }
            let starts: Vec<&Vec3> = frame.agents.iter().filter_map(|a| a.path.first()).collect();
            let goals: Vec<&Vec3> = frame.agents.iter().filter_map(|a| a.path.last()).collect();
            axes.points(
                starts.iter().map(|p| p.y),
                starts.iter().map(|p| p.z),
                &[Caption("Start"), Color(colors::START), PointSymbol('O'), PointSize(1.5)],
            );
            axes.points(
                goals.iter().map(|p| p.y),
                goals.iter().map(|p| p.z),
                &[Caption("Goal"), Color(colors::GOAL), PointSymbol('O'), PointSize(1.5)],
            );
        }

        if options.agents {
            for agent in &frame.agents {
                let (ys, zs) = circle(&agent.position, agent.radius);
                axes.lines(&ys, &zs, &[Color(colors::AGENT), LineWidth(2.0)]);
            }
        }

        self
    }

    pub fn show(&mut self) -> RoboticsResult<()> {
        self.figure
            .show()
            .map(|_| ())
            .map_err(|e| RoboticsError::VisualizationError(e.to_string()))
    }

    pub fn save_svg(&mut self, path: &str) -> RoboticsResult<()> {
        self.figure
            .save_to_svg(path, 800, 800)
            .map_err(|e| RoboticsError::VisualizationError(e.to_string()))
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new(DrawOptions::default())
    }
}
