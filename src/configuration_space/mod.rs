//! Configuration space variants
//!
//! Every variant implements [`ConfigurationSpace`](crate::common::ConfigurationSpace);
//! the spherical variants share the clearance predicates below so that the
//! plain and hierarchical spaces always return the same verdicts.

pub mod plain;
pub mod bvh;
pub mod rotation;

pub use plain::*;
pub use bvh::*;
pub use rotation::*;

use crate::common::{segment_point_distance, Obstacle, RoboticsResult, Vec3};

/// Spherical body at `q` keeps a strictly positive clearance from `obstacle`
pub(crate) fn point_clears(obstacle: &Obstacle, q: &Vec3, agent_radius: f64) -> bool {
    (q - obstacle.center).norm() - (obstacle.radius + agent_radius) > 0.0
}

/// Spherical body swept along `ab` keeps a strictly positive clearance
pub(crate) fn segment_clears(obstacle: &Obstacle, a: &Vec3, b: &Vec3, agent_radius: f64) -> bool {
    segment_point_distance(a, b, &obstacle.center) - (obstacle.radius + agent_radius) > 0.0
}

pub(crate) fn validate_obstacles(obstacles: &[Obstacle]) -> RoboticsResult<()> {
    obstacles.iter().try_for_each(Obstacle::validate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AgentDescription, Bounds, ConfigurationSpace};
    use proptest::prelude::*;

    fn vec3() -> impl Strategy<Value = Vec3> {
        (-60.0..60.0f64, -60.0..60.0f64, -60.0..60.0f64).prop_map(|(x, y, z)| Vec3::new(x, y, z))
    }

    fn obstacles() -> impl Strategy<Value = Vec<Obstacle>> {
        prop::collection::vec(
            ((-50.0..50.0f64, -50.0..50.0f64, -50.0..50.0f64), 0.5..12.0f64)
                .prop_map(|((x, y, z), r)| Obstacle::new(Vec3::new(x, y, z), r)),
            0..24,
        )
    }

    fn spaces(
        obstacles: Vec<Obstacle>,
        agent_radius: f64,
    ) -> (PlainConfigurationSpace, BoundingSphereHierarchy) {
        let bounds = Bounds::new(Vec3::repeat(-55.0), Vec3::repeat(55.0)).unwrap();
        let description = AgentDescription::new(Vec3::zeros(), Vec3::zeros(), agent_radius).unwrap();
        let plain = PlainConfigurationSpace::new(&description, obstacles.clone(), bounds).unwrap();
        let bvh = BoundingSphereHierarchy::new(&description, obstacles, bounds).unwrap();
        (plain, bvh)
    }

    proptest! {
        #[test]
        fn plain_and_hierarchy_agree_on_points(
            obstacles in obstacles(),
            agent_radius in 0.1..5.0f64,
            queries in prop::collection::vec(vec3(), 1..32),
        ) {
            let (plain, bvh) = spaces(obstacles, agent_radius);
            for q in &queries {
                prop_assert_eq!(plain.is_valid(q), bvh.is_valid(q));
            }
        }

        #[test]
        fn plain_and_hierarchy_agree_on_edges(
            obstacles in obstacles(),
            agent_radius in 0.1..5.0f64,
            edges in prop::collection::vec((vec3(), vec3()), 1..32),
        ) {
            let (plain, bvh) = spaces(obstacles, agent_radius);
            for (a, b) in &edges {
                prop_assert_eq!(plain.is_valid_edge(a, b), bvh.is_valid_edge(a, b));
            }
        }
    }

    #[test]
    fn test_surface_contact_is_collision() {
        let obstacle = Obstacle::new(Vec3::zeros(), 10.0);
        assert!(!point_clears(&obstacle, &Vec3::new(0.0, 12.0, 0.0), 2.0));
        assert!(point_clears(&obstacle, &Vec3::new(0.0, 12.001, 0.0), 2.0));
    }
}
