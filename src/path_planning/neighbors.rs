//! Nearest neighbor indices for roadmap and tree construction

use std::collections::HashMap;

use crate::common::{Metric, NearestNeighbors, Vec3};

/// Brute force index: every query scans all points
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    points: Vec<Vec3>,
    metric: Metric,
}

impl LinearScan {
    pub fn new(metric: Metric) -> Self {
        Self {
            points: Vec::new(),
            metric,
        }
    }

    pub fn from_points(points: Vec<Vec3>, metric: Metric) -> Self {
        Self { points, metric }
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
    }
}

impl NearestNeighbors for LinearScan {
    fn insert(&mut self, point: Vec3) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    fn nearest(&self, query: &Vec3) -> Option<usize> {
        let mut min_dist = f64::INFINITY;
        let mut nearest = None;

        for (i, point) in self.points.iter().enumerate() {
            let dist = self.metric.difference(point, query).norm_squared();
            if dist < min_dist {
                min_dist = dist;
                nearest = Some(i);
            }
        }

        nearest
    }

    fn within_radius(&self, query: &Vec3, radius: f64) -> Vec<usize> {
        let radius_sq = radius * radius;
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, point)| {
                if self.metric.difference(point, query).norm_squared() <= radius_sq {
                    Some(i)
                } else {
                    None
                }
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Uniform hash grid for Euclidean radius queries.
///
/// Radius queries only visit the cells overlapping the query ball, which
/// keeps roadmap construction near linear when the cell size matches the
/// maximum edge length.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f64,
    points: Vec<Vec3>,
    cells: HashMap<[i64; 3], Vec<usize>>,
}

impl GridIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            points: Vec::new(),
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: &Vec3) -> [i64; 3] {
        [
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        ]
    }
}

impl NearestNeighbors for GridIndex {
    fn insert(&mut self, point: Vec3) -> usize {
        let index = self.points.len();
        let cell = self.cell_of(&point);
        self.points.push(point);
        self.cells.entry(cell).or_default().push(index);
        index
    }

    fn nearest(&self, query: &Vec3) -> Option<usize> {
        // rarely used on this index, a scan keeps it exact
        let mut min_dist = f64::INFINITY;
        let mut nearest = None;
        for (i, point) in self.points.iter().enumerate() {
            let dist = (point - query).norm_squared();
            if dist < min_dist {
                min_dist = dist;
                nearest = Some(i);
            }
        }
        nearest
    }

    fn within_radius(&self, query: &Vec3, radius: f64) -> Vec<usize> {
        let reach = (radius / self.cell_size).ceil() as i64;
        let center = self.cell_of(query);
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let cell = [center[0] + dx, center[1] + dy, center[2] + dz];
                    if let Some(members) = self.cells.get(&cell) {
                        found.extend(
                            members
                                .iter()
                                .copied()
                                .filter(|&i| (self.points[i] - query).norm_squared() <= radius_sq),
                        );
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn scattered_points() -> Vec<Vec3> {
        (0..200)
            .map(|i| {
                let t = i as f64;
                Vec3::new((t * 1.7).sin() * 40.0, (t * 0.37).cos() * 40.0, (t * 2.3).sin() * 10.0)
            })
            .collect()
    }

    #[test]
    fn test_grid_matches_linear_scan() {
        let points = scattered_points();
        let linear = LinearScan::from_points(points.clone(), Metric::Euclidean);
        let mut grid = GridIndex::new(10.0);
        for p in &points {
            grid.insert(*p);
        }

        for query in points.iter().step_by(7) {
            assert_eq!(linear.within_radius(query, 10.0), grid.within_radius(query, 10.0));
            assert_eq!(linear.within_radius(query, 23.0), grid.within_radius(query, 23.0));
            assert_eq!(linear.nearest(query), grid.nearest(query));
        }
    }

    #[test]
    fn test_linear_scan_nearest_prefers_first_on_ties() {
        let mut index = LinearScan::new(Metric::Euclidean);
        assert!(index.nearest(&Vec3::zeros()).is_none());
        index.insert(Vec3::new(1.0, 0.0, 0.0));
        index.insert(Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(index.nearest(&Vec3::zeros()), Some(0));
        assert_eq!(index.within_radius(&Vec3::zeros(), 1.0), vec![0, 1]);
    }

    #[test]
    fn test_linear_scan_uses_wrapped_metric() {
        let mut index = LinearScan::new(Metric::WrappedX { period: 2.0 * PI });
        index.insert(Vec3::new(3.0, 0.0, 0.0));
        index.insert(Vec3::new(2.0 * PI - 0.05, 0.0, 0.0));
        assert_eq!(index.nearest(&Vec3::new(0.05, 0.0, 0.0)), Some(1));
    }
}
