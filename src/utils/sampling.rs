//! Seeded configuration sampling
//!
//! Every random draw in the crate goes through a [`Sampler`] so that roadmap
//! construction and tree growth are reproducible from a single seed.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use tracing::warn;

use crate::common::{Bounds, ConfigurationSpace, Vec3};

// Give up on rejection sampling after this many draws per requested sample.
const MAX_ATTEMPTS_PER_SAMPLE: usize = 100;

#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform configuration inside `bounds` (faces included)
    pub fn sample(&mut self, bounds: &Bounds) -> Vec3 {
        Vec3::from_fn(|i, _| Uniform::new_inclusive(bounds.min[i], bounds.max[i]).sample(&mut self.rng))
    }

    pub fn sample_points(&mut self, bounds: &Bounds, n: usize) -> Vec<Vec3> {
        (0..n).map(|_| self.sample(bounds)).collect()
    }

    /// Rejection-sample `n` configurations the space accepts
    pub fn sample_free<S: ConfigurationSpace + ?Sized>(&mut self, space: &S, n: usize) -> Vec<Vec3> {
        let bounds = *space.bounds();
        let max_attempts = n.saturating_mul(MAX_ATTEMPTS_PER_SAMPLE);
        let mut samples = Vec::with_capacity(n);
        let mut attempts = 0;

        while samples.len() < n && attempts < max_attempts {
            attempts += 1;
            let q = self.sample(&bounds);
            if space.is_valid(&q) {
                samples.push(q);
            }
        }

        if samples.len() < n {
            warn!(requested = n, found = samples.len(), attempts, "free space sampling exhausted");
        }
        samples
    }

    /// `goal` with the bias distribution's probability, otherwise a uniform sample
    pub fn sample_with_goal_bias(&mut self, bounds: &Bounds, goal: &Vec3, goal_bias: &Bernoulli) -> Vec3 {
        if goal_bias.sample(&mut self.rng) {
            *goal
        } else {
            self.sample(bounds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AgentDescription, Obstacle};
    use crate::configuration_space::PlainConfigurationSpace;

    fn plane_bounds() -> Bounds {
        Bounds::new(Vec3::new(0.0, -100.0, -100.0), Vec3::new(0.0, 100.0, 100.0)).unwrap()
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let bounds = plane_bounds();
        let mut sampler = Sampler::new(7);
        for q in sampler.sample_points(&bounds, 500) {
            assert!(bounds.contains(&q));
            assert_eq!(q.x, 0.0);
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let bounds = plane_bounds();
        let a = Sampler::new(42).sample_points(&bounds, 20);
        let b = Sampler::new(42).sample_points(&bounds, 20);
        let c = Sampler::new(43).sample_points(&bounds, 20);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_free_only_returns_valid() {
        let description = AgentDescription::new(Vec3::zeros(), Vec3::zeros(), 2.0).unwrap();
        let space =
            PlainConfigurationSpace::new(&description, vec![Obstacle::new(Vec3::zeros(), 50.0)], plane_bounds())
                .unwrap();
        let samples = Sampler::new(1).sample_free(&space, 300);
        assert_eq!(samples.len(), 300);
        assert!(samples.iter().all(|q| space.is_valid(q)));
    }

    #[test]
    fn test_goal_bias() {
        let bounds = plane_bounds();
        let goal = Vec3::new(0.0, 1.0, 2.0);
        let mut sampler = Sampler::new(3);
        let always = Bernoulli::new(1.0).unwrap();
        let never = Bernoulli::new(0.0).unwrap();
        assert_eq!(sampler.sample_with_goal_bias(&bounds, &goal, &always), goal);
        assert_ne!(sampler.sample_with_goal_bias(&bounds, &goal, &never), goal);
    }
}
