//! Seedable noise source for the simulated walker.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{StandardNormal, Uniform};

/// Gaussian and uniform noise with deterministic seeding
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Seed 0 draws from OS entropy; any other seed is reproducible
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Zero-mean Gaussian sample with the given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev <= 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Independent Gaussian noise on three axes
    #[inline]
    pub fn gaussian3(&mut self, stddev: f64) -> [f64; 3] {
        [
            self.gaussian(stddev),
            self.gaussian(stddev),
            self.gaussian(stddev),
        ]
    }

    /// True with the given probability
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        self.rng.sample(Uniform::new(0.0f64, 1.0)) < probability
    }
}
