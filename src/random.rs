//! Random sampling for stochastic reflections.
//!
//! ChaCha20 with explicit seeds instead of a global generator, so a whole
//! trace is reproducible from one number. Each screen column forks its own
//! stream off the frame sampler, which keeps parallel tracing deterministic:
//! the jitter a column draws does not depend on which thread ran it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seedable uniform random source.
#[derive(Clone, Debug)]
pub struct Sampler {
    rng: ChaCha20Rng,
}

impl Sampler {
    /// Sampler seeded from a single number.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Independent sampler on ChaCha stream `stream`, sharing this sampler's
    /// key. Used to give every column its own deterministic sequence.
    pub fn fork(&self, stream: u64) -> Self {
        let mut rng = self.rng.clone();
        rng.set_stream(stream);
        Self { rng }
    }

    /// Uniform f32 in [0, 1).
    pub fn uniform(&mut self) -> f32 {
        self.rng.random()
    }

    /// Uniform f32 in [-0.5, 0.5).
    pub fn centered(&mut self) -> f32 {
        self.uniform() - 0.5
    }
}
