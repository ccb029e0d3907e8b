//! Seeded random number generation for deterministic encounter simulation.
//!
//! When a seed is provided the same seed always produces the same encounter
//! outcome. Tests and replay tooling can also script the exact roll sequence
//! via [`GameRng::scripted`], which hands out queued values before falling
//! back to a seeded stream.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

enum Source {
    Std(StdRng),
    Scripted {
        rolls: VecDeque<f32>,
        fallback: StdRng,
    },
}

/// Random source shared by one encounter.
pub struct GameRng {
    source: Source,
    /// The seed used to initialize this RNG (if deterministic).
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: Source::Std(StdRng::seed_from_u64(seed)),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic).
    pub fn from_entropy() -> Self {
        Self {
            source: Source::Std(StdRng::from_entropy()),
            seed: None,
        }
    }

    /// Create a GameRng that replays `rolls` in order for every uniform and
    /// variance draw, then falls back to a fixed-seed stream once exhausted.
    pub fn scripted(rolls: impl IntoIterator<Item = f32>) -> Self {
        Self {
            source: Source::Scripted {
                rolls: rolls.into_iter().collect(),
                fallback: StdRng::seed_from_u64(0),
            },
            seed: None,
        }
    }

    /// Generate a uniform f32 in the range [0.0, 1.0).
    pub fn uniform(&mut self) -> f32 {
        match &mut self.source {
            Source::Std(rng) => rng.gen(),
            Source::Scripted { rolls, fallback } => {
                rolls.pop_front().unwrap_or_else(|| fallback.gen())
            }
        }
    }

    /// Generate a uniform f32 in the given range.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.uniform() * (max - min)
    }

    /// Roll a probability check: true with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.uniform() < p
    }

    /// Pick an index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "GameRng::index: empty range");
        let idx = (self.uniform() * len as f32) as usize;
        idx.min(len - 1)
    }

    /// Damage variance draw: a normal sample around 1.0 with
    /// sigma = (max - 1) / 3, truncated to [min, max].
    ///
    /// In scripted mode the next queued roll is interpreted as the variance
    /// value itself (still clamped), so tests can pin variance to 1.0.
    pub fn variance(&mut self, min: f32, max: f32) -> f32 {
        let raw = match &mut self.source {
            Source::Std(rng) => gauss(rng, max),
            Source::Scripted { rolls, fallback } => match rolls.pop_front() {
                Some(v) => v,
                None => gauss(fallback, max),
            },
        };
        raw.clamp(min, max)
    }
}

fn gauss(rng: &mut StdRng, max: f32) -> f32 {
    let sigma = (max - 1.0) / 3.0;
    match Normal::new(1.0_f32, sigma) {
        Ok(dist) => dist.sample(rng),
        // Degenerate configuration (max <= 1.0): no variance
        Err(_) => 1.0,
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
