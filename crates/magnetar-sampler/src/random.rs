//! Shared random source.
//!
//! One `StdRng` behind one mutex. Each draw holds the lock for a single
//! variate, so a Gamma draw made of several calls may interleave with other
//! callers' draws; every call still advances the one stream atomically.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand::distr::StandardUniform;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use tracing::debug;

/// A supplier of the two variates the Gamma sampler consumes.
pub trait Variates {
    /// Uniform on `[0, 1)`.
    fn uniform(&self) -> f64;

    /// Standard normal: mean 0, variance 1.
    fn standard_normal(&self) -> f64;
}

/// Mutex-guarded pseudo-random generator shared by all sampling calls.
pub struct RandomSource {
    rng: Mutex<StdRng>,
}

impl RandomSource {
    /// Seed from the wall clock. Called once at process start.
    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        debug!(seed, "random source seeded from clock");
        Self::with_seed(seed)
    }

    /// Seed explicitly, for reproducible draws.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_clock()
    }
}

impl Variates for RandomSource {
    fn uniform(&self) -> f64 {
        let mut rng = self.rng.lock().expect("rng lock");
        StandardUniform.sample(&mut *rng)
    }

    fn standard_normal(&self) -> f64 {
        let mut rng = self.rng.lock().expect("rng lock");
        StandardNormal.sample(&mut *rng)
    }
}
