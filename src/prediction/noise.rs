//! Jitter sources for the occupancy model.
//!
//! Predictions get a small zero-mean perturbation drawn from a [`NoiseSource`].
//! [`NoNoise`] and [`SequenceNoise`] pin it for tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;
use std::fmt;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_NOISE_STD_DEV: f64 = 0.02;

/// Source of additive noise. Implementations must be safe to share across requests.
pub trait NoiseSource: Send + Sync + fmt::Debug {
    /// Draw one offset with mean 0 and the given standard deviation.
    fn sample(&self, std_dev: f64) -> f64;
}

/// Always returns zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn sample(&self, _std_dev: f64) -> f64 {
        0.0
    }
}

/// Gaussian noise backed by a ChaCha8 stream.
pub struct GaussianNoise {
    rng: Mutex<ChaCha8Rng>,
}

impl GaussianNoise {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }
}

impl fmt::Debug for GaussianNoise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaussianNoise").finish_non_exhaustive()
    }
}

impl NoiseSource for GaussianNoise {
    fn sample(&self, std_dev: f64) -> f64 {
        // A panic mid-draw leaves the generator usable, so poisoning is ignored.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        // Box-Muller; `1 - u` keeps the log argument in (0, 1].
        let u1: f64 = 1.0 - rng.r#gen::<f64>();
        let u2: f64 = rng.r#gen::<f64>();
        let standard = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
        standard * std_dev
    }
}

/// Replays a fixed cycle of offsets, ignoring the requested deviation.
#[derive(Debug)]
pub struct SequenceNoise {
    offsets: Vec<f64>,
    cursor: Mutex<usize>,
}

impl SequenceNoise {
    pub fn new(offsets: Vec<f64>) -> Self {
        Self {
            offsets,
            cursor: Mutex::new(0),
        }
    }
}

impl NoiseSource for SequenceNoise {
    fn sample(&self, _std_dev: f64) -> f64 {
        if self.offsets.is_empty() {
            return 0.0;
        }
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = self.offsets[*cursor % self.offsets.len()];
        *cursor = cursor.wrapping_add(1);
        offset
    }
}
