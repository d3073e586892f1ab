//! Bounded random walk used when every external source has failed.

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

pub const SIM_BASELINE: f64 = 2025.0;
pub const SIM_VOLATILITY: f64 = 0.01;
pub const SIM_DRIFT: f64 = 0.25;
pub const SIM_FLOOR: f64 = 1800.0;
pub const SIM_CEILING: f64 = 2500.0;

pub trait PriceSimulator: Send + Sync {
    /// One simulated spot price. An error means the arithmetic went wrong
    /// and the caller should drop to the static fallback.
    fn simulate(&self) -> Result<f64>;
}

pub struct RandomWalk {
    baseline: f64,
    volatility: f64,
    drift: f64,
    rng: Mutex<StdRng>,
}

impl RandomWalk {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            baseline: SIM_BASELINE,
            volatility: SIM_VOLATILITY,
            drift: SIM_DRIFT,
            rng: Mutex::new(rng),
        }
    }

    pub fn baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceSimulator for RandomWalk {
    fn simulate(&self) -> Result<f64> {
        let (shock, trend) = {
            let mut rng = self.rng.lock().map_err(|_| anyhow!("simulator rng lock poisoned"))?;
            (rng.gen_range(-1.0..=1.0), rng.gen::<f64>())
        };
        let raw = self.baseline + self.baseline * self.volatility * shock + self.drift * trend;
        if !raw.is_finite() {
            return Err(anyhow!("simulated price is not finite ({})", raw));
        }
        Ok(raw.clamp(SIM_FLOOR, SIM_CEILING))
    }
}
