//! Deterministic randomness for reproducible tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator for signing histories and other event sequences.
pub struct TestRng {
    rng: StdRng,
}

impl TestRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_default_seed() -> Self {
        Self::new(12345)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.gen()
    }

    /// `true` with probability `percent / 100`.
    pub fn chance(&mut self, percent: u8) -> bool {
        self.rng.gen_ratio(u32::from(percent.min(100)), 100)
    }

    /// `len` signing outcomes; each block is missed with probability `miss_percent / 100`.
    pub fn signing_history(&mut self, len: usize, miss_percent: u8) -> Vec<bool> {
        (0..len).map(|_| !self.chance(miss_percent)).collect()
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::with_default_seed()
    }
}
