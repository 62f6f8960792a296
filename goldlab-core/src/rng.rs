//! Deterministic RNG hierarchy.
//!
//! A master seed generates a sub-seed per strategy id. Sub-seeds are derived via
//! BLAKE3 hashing, independently of thread scheduling order, so evaluation
//! results are identical regardless of how many rayon workers run.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic RNG hierarchy keyed by strategy id.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derive a deterministic sub-seed for one strategy.
    pub fn sub_seed(&self, strategy_id: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(strategy_id.as_bytes());
        let hash = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    /// Create a seeded StdRng for one strategy.
    pub fn rng_for(&self, strategy_id: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(strategy_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn sub_seeds_are_deterministic() {
        let hierarchy = RngHierarchy::new(42);
        assert_eq!(
            hierarchy.sub_seed("bullish-combo"),
            hierarchy.sub_seed("bullish-combo")
        );
    }

    #[test]
    fn different_strategies_different_seeds() {
        let hierarchy = RngHierarchy::new(42);
        assert_ne!(
            hierarchy.sub_seed("bullish-combo"),
            hierarchy.sub_seed("bearish-combo")
        );
    }

    #[test]
    fn different_master_seeds_different_output() {
        let h1 = RngHierarchy::new(42);
        let h2 = RngHierarchy::new(43);
        assert_ne!(h1.sub_seed("pattern-strategy-0"), h2.sub_seed("pattern-strategy-0"));
    }

    #[test]
    fn rng_streams_replay() {
        let hierarchy = RngHierarchy::new(7);
        let a: Vec<bool> = {
            let mut rng = hierarchy.rng_for("news-strategy-1");
            (0..16).map(|_| rng.gen_bool(0.5)).collect()
        };
        let b: Vec<bool> = {
            let mut rng = hierarchy.rng_for("news-strategy-1");
            (0..16).map(|_| rng.gen_bool(0.5)).collect()
        };
        assert_eq!(a, b);
    }
}
