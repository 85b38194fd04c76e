//! Seeded reproducibility harness.
//!
//! Runs the same scripted session several times from identical setups and
//! compares the results. A seeded game must produce the same draws and the
//! same base placements on every run.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Outcome of a reproducibility check.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Number of runs performed.
    pub runs: usize,
    /// Hash of each run's final observation.
    pub hashes: Vec<u64>,
    /// Whether every hash matched.
    pub is_deterministic: bool,
}

impl DeterminismResult {
    /// Panic with the diverging hashes if runs disagreed.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic,
            "{} runs diverged: {:?}",
            self.runs, self.hashes
        );
    }
}

/// Hash any hashable observation.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Run `setup` then `script` `runs` times and compare what `script` returns.
pub fn verify_determinism<S, T, Setup, Script>(
    runs: usize,
    setup: Setup,
    script: Script,
) -> DeterminismResult
where
    T: Hash,
    Setup: Fn() -> S,
    Script: Fn(&S) -> T,
{
    let hashes: Vec<u64> = (0..runs)
        .map(|_| {
            let state = setup();
            compute_hash(&script(&state))
        })
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(?hashes, "Runs diverged");
    }
    DeterminismResult {
        runs,
        hashes,
        is_deterministic,
    }
}
