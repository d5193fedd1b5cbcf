//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through the single SimRng owned by the engine,
//! seeded from the master seed stored on the run record. Phases draw
//! from it in registration order, so the sequence is call-order stable.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Serializable so a snapshot resumes the exact random sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimRng {
    inner: Pcg64Mcg,
}

impl SimRng {
    pub fn new(master_seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(master_seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 in [lo, hi] (inclusive).
    pub fn range_u64(&mut self, lo: u64, hi: u64) -> u64 {
        debug_assert!(lo <= hi);
        lo + self.next_u64_below(hi - lo + 1)
    }

    /// Roll a float in [lo, hi).
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Cumulative-distribution draw over `weights`.
    /// Zero-weight entries are never selected while any weight is positive.
    /// Returns None when the total weight is not positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }
        let roll = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = Some(i);
            if roll < cumulative {
                return Some(i);
            }
        }
        // Float rounding can leave roll == total.
        last_positive
    }

    /// Draw up to `k` distinct entries, weighted. Each draw removes the
    /// chosen entry and its weight before the next one.
    pub fn weighted_sample<T: Clone>(&mut self, pool: &[(T, f64)], k: usize) -> Vec<T> {
        let mut remaining: Vec<(T, f64)> = pool.to_vec();
        let mut chosen = Vec::with_capacity(k.min(remaining.len()));
        while chosen.len() < k && !remaining.is_empty() {
            let weights: Vec<f64> = remaining.iter().map(|(_, w)| *w).collect();
            let Some(idx) = self.weighted_index(&weights) else { break };
            chosen.push(remaining.remove(idx).0);
        }
        chosen
    }

    /// Draw up to `k` distinct entries uniformly.
    pub fn sample<T: Clone>(&mut self, pool: &[T], k: usize) -> Vec<T> {
        let mut remaining = pool.to_vec();
        let mut chosen = Vec::with_capacity(k.min(remaining.len()));
        while chosen.len() < k && !remaining.is_empty() {
            let idx = self.next_u64_below(remaining.len() as u64) as usize;
            chosen.push(remaining.remove(idx));
        }
        chosen
    }
}
