//! xorshift64* random number generator
//!
//! Every random decision in a run (tie-breaks between equally priced quotes,
//! the insurance company's bond pick, the buy-side acting order, synthetic
//! market inputs) is drawn from one instance of this generator, owned by the
//! orchestrator and passed down by `&mut` reference.
//!
//! # Determinism
//!
//! Same seed → same sequence → same trade ledger. The state is a single
//! `u64`, so it can be checkpointed and restored exactly.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use bond_market_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let pick = rng.index(5); // [0, 5)
/// assert!(pick < 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 (xorshift has an all-zero fixed point).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform index in [0, len)
    ///
    /// Always consumes exactly one draw, including when `len == 1`, so the
    /// stream position does not depend on how many candidates tied.
    ///
    /// # Panics
    /// Panics if len == 0
    ///
    /// # Example
    /// ```
    /// use bond_market_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// let before = rng.get_state();
    /// assert_eq!(rng.index(1), 0);
    /// assert_ne!(rng.get_state(), before);
    /// ```
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty set");
        (self.next() % len as u64) as usize
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }

    /// Get current RNG state (for checkpointing/replay)
    ///
    /// # Example
    /// ```
    /// use bond_market_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// rng.next();
    /// let mut resumed = RngManager::new(rng.get_state());
    /// assert_eq!(rng.next(), resumed.next());
    /// ```
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // top 53 bits → mantissa
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }
}
