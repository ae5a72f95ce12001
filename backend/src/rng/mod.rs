//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible draws.
//! All randomness in the simulator goes through this module.

mod xorshift;

pub use xorshift::RngManager;
