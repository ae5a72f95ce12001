//! Orchestrator - main simulation loop
//!
//! Wires the bond market, dealers and buy-side agents together and runs the
//! daily step loop. See `engine.rs` for the step sequence.

pub mod checkpoint;
pub mod config;
pub mod engine;

// Re-export main types for convenience
pub use config::{
    reference_bonds, reference_dealers, DealerConfig, DealerLimits, HedgeFundConfig,
    InsuranceCoConfig, MutualFundConfig, SimulationConfig, YieldShockConfig,
};
pub use engine::{Orchestrator, RunReport, SimulationError, StepResult};

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
