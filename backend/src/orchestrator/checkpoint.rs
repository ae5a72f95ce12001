//! Checkpoint - Save/Load Simulation State
//!
//! Serializes the complete mutable orchestrator state so a run can be
//! paused and resumed.
//!
//! # Critical Invariants
//!
//! - **Determinism**: resuming from a snapshot continues with exactly the
//!   trades an uninterrupted run would have produced
//! - **Config Matching**: a snapshot only loads with the config and market
//!   data it was taken with
//! - **Exact Floats**: prices and yields survive the JSON round trip bit for bit

use crate::buyside::BuySideSnapshot;
use crate::dealer::Dealer;
use crate::exogenous::MarketData;
use crate::market::BondMarket;
use crate::orchestrator::config::SimulationConfig;
use crate::orchestrator::SimulationError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete orchestrator state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Next step to run
    pub current_step: usize,

    /// RNG state at time of snapshot (CRITICAL for determinism)
    pub rng_state: u64,

    /// Multiplier in force on dealer bounds
    pub bound_multiplier: f64,

    /// Bonds, last prices, trade ledger and price history
    pub market: BondMarket,

    pub dealers: Vec<Dealer>,

    /// Buy-side agents in configuration order
    pub buy_side: Vec<BuySideSnapshot>,

    /// SHA256 hash of config and market data (for validation)
    pub config_hash: String,
}

impl StateSnapshot {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot deserialization failed: {}", e))
        })
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Hashable pairing of everything a run's outcome depends on besides state
#[derive(Serialize)]
struct RunInputs<'a> {
    config: &'a SimulationConfig,
    market_data: &'a MarketData,
}

/// Compute deterministic SHA256 hash of config plus market data
///
/// Uses canonical JSON serialization with sorted keys.
pub fn compute_config_hash(
    config: &SimulationConfig,
    market_data: &MarketData,
) -> Result<String, SimulationError> {
    hash_canonical(&RunInputs {
        config,
        market_data,
    })
}

fn hash_canonical<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(value).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity against the config it claims to belong to
///
/// Checks:
/// - step within the trading window
/// - bond universe matches the config, in order, and every bond is priced
/// - trade sequence numbers strictly increase
/// - dealer inventory sits within its limits
/// - every configured dealer and buy-side agent present exactly once
pub fn validate_snapshot(
    snapshot: &StateSnapshot,
    config: &SimulationConfig,
) -> Result<(), SimulationError> {
    let end = config.primer_steps + config.run_steps;
    if snapshot.current_step < config.primer_steps || snapshot.current_step > end {
        return Err(SimulationError::StateValidationError(format!(
            "step {} outside trading window [{}, {}]",
            snapshot.current_step, config.primer_steps, end
        )));
    }

    let bonds = snapshot.market.bond_names();
    let expected: Vec<&str> = config.bonds.iter().map(|b| b.name.as_str()).collect();
    if bonds.iter().map(String::as_str).ne(expected.iter().copied()) {
        return Err(SimulationError::StateValidationError(format!(
            "bond universe {:?} does not match config {:?}",
            bonds, expected
        )));
    }

    if let Some(unpriced) = bonds
        .iter()
        .find(|b| snapshot.market.last_price(b).is_none())
    {
        return Err(SimulationError::StateValidationError(format!(
            "bond {} has no last price",
            unpriced
        )));
    }

    if let Some(pair) = snapshot
        .market
        .trades()
        .windows(2)
        .find(|pair| pair[1].sequence <= pair[0].sequence)
    {
        return Err(SimulationError::StateValidationError(format!(
            "trade sequence {} follows {}",
            pair[1].sequence, pair[0].sequence
        )));
    }

    for dealer in &snapshot.dealers {
        for bond in dealer.bond_list() {
            let Some(position) = dealer.position(bond) else {
                return Err(SimulationError::StateValidationError(format!(
                    "dealer {} has no position in {}",
                    dealer.id(),
                    bond
                )));
            };
            if position.quantity < position.lower_limit
                || position.quantity > position.upper_limit
            {
                return Err(SimulationError::StateValidationError(format!(
                    "dealer {} inventory {} in {} outside [{}, {}]",
                    dealer.id(),
                    position.quantity,
                    bond,
                    position.lower_limit,
                    position.upper_limit
                )));
            }
        }
    }

    let mut seen = HashSet::new();
    for id in snapshot.dealers.iter().map(|d| d.id()) {
        if !seen.insert(id) {
            return Err(SimulationError::StateValidationError(format!(
                "duplicate dealer {} in snapshot",
                id
            )));
        }
    }
    if let Some(missing) = config.dealers.iter().find(|d| !seen.contains(d.id.as_str())) {
        return Err(SimulationError::StateValidationError(format!(
            "dealer {} missing from snapshot",
            missing.id
        )));
    }
    if snapshot.dealers.len() != config.dealers.len() {
        return Err(SimulationError::StateValidationError(format!(
            "snapshot has {} dealers, config has {}",
            snapshot.dealers.len(),
            config.dealers.len()
        )));
    }

    let mut agents = HashSet::new();
    for id in snapshot.buy_side.iter().map(|a| a.id()) {
        if !agents.insert(id) {
            return Err(SimulationError::StateValidationError(format!(
                "duplicate buy-side agent {} in snapshot",
                id
            )));
        }
    }
    let configured = [
        config.mutual_fund.as_ref().map(|c| c.id.as_str()),
        config.insurance_co.as_ref().map(|c| c.id.as_str()),
        config.hedge_fund.as_ref().map(|c| c.id.as_str()),
    ];
    for id in configured.into_iter().flatten() {
        if !agents.contains(id) {
            return Err(SimulationError::StateValidationError(format!(
                "buy-side agent {} missing from snapshot",
                id
            )));
        }
    }
    if agents.len() != configured.iter().flatten().count() {
        return Err(SimulationError::StateValidationError(
            "snapshot has buy-side agents the config does not name".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            run_steps: 2,
            yield_shock: None,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_compute_config_hash_deterministic() {
        let config = small_config();
        let data = MarketData::flat(10, 5);

        let hash1 = compute_config_hash(&config, &data).unwrap();
        let hash2 = compute_config_hash(&config.clone(), &data.clone()).unwrap();

        assert_eq!(hash1, hash2, "Same inputs should produce same hash");
    }

    #[test]
    fn test_hash_changes_with_seed() {
        let config = small_config();
        let data = MarketData::flat(10, 5);
        let reseeded = SimulationConfig {
            rng_seed: config.rng_seed + 1,
            ..config.clone()
        };

        assert_ne!(
            compute_config_hash(&config, &data).unwrap(),
            compute_config_hash(&reseeded, &data).unwrap()
        );
    }

    #[test]
    fn test_hash_changes_with_market_data() {
        let config = small_config();
        let flat = MarketData::flat(10, 5);
        let mut rows = vec![vec![0.0; 5]; 10];
        rows[9][0] = 0.0001;
        let moved = MarketData::new(rows, vec![0.0; 10]);

        assert_ne!(
            compute_config_hash(&config, &flat).unwrap(),
            compute_config_hash(&config, &moved).unwrap()
        );
    }
}
