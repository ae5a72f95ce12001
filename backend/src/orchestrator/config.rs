//! Run configuration
//!
//! [`SimulationConfig::default`] reproduces the reference scenario: five
//! semi-annual bonds, three dealers with staggered specialization, one
//! mutual fund holding 15% of every issue, one insurance company holding the
//! other 85%, eight priming steps, 252 trading days and a +100bp parallel
//! shock on step 50.

use crate::dealer::OutsideBounds;
use crate::models::BondSpec;
use crate::valuation::RevaluationMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub market_name: String,

    /// RNG seed for deterministic simulation
    pub rng_seed: u64,

    /// Bond universe, in registration order
    pub bonds: Vec<BondSpec>,

    pub dealers: Vec<DealerConfig>,

    /// Inventory limit factors shared by all dealers
    pub dealer_limits: DealerLimits,

    /// Outside bounds shared by all dealers
    pub outside_bounds: OutsideBounds,

    /// Treynor accommodation scale for the inside spread
    pub spread_factor: f64,

    pub mutual_fund: Option<MutualFundConfig>,

    pub insurance_co: Option<InsuranceCoConfig>,

    /// Optional dealer-bound adjuster; off by default
    #[serde(default)]
    pub hedge_fund: Option<HedgeFundConfig>,

    /// Seeding steps before trading starts
    pub primer_steps: usize,

    /// Trading steps
    pub run_steps: usize,

    pub yield_shock: Option<YieldShockConfig>,

    #[serde(default)]
    pub revaluation: RevaluationMode,

    /// Randomize the buy-side acting order every step
    pub shuffle_buy_side: bool,
}

/// Per-dealer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerConfig {
    pub id: String,
    /// Specialization in [0, 1] for every bond
    pub specialization: BTreeMap<String, f64>,
}

/// Limits as fractions of each bond's nominal outstanding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DealerLimits {
    pub long: f64,
    pub short: f64,
}

impl Default for DealerLimits {
    fn default() -> Self {
        Self {
            long: 0.1,
            short: 0.075,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutualFundConfig {
    pub id: String,
    /// Fraction of each issue the fund holds at setup
    pub share: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub target: f64,
    pub shares: f64,
}

impl Default for MutualFundConfig {
    fn default() -> Self {
        Self {
            id: "m1".to_string(),
            share: 0.15,
            lower_bound: 0.03,
            upper_bound: 0.07,
            target: 0.05,
            shares: 100_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceCoConfig {
    pub id: String,
    /// Fraction of each issue the company holds at setup
    pub share: f64,
    pub equity_weight_target: f64,
    pub tolerance: f64,
}

impl Default for InsuranceCoConfig {
    fn default() -> Self {
        Self {
            id: "i1".to_string(),
            share: 0.85,
            equity_weight_target: 0.4,
            tolerance: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeFundConfig {
    pub id: String,
    pub window: usize,
    pub threshold: f64,
    pub factor: f64,
}

impl Default for HedgeFundConfig {
    fn default() -> Self {
        Self {
            id: "h1".to_string(),
            window: 5,
            threshold: 0.05,
            factor: 1.25,
        }
    }
}

/// Parallel yield shift applied after revaluation on `step`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldShockConfig {
    pub step: usize,
    pub shift: f64,
}

/// The reference five-bond universe
pub fn reference_bonds() -> Vec<BondSpec> {
    vec![
        BondSpec::new("MM101", 500_000.0, 1.0, 0.0175, 0.015, 2),
        BondSpec::new("MM102", 500_000.0, 2.0, 0.025, 0.0175, 2),
        BondSpec::new("MM103", 1_000_000.0, 5.0, 0.0225, 0.025, 2),
        BondSpec::new("MM104", 2_000_000.0, 10.0, 0.024, 0.026, 2),
        BondSpec::new("MM105", 1_000_000.0, 25.0, 0.04, 0.0421, 2),
    ]
}

/// Dealers d1..d3, specialized in the short, middle and long end
pub fn reference_dealers() -> Vec<DealerConfig> {
    let table: [(&str, [f64; 5]); 3] = [
        ("d1", [0.9, 0.9, 0.75, 0.5, 0.5]),
        ("d2", [0.5, 0.75, 0.9, 0.75, 0.5]),
        ("d3", [0.5, 0.5, 0.75, 0.9, 0.9]),
    ];
    let names = ["MM101", "MM102", "MM103", "MM104", "MM105"];
    table
        .iter()
        .map(|(id, special)| DealerConfig {
            id: id.to_string(),
            specialization: names
                .iter()
                .zip(special)
                .map(|(name, s)| (name.to_string(), *s))
                .collect(),
        })
        .collect()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            market_name: "bondmarket1".to_string(),
            rng_seed: 20_170_101,
            bonds: reference_bonds(),
            dealers: reference_dealers(),
            dealer_limits: DealerLimits::default(),
            outside_bounds: OutsideBounds::default(),
            spread_factor: 10_000.0,
            mutual_fund: Some(MutualFundConfig::default()),
            insurance_co: Some(InsuranceCoConfig::default()),
            hedge_fund: None,
            primer_steps: 8,
            run_steps: 252,
            yield_shock: Some(YieldShockConfig {
                step: 50,
                shift: 0.01,
            }),
            revaluation: RevaluationMode::Exact,
            shuffle_buy_side: true,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Last trading step, if the run trades at all
    pub fn last_step(&self) -> Option<usize> {
        (self.primer_steps + self.run_steps).checked_sub(1).filter(|_| self.run_steps > 0)
    }
}
