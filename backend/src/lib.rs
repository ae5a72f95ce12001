//! Bond Market Simulator Core - Rust Engine
//!
//! Agent-based simulation of a dealer-intermediated corporate bond market
//! with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Step clock (priming window, trading window)
//! - **rng**: Deterministic random number generation
//! - **valuation**: Fixed-rate bond pricing, duration, implied yield
//! - **models**: Domain types (Bond, RFQ, Quote, confirmations, NAV, events)
//! - **market**: Bond registry, quote matching, trade ledger, revaluation
//! - **dealer**: Inventory-skewed quoting with long/short limits
//! - **buyside**: Mutual fund, insurance company and hedge fund agents
//! - **exogenous**: Yield-curve changes and equity returns
//! - **orchestrator**: Main simulation loop and checkpoints
//!
//! # Critical Invariants
//!
//! 1. Prices are quoted per 100 of face value
//! 2. All randomness is deterministic (one seeded RNG, threaded explicitly)
//! 3. Every trade is booked on both sides before the next RFQ is quoted
//!
//! # Example
//!
//! ```rust
//! use bond_market_simulator_core_rs::{BondMarket, BondSpec, OrderId, RngManager, Side};
//! use bond_market_simulator_core_rs::models::Quote;
//!
//! let mut market = BondMarket::new("demo");
//! market
//!     .add_bond(BondSpec::new("MM101", 500_000.0, 1.0, 0.0175, 0.015, 2))
//!     .unwrap();
//!
//! let order_id: OrderId = "m1_1".parse().unwrap();
//! let quotes: Vec<Quote> = [("d1", 100.10), ("d2", 100.05)]
//!     .into_iter()
//!     .map(|(dealer, price)| Quote {
//!         dealer_id: dealer.to_string(),
//!         order_id: order_id.clone(),
//!         bond: "MM101".to_string(),
//!         amount: 5.0,
//!         side: Side::Buy,
//!         price,
//!     })
//!     .collect();
//!
//! let mut rng = RngManager::new(7);
//! let (dealer_confirm, _, _) = market.match_trade(&quotes, 8, &mut rng).unwrap();
//! assert_eq!(dealer_confirm.dealer_id, "d2");
//! ```

// Module declarations
pub mod buyside;
pub mod core;
pub mod dealer;
pub mod exogenous;
pub mod market;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod valuation;

// Re-exports for convenience
pub use buyside::{AgentError, BuySideAgent, HedgeFund, InsuranceCo, MutualFund};
pub use core::time::StepClock;
pub use dealer::{Dealer, DealerError, OutsideBounds};
pub use exogenous::{MarketData, MarketDataError, SyntheticMarketConfig};
pub use market::{BondMarket, MarketError};
pub use models::{
    bond::{Bond, BondSpec},
    event::{Event, EventLog},
    order::{OrderId, Quote, Rfq, Side},
};
pub use orchestrator::{Orchestrator, SimulationConfig, SimulationError, StepResult};
pub use rng::RngManager;
pub use valuation::{RevaluationMode, ValuationError};
