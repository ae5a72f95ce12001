//! Buy-side agents
//!
//! Every buy-side participant implements [`BuySideAgent`]: once per trading
//! step it may emit RFQs, it books the fills it receives, and at the end of
//! the day it pulls the market's new price table and updates its own
//! history.
//!
//! Three variants are provided:
//! 1. **MutualFund**: index tracker whose cash is driven by a lagged-NAV
//!    flow model; sells when cash falls below its lower bound, buys when
//!    cash exceeds its upper bound
//! 2. **InsuranceCo**: keeps an equity/bond split; rebalances with one
//!    RFQ in a randomly chosen bond
//! 3. **HedgeFund**: watches a bond index and tells the orchestrator to
//!    widen or tighten dealer bounds after large moves; never trades
//!
//! Agents share no mutable state. Randomness and exogenous inputs reach them
//! only through [`DecisionContext`].

pub mod book;
pub mod hedge_fund;
pub mod insurance;
pub mod mutual_fund;

pub use book::{Book, Position};
pub use hedge_fund::{HedgeFund, HedgeFundParams, IndexObservation};
pub use insurance::{InsuranceCo, InsuranceCoParams};
pub use mutual_fund::{flow_ratio, MutualFund, MutualFundParams, NAV_LOOKBACK};

use crate::exogenous::MarketData;
use crate::models::{BuySideConfirm, NavHistory, Rfq};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Buy-side failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("agent {agent} does not hold {bond}")]
    UnknownBond { agent: String, bond: String },

    #[error("agent {agent} received no price for {bond}")]
    MissingPrice { agent: String, bond: String },

    #[error("agent {agent} needs NAV history for step {step} lagged by {lag}, which is missing")]
    MissingNavHistory {
        agent: String,
        step: usize,
        lag: usize,
    },

    #[error("agent {agent} already recorded NAV for step {step}")]
    DuplicateNav { agent: String, step: usize },

    #[error("agent {agent} has no equity return for step {step}")]
    MissingEquityReturn { agent: String, step: usize },

    #[error("agent {agent}: {reason}")]
    InvalidParameter { agent: String, reason: String },
}

/// Which variant an agent is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    MutualFund,
    InsuranceCo,
    HedgeFund,
}

/// Inputs available to a decision on one step
pub struct DecisionContext<'a> {
    pub step: usize,
    pub market_data: &'a MarketData,
    pub rng: &'a mut RngManager,
}

/// Capability interface shared by all buy-side variants
pub trait BuySideAgent: std::fmt::Debug {
    fn id(&self) -> &str;

    fn kind(&self) -> AgentKind;

    /// Holdings and cached prices
    fn book(&self) -> &Book;

    /// RFQs for this step, in the order they must be processed
    fn make_portfolio_decision(
        &mut self,
        ctx: &mut DecisionContext<'_>,
    ) -> Result<Vec<Rfq>, AgentError>;

    /// Book a fill: holding, cash or equity, and the cached price
    fn modify_portfolio(&mut self, confirm: &BuySideConfirm) -> Result<(), AgentError>;

    /// Refresh cached prices from the market's last-price table
    fn update_prices(&mut self, prices: &BTreeMap<String, f64>) -> Result<(), AgentError>;

    /// End-of-day bookkeeping after prices were refreshed
    fn end_of_day(&mut self, step: usize) -> Result<(), AgentError>;

    fn nav_history(&self) -> Option<&NavHistory> {
        None
    }

    /// Multiplier this agent wants applied to dealers' base outside bounds
    fn dealer_bound_multiplier(&self) -> Option<f64> {
        None
    }

    /// Serializable copy of the full agent state
    fn snapshot(&self) -> BuySideSnapshot;
}

/// Full state of one buy-side agent, for checkpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuySideSnapshot {
    MutualFund(MutualFund),
    InsuranceCo(InsuranceCo),
    HedgeFund(HedgeFund),
}

impl BuySideSnapshot {
    pub fn id(&self) -> &str {
        match self {
            BuySideSnapshot::MutualFund(agent) => agent.id(),
            BuySideSnapshot::InsuranceCo(agent) => agent.id(),
            BuySideSnapshot::HedgeFund(agent) => agent.id(),
        }
    }

    pub fn into_agent(self) -> Box<dyn BuySideAgent> {
        match self {
            BuySideSnapshot::MutualFund(agent) => Box::new(agent),
            BuySideSnapshot::InsuranceCo(agent) => Box::new(agent),
            BuySideSnapshot::HedgeFund(agent) => Box::new(agent),
        }
    }
}
