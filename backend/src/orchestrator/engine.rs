//! Orchestrator Engine
//!
//! Owns every piece of simulation state and runs the daily step loop.
//!
//! # Architecture
//!
//! ```text
//! Setup:
//!   register bonds → build dealers and buy-side agents
//!   for each priming step: broadcast prices, agents record history
//!
//! For each trading step t:
//! 1. Fix the buy-side acting order (shuffled if configured)
//! 2. Each agent decides; each RFQ is quoted by every dealer, matched,
//!    and booked on both sides before the next RFQ is handled
//! 3. End-of-day revaluation from the yield-curve changes for t
//! 4. Scheduled parallel yield shock
//! 5. Broadcast the new last prices; agents record end-of-day history
//! 6. Apply the hedge-style dealer bound multiplier, if any
//! 7. Snapshot the last-price table
//! 8. Advance the clock
//! ```
//!
//! # Example
//!
//! ```rust
//! use bond_market_simulator_core_rs::exogenous::MarketData;
//! use bond_market_simulator_core_rs::orchestrator::{Orchestrator, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     run_steps: 5,
//!     yield_shock: None,
//!     ..SimulationConfig::default()
//! };
//! let data = MarketData::flat(config.primer_steps + config.run_steps, config.bonds.len());
//!
//! let mut orchestrator = Orchestrator::new(config, data).unwrap();
//! while !orchestrator.is_finished() {
//!     let result = orchestrator.run_step().unwrap();
//!     println!("Step {}: {} trades", result.step, result.num_trades);
//! }
//! ```

use crate::buyside::{
    AgentError, BuySideAgent, DecisionContext, HedgeFund, HedgeFundParams, InsuranceCo,
    InsuranceCoParams, MutualFund, MutualFundParams, Position, NAV_LOOKBACK,
};
use crate::core::time::StepClock;
use crate::dealer::{Dealer, DealerError, DealerPosition};
use crate::exogenous::{MarketData, MarketDataError};
use crate::market::{BondMarket, MarketError};
use crate::models::{Event, EventLog, NavEntry, NavHistory, PriceSnapshot, Rfq, TradeRecord};
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
use crate::orchestrator::config::SimulationConfig;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Errors and Results
// ============================================================================

/// Simulation error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("dealer not found: {0}")]
    DealerNotFound(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("run already finished at step {0}")]
    RunFinished(usize),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Dealer(#[from] DealerError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("state validation failed: {0}")]
    StateValidationError(String),

    #[error("step {step} failed: {source}")]
    StepFailed {
        step: usize,
        #[source]
        source: Box<SimulationError>,
    },
}

/// Result of a single trading step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub step: usize,

    /// RFQs issued by all buy-side agents
    pub num_rfqs: usize,

    /// RFQs filled
    pub num_trades: usize,

    /// Individual dealer refusals
    pub num_refusals: usize,

    /// RFQs no dealer would quote
    pub num_abandoned: usize,

    /// Whether the scheduled yield shock fired
    pub shocked: bool,
}

impl StepResult {
    fn new(step: usize) -> Self {
        Self {
            step,
            num_rfqs: 0,
            num_trades: 0,
            num_refusals: 0,
            num_abandoned: 0,
            shocked: false,
        }
    }
}

/// Everything the reporting layer persists at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub market_name: String,
    pub trades: Vec<TradeRecord>,
    pub price_history: Vec<PriceSnapshot>,
    pub nav_histories: BTreeMap<String, Vec<NavEntry>>,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self)
            .map_err(|e| SimulationError::SerializationError(format!("Report serialization failed: {}", e)))
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator managing market state and the step loop
///
/// # Determinism
///
/// All randomness is drawn from one seeded `RngManager`. Same config, same
/// market data and same seed give an identical trade ledger.
pub struct Orchestrator {
    config: SimulationConfig,

    market_data: MarketData,

    clock: StepClock,

    rng: RngManager,

    market: BondMarket,

    /// Dealers in configuration order
    dealers: Vec<Dealer>,

    /// Buy-side agents in configuration order
    buy_side: Vec<Box<dyn BuySideAgent>>,

    /// Multiplier currently applied to dealer base bounds
    bound_multiplier: f64,

    event_log: EventLog,
}

impl Orchestrator {
    /// Build the market and agents, then run the priming steps
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - positioned at the first trading step
    /// * `Err(SimulationError)` - configuration or market data rejected
    pub fn new(config: SimulationConfig, market_data: MarketData) -> Result<Self, SimulationError> {
        Self::validate_config(&config, &market_data)?;

        let mut market = BondMarket::new(config.market_name.clone());
        for spec in &config.bonds {
            market.add_bond(spec.clone())?;
        }

        let dealers = Self::build_dealers(&config, &market)?;
        let buy_side = Self::build_buy_side(&config, &market)?;

        let mut orchestrator = Self {
            clock: StepClock::new(config.primer_steps, config.run_steps),
            rng: RngManager::new(config.rng_seed),
            config,
            market_data,
            market,
            dealers,
            buy_side,
            bound_multiplier: 1.0,
            event_log: EventLog::new(),
        };
        orchestrator.seed_buy_side()?;
        Ok(orchestrator)
    }

    fn validate_config(config: &SimulationConfig, market_data: &MarketData) -> Result<(), SimulationError> {
        if config.bonds.is_empty() {
            return Err(SimulationError::InvalidConfig("at least one bond is required".to_string()));
        }
        if config.dealers.is_empty() {
            return Err(SimulationError::InvalidConfig("at least one dealer is required".to_string()));
        }

        let mut ids = HashSet::new();
        let buy_side_ids = [
            config.mutual_fund.as_ref().map(|c| c.id.as_str()),
            config.insurance_co.as_ref().map(|c| c.id.as_str()),
            config.hedge_fund.as_ref().map(|c| c.id.as_str()),
        ];
        for id in config
            .dealers
            .iter()
            .map(|d| d.id.as_str())
            .chain(buy_side_ids.into_iter().flatten())
        {
            if id.is_empty() || !ids.insert(id) {
                return Err(SimulationError::InvalidConfig(format!(
                    "agent id {:?} is empty or duplicated",
                    id
                )));
            }
        }

        for dealer in &config.dealers {
            if let Some(missing) = config
                .bonds
                .iter()
                .find(|b| !dealer.specialization.contains_key(&b.name))
            {
                return Err(SimulationError::InvalidConfig(format!(
                    "dealer {} has no specialization for {}",
                    dealer.id, missing.name
                )));
            }
            if let Some((bond, value)) = dealer
                .specialization
                .iter()
                .find(|(_, v)| !(0.0..=1.0).contains(*v))
            {
                return Err(SimulationError::InvalidConfig(format!(
                    "dealer {} specialization {} for {} outside [0, 1]",
                    dealer.id, value, bond
                )));
            }
        }

        let limits = config.dealer_limits;
        if !(limits.long > 0.0 && limits.short > 0.0) {
            return Err(SimulationError::InvalidConfig(
                "dealer long and short limit factors must be positive".to_string(),
            ));
        }
        let bounds = config.outside_bounds;
        if !(bounds.lower >= 0.0 && bounds.upper >= 0.0 && config.spread_factor > 0.0) {
            return Err(SimulationError::InvalidConfig(
                "outside bounds must be non-negative and spread factor positive".to_string(),
            ));
        }

        for share in [
            config.mutual_fund.as_ref().map(|c| c.share),
            config.insurance_co.as_ref().map(|c| c.share),
        ]
        .into_iter()
        .flatten()
        {
            if !(0.0..=1.0).contains(&share) {
                return Err(SimulationError::InvalidConfig(format!(
                    "holding share {} outside [0, 1]",
                    share
                )));
            }
        }

        if config.mutual_fund.is_some() && config.run_steps > 0 && config.primer_steps < NAV_LOOKBACK {
            return Err(SimulationError::InvalidConfig(format!(
                "mutual fund needs {} priming steps of NAV history, got {}",
                NAV_LOOKBACK, config.primer_steps
            )));
        }

        if let Some(last_step) = config.last_step() {
            market_data.validate(config.bonds.len(), last_step, config.insurance_co.is_some())?;
        }
        Ok(())
    }

    fn build_dealers(config: &SimulationConfig, market: &BondMarket) -> Result<Vec<Dealer>, SimulationError> {
        config
            .dealers
            .iter()
            .map(|dc| {
                let positions = market
                    .bonds()
                    .iter()
                    .map(|bond| {
                        let special = dc.specialization.get(bond.name()).copied().unwrap_or_default();
                        (
                            bond.name().to_string(),
                            DealerPosition::new(bond.nominal(), bond.price(), special),
                        )
                    })
                    .collect();
                Dealer::new(
                    dc.id.clone(),
                    positions,
                    config.dealer_limits.long,
                    config.dealer_limits.short,
                    config.outside_bounds,
                    config.spread_factor,
                )
                .map_err(SimulationError::from)
            })
            .collect()
    }

    fn build_buy_side(
        config: &SimulationConfig,
        market: &BondMarket,
    ) -> Result<Vec<Box<dyn BuySideAgent>>, SimulationError> {
        let holdings = |share: f64| -> Vec<(String, Position)> {
            market
                .bonds()
                .iter()
                .map(|b| (b.name().to_string(), Position::new(share * b.nominal(), b.price())))
                .collect()
        };
        let index_weights = market.compute_weights_from_nominal();

        let mut agents: Vec<Box<dyn BuySideAgent>> = Vec::new();
        if let Some(mf) = &config.mutual_fund {
            let params = MutualFundParams {
                lower_bound: mf.lower_bound,
                upper_bound: mf.upper_bound,
                target: mf.target,
                shares: mf.shares,
                flow_start_step: config.primer_steps,
                initial_cash: None,
            };
            agents.push(Box::new(MutualFund::new(
                mf.id.clone(),
                holdings(mf.share),
                &index_weights,
                params,
            )?));
        }
        if let Some(ic) = &config.insurance_co {
            let params = InsuranceCoParams {
                equity_weight_target: ic.equity_weight_target,
                tolerance: ic.tolerance,
            };
            agents.push(Box::new(InsuranceCo::new(ic.id.clone(), holdings(ic.share), params)?));
        }
        if let Some(hf) = &config.hedge_fund {
            let params = HedgeFundParams {
                window: hf.window,
                threshold: hf.threshold,
                factor: hf.factor,
            };
            agents.push(Box::new(HedgeFund::new(
                hf.id.clone(),
                holdings(0.0),
                &index_weights,
                params,
            )?));
        }
        Ok(agents)
    }

    /// Priming window: agents see opening prices and record history
    fn seed_buy_side(&mut self) -> Result<(), SimulationError> {
        for step in self.clock.primer_steps() {
            let prices = self.market.last_prices().clone();
            for idx in 0..self.buy_side.len() {
                self.buy_side[idx].update_prices(&prices)?;
                self.buy_side[idx].end_of_day(step)?;
                self.log_nav(idx, step);
            }
        }
        debug!(
            primer_steps = self.clock.start_step(),
            agents = self.buy_side.len(),
            "buy side seeded"
        );
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn market_data(&self) -> &MarketData {
        &self.market_data
    }

    /// Next step to run
    pub fn current_step(&self) -> usize {
        self.clock.current_step()
    }

    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    pub fn market(&self) -> &BondMarket {
        &self.market
    }

    pub fn last_prices(&self) -> &BTreeMap<String, f64> {
        self.market.last_prices()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        self.market.trades()
    }

    pub fn price_history(&self) -> &[PriceSnapshot] {
        self.market.price_history()
    }

    pub fn dealers(&self) -> &[Dealer] {
        &self.dealers
    }

    pub fn dealer(&self, id: &str) -> Option<&Dealer> {
        self.dealers.iter().find(|d| d.id() == id)
    }

    /// Buy-side agents in configuration order
    pub fn buy_side_agents(&self) -> &[Box<dyn BuySideAgent>] {
        &self.buy_side
    }

    pub fn buy_side_agent(&self, id: &str) -> Option<&dyn BuySideAgent> {
        self.buy_side
            .iter()
            .find(|a| a.id() == id)
            .map(|a| a.as_ref())
    }

    pub fn nav_history(&self, agent_id: &str) -> Option<&NavHistory> {
        self.buy_side_agent(agent_id).and_then(|a| a.nav_history())
    }

    pub fn bound_multiplier(&self) -> f64 {
        self.bound_multiplier
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn event_count(&self) -> usize {
        self.event_log.len()
    }

    /// Trades, price snapshots and NAV histories so far
    pub fn report(&self) -> RunReport {
        let nav_histories = self
            .buy_side
            .iter()
            .filter_map(|a| {
                a.nav_history()
                    .map(|h| (a.id().to_string(), h.entries().cloned().collect::<Vec<_>>()))
            })
            .collect();
        RunReport {
            market_name: self.market.name().to_string(),
            trades: self.market.trades().to_vec(),
            price_history: self.market.price_history().to_vec(),
            nav_histories,
        }
    }

    fn log_event(&mut self, event: Event) {
        self.event_log.log(event);
    }

    fn log_nav(&mut self, idx: usize, step: usize) {
        let agent = &self.buy_side[idx];
        if let Some(entry) = agent.nav_history().and_then(|h| h.get(step)) {
            let event = Event::NavRecorded {
                step,
                agent_id: agent.id().to_string(),
                nav: entry.nav,
                nav_per_share: entry.nav_per_share,
                flow: entry.flow,
            };
            self.log_event(event);
        }
    }

    // ========================================================================
    // Step Loop
    // ========================================================================

    /// Execute one trading step
    ///
    /// Any failure aborts the step and is reported as
    /// [`SimulationError::StepFailed`] naming the step; the inner error names
    /// the bond or agent involved.
    pub fn run_step(&mut self) -> Result<StepResult, SimulationError> {
        let step = self.clock.current_step();
        if self.clock.is_finished() {
            return Err(SimulationError::RunFinished(step));
        }
        self.execute_step(step).map_err(|e| SimulationError::StepFailed {
            step,
            source: Box::new(e),
        })
    }

    /// Run every remaining trading step
    pub fn run(&mut self) -> Result<Vec<StepResult>, SimulationError> {
        let mut results = Vec::with_capacity(self.clock.steps_remaining());
        while !self.clock.is_finished() {
            results.push(self.run_step()?);
        }
        info!(
            trades = self.market.trades().len(),
            steps = results.len(),
            "run complete"
        );
        Ok(results)
    }

    fn execute_step(&mut self, step: usize) -> Result<StepResult, SimulationError> {
        let mut result = StepResult::new(step);

        // STEP 1: ACTING ORDER
        let mut order: Vec<usize> = (0..self.buy_side.len()).collect();
        if self.config.shuffle_buy_side {
            self.rng.shuffle(&mut order);
        }

        // STEP 2: DECISIONS AND RFQ MATCHING
        for idx in order {
            let rfqs = {
                let mut ctx = DecisionContext {
                    step,
                    market_data: &self.market_data,
                    rng: &mut self.rng,
                };
                self.buy_side[idx].make_portfolio_decision(&mut ctx)?
            };
            for rfq in rfqs {
                self.process_rfq(idx, rfq, step, &mut result)?;
            }
        }

        // STEP 3: END-OF-DAY REVALUATION
        let changes = self
            .market_data
            .yield_changes(step)
            .ok_or(MarketError::MissingYieldChanges {
                step,
                expected: self.market.bonds().len(),
                found: 0,
            })?;
        self.market
            .update_eod_bond_price(step, changes, self.config.revaluation)?;
        self.log_event(Event::Revaluation {
            step,
            mode: self.config.revaluation,
            bonds_revalued: self.market.bonds().len(),
        });

        // STEP 4: YIELD SHOCK
        if let Some(shock) = self.config.yield_shock.filter(|s| s.step == step) {
            self.market.shock_ytm(step, shock.shift)?;
            info!(step, shift = shock.shift, "parallel yield shock applied");
            self.log_event(Event::YieldShock {
                step,
                shift: shock.shift,
                bonds_shocked: self.market.bonds().len(),
            });
            result.shocked = true;
        }

        // STEP 5: PRICE BROADCAST AND END-OF-DAY HISTORY
        let prices = self.market.last_prices().clone();
        for dealer in self.dealers.iter_mut() {
            dealer.update_prices(&prices)?;
        }
        for idx in 0..self.buy_side.len() {
            self.buy_side[idx].update_prices(&prices)?;
            self.buy_side[idx].end_of_day(step)?;
            self.log_nav(idx, step);
        }

        // STEP 6: DEALER BOUND ADJUSTMENT
        self.apply_bound_adjustment(step);

        // STEP 7: PRICE SNAPSHOT
        self.market.record_last_prices(step);
        self.log_event(Event::EndOfDay {
            step,
            num_rfqs: result.num_rfqs,
            num_trades: result.num_trades,
        });
        debug!(
            step,
            rfqs = result.num_rfqs,
            trades = result.num_trades,
            abandoned = result.num_abandoned,
            "step complete"
        );

        // STEP 8: ADVANCE TIME
        self.clock.advance();
        Ok(result)
    }

    /// Quote one RFQ with every dealer, match it, book both sides
    fn process_rfq(
        &mut self,
        agent_idx: usize,
        rfq: Rfq,
        step: usize,
        result: &mut StepResult,
    ) -> Result<(), SimulationError> {
        let agent_id = self.buy_side[agent_idx].id().to_string();
        let order_id = rfq.order_id.to_string();
        result.num_rfqs += 1;
        self.log_event(Event::RfqIssued {
            step,
            agent_id: agent_id.clone(),
            order_id: order_id.clone(),
            bond: rfq.bond.clone(),
            side: rfq.side,
            amount: rfq.amount,
        });

        // every dealer quotes the same pre-trade state
        let mut quotes = Vec::with_capacity(self.dealers.len());
        let mut refusals = Vec::new();
        for dealer in &self.dealers {
            match dealer.make_quote(&rfq)? {
                Some(quote) => quotes.push(quote),
                None => refusals.push(dealer.id().to_string()),
            }
        }
        result.num_refusals += refusals.len();
        for dealer_id in refusals {
            self.log_event(Event::QuoteRefused {
                step,
                dealer_id,
                order_id: order_id.clone(),
                bond: rfq.bond.clone(),
            });
        }

        if quotes.is_empty() {
            warn!(step, order_id = %order_id, bond = %rfq.bond, "no dealer could quote; RFQ abandoned");
            result.num_abandoned += 1;
            self.log_event(Event::RfqAbandoned {
                step,
                agent_id,
                order_id,
                bond: rfq.bond,
            });
            return Ok(());
        }

        let (dealer_confirm, buyside_confirm, tied_quotes) =
            self.market.match_trade(&quotes, step, &mut self.rng)?;

        let dealer = self
            .dealers
            .iter_mut()
            .find(|d| d.id() == dealer_confirm.dealer_id)
            .ok_or_else(|| SimulationError::DealerNotFound(dealer_confirm.dealer_id.clone()))?;
        dealer.modify_portfolio(&dealer_confirm)?;

        if buyside_confirm.agent_id != agent_id {
            return Err(SimulationError::AgentNotFound(buyside_confirm.agent_id));
        }
        self.buy_side[agent_idx].modify_portfolio(&buyside_confirm)?;

        let sequence = self.market.trades().last().map(|t| t.sequence).unwrap_or_default();
        debug!(
            step,
            sequence,
            dealer = %dealer_confirm.dealer_id,
            order_id = %order_id,
            price = dealer_confirm.price,
            "trade executed"
        );
        result.num_trades += 1;
        self.log_event(Event::TradeExecuted {
            step,
            sequence,
            dealer_id: dealer_confirm.dealer_id,
            agent_id,
            order_id,
            bond: dealer_confirm.bond,
            side: dealer_confirm.side,
            size: dealer_confirm.size,
            price: dealer_confirm.price,
            tied_quotes,
        });
        Ok(())
    }

    /// Product of all agents' requested multipliers; logged when it changes
    fn apply_bound_adjustment(&mut self, step: usize) {
        let requests: Vec<(String, f64)> = self
            .buy_side
            .iter()
            .filter_map(|a| a.dealer_bound_multiplier().map(|m| (a.id().to_string(), m)))
            .collect();
        if requests.is_empty() {
            return;
        }
        let multiplier: f64 = requests.iter().map(|(_, m)| m).product();
        if multiplier == self.bound_multiplier {
            return;
        }
        for dealer in self.dealers.iter_mut() {
            dealer.set_bound_multiplier(multiplier);
        }
        self.bound_multiplier = multiplier;
        info!(step, multiplier, "dealer outside bounds rescaled");
        for (agent_id, _) in requests {
            self.log_event(Event::DealerBoundsAdjusted {
                step,
                agent_id,
                multiplier,
            });
        }
    }

    // ========================================================================
    // Checkpointing
    // ========================================================================

    /// Capture the complete mutable state
    pub fn save_state(&self) -> Result<StateSnapshot, SimulationError> {
        Ok(StateSnapshot {
            current_step: self.clock.current_step(),
            rng_state: self.rng.get_state(),
            bound_multiplier: self.bound_multiplier,
            market: self.market.clone(),
            dealers: self.dealers.clone(),
            buy_side: self.buy_side.iter().map(|a| a.snapshot()).collect(),
            config_hash: compute_config_hash(&self.config, &self.market_data)?,
        })
    }

    /// Resume from a snapshot taken with the same config and market data
    ///
    /// The event log starts empty.
    pub fn load_state(
        config: SimulationConfig,
        market_data: MarketData,
        snapshot: StateSnapshot,
    ) -> Result<Self, SimulationError> {
        Self::validate_config(&config, &market_data)?;

        let expected = compute_config_hash(&config, &market_data)?;
        if snapshot.config_hash != expected {
            return Err(SimulationError::StateValidationError(format!(
                "config hash mismatch: snapshot {}, config {}",
                snapshot.config_hash, expected
            )));
        }
        validate_snapshot(&snapshot, &config)?;

        Ok(Self {
            clock: StepClock::resume(config.primer_steps, config.run_steps, snapshot.current_step),
            rng: RngManager::new(snapshot.rng_state),
            config,
            market_data,
            market: snapshot.market,
            dealers: snapshot.dealers,
            buy_side: snapshot.buy_side.into_iter().map(|s| s.into_agent()).collect(),
            bound_multiplier: snapshot.bound_multiplier,
            event_log: EventLog::new(),
        })
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("current_step", &self.clock.current_step())
            .field("bonds", &self.market.bonds().len())
            .field("dealers", &self.dealers.len())
            .field("buy_side", &self.buy_side.len())
            .field("trades", &self.market.trades().len())
            .field("event_count", &self.event_log.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> SimulationConfig {
        SimulationConfig {
            run_steps: 3,
            yield_shock: None,
            ..SimulationConfig::default()
        }
    }

    fn flat_data(config: &SimulationConfig) -> MarketData {
        MarketData::flat(config.primer_steps + config.run_steps, config.bonds.len())
    }

    #[test]
    fn test_new_seeds_priming_history() {
        let config = short_config();
        let data = flat_data(&config);
        let orchestrator = Orchestrator::new(config, data).unwrap();

        assert_eq!(orchestrator.current_step(), 8);
        let history = orchestrator.nav_history("m1").unwrap();
        assert_eq!(history.len(), 8);
        assert!(history.entries().all(|e| e.flow == 0.0));
        assert_eq!(orchestrator.event_log().events_of_type("NavRecorded").len(), 8);
    }

    #[test]
    fn test_no_dealers_rejected() {
        let config = SimulationConfig {
            dealers: Vec::new(),
            ..short_config()
        };
        let data = flat_data(&config);
        assert!(matches!(
            Orchestrator::new(config, data),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_bond_rejected() {
        let mut config = short_config();
        let dup = config.bonds[0].clone();
        config.bonds.push(dup);
        let data = flat_data(&config);
        assert!(matches!(
            Orchestrator::new(config, data),
            Err(SimulationError::Market(MarketError::DuplicateBond(_)))
        ));
    }

    #[test]
    fn test_short_priming_rejected() {
        let config = SimulationConfig {
            primer_steps: 5,
            ..short_config()
        };
        let data = flat_data(&config);
        assert!(matches!(
            Orchestrator::new(config, data),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_step_after_finish_is_error() {
        let config = SimulationConfig {
            run_steps: 1,
            ..short_config()
        };
        let data = flat_data(&config);
        let mut orchestrator = Orchestrator::new(config, data).unwrap();
        orchestrator.run_step().unwrap();
        assert_eq!(
            orchestrator.run_step().unwrap_err(),
            SimulationError::RunFinished(9)
        );
    }

    #[test]
    fn test_every_step_is_snapshotted() {
        let config = short_config();
        let data = flat_data(&config);
        let mut orchestrator = Orchestrator::new(config, data).unwrap();
        orchestrator.run().unwrap();

        let steps: Vec<usize> = orchestrator.price_history().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![8, 9, 10]);
        assert_eq!(orchestrator.event_log().events_of_type("EndOfDay").len(), 3);
    }
}
