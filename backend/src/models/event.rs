//! Event log for auditing a simulated run
//!
//! Every significant state change during a trading step is captured as an
//! [`Event`]. Together with the trade ledger, the log shows which RFQs were
//! issued, which dealers refused them, how each was filled, and what
//! end-of-day processing did to prices.
//!
//! # Event Types
//!
//! - **RFQ flow**: `RfqIssued`, `QuoteRefused`, `TradeExecuted`, `RfqAbandoned`
//! - **Pricing**: `Revaluation`, `YieldShock`, `DealerBoundsAdjusted`
//! - **Fund accounting**: `NavRecorded`
//! - **EOD**: `EndOfDay`
//!
//! # Example
//!
//! ```rust
//! use bond_market_simulator_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::YieldShock { step: 50, shift: 0.01, bonds_shocked: 5 });
//! assert_eq!(log.events_of_type("YieldShock").len(), 1);
//! ```

use crate::models::order::Side;
use crate::valuation::RevaluationMode;

/// Simulation event; every variant carries the step it happened on
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Buy-side agent issued an RFQ
    RfqIssued {
        step: usize,
        agent_id: String,
        order_id: String,
        bond: String,
        side: Side,
        amount: f64,
    },

    /// Dealer declined to quote (inventory limit)
    QuoteRefused {
        step: usize,
        dealer_id: String,
        order_id: String,
        bond: String,
    },

    /// RFQ filled by the best quote
    TradeExecuted {
        step: usize,
        sequence: u64,
        dealer_id: String,
        agent_id: String,
        order_id: String,
        bond: String,
        side: Side,
        size: f64,
        price: f64,
        /// Number of quotes that tied at the best price
        tied_quotes: usize,
    },

    /// No dealer could quote the RFQ
    RfqAbandoned {
        step: usize,
        agent_id: String,
        order_id: String,
        bond: String,
    },

    /// End-of-day revaluation from the yield-curve changes
    Revaluation {
        step: usize,
        mode: RevaluationMode,
        bonds_revalued: usize,
    },

    /// Scheduled parallel yield shock
    YieldShock {
        step: usize,
        shift: f64,
        bonds_shocked: usize,
    },

    /// Dealer outside-price bounds rescaled by a hedge-style adjuster
    DealerBoundsAdjusted {
        step: usize,
        agent_id: String,
        multiplier: f64,
    },

    /// Mutual fund NAV entry written
    NavRecorded {
        step: usize,
        agent_id: String,
        nav: f64,
        nav_per_share: f64,
        flow: f64,
    },

    /// Step summary
    EndOfDay {
        step: usize,
        num_rfqs: usize,
        num_trades: usize,
    },
}

impl Event {
    /// Get the step when this event occurred
    pub fn step(&self) -> usize {
        match self {
            Event::RfqIssued { step, .. } => *step,
            Event::QuoteRefused { step, .. } => *step,
            Event::TradeExecuted { step, .. } => *step,
            Event::RfqAbandoned { step, .. } => *step,
            Event::Revaluation { step, .. } => *step,
            Event::YieldShock { step, .. } => *step,
            Event::DealerBoundsAdjusted { step, .. } => *step,
            Event::NavRecorded { step, .. } => *step,
            Event::EndOfDay { step, .. } => *step,
        }
    }

    /// Get the event type as a string (for filtering/querying)
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RfqIssued { .. } => "RfqIssued",
            Event::QuoteRefused { .. } => "QuoteRefused",
            Event::TradeExecuted { .. } => "TradeExecuted",
            Event::RfqAbandoned { .. } => "RfqAbandoned",
            Event::Revaluation { .. } => "Revaluation",
            Event::YieldShock { .. } => "YieldShock",
            Event::DealerBoundsAdjusted { .. } => "DealerBoundsAdjusted",
            Event::NavRecorded { .. } => "NavRecorded",
            Event::EndOfDay { .. } => "EndOfDay",
        }
    }

    /// Order id, if the event belongs to one RFQ
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Event::RfqIssued { order_id, .. }
            | Event::QuoteRefused { order_id, .. }
            | Event::TradeExecuted { order_id, .. }
            | Event::RfqAbandoned { order_id, .. } => Some(order_id),
            _ => None,
        }
    }

    /// Agent (buy-side or dealer) the event is about
    ///
    /// For `TradeExecuted` this is the requester; use
    /// [`EventLog::events_for_agent`] to also match the dealer.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Event::RfqIssued { agent_id, .. }
            | Event::TradeExecuted { agent_id, .. }
            | Event::RfqAbandoned { agent_id, .. }
            | Event::DealerBoundsAdjusted { agent_id, .. }
            | Event::NavRecorded { agent_id, .. } => Some(agent_id),
            Event::QuoteRefused { dealer_id, .. } => Some(dealer_id),
            _ => None,
        }
    }

    fn involves(&self, agent: &str) -> bool {
        match self {
            Event::TradeExecuted {
                agent_id, dealer_id, ..
            } => agent_id == agent || dealer_id == agent,
            _ => self.agent_id() == Some(agent),
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_step(&self, step: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.step() == step).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_order(&self, order_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.order_id() == Some(order_id))
            .collect()
    }

    /// Events naming `agent_id` as requester or dealer
    pub fn events_for_agent(&self, agent_id: &str) -> Vec<&Event> {
        self.events.iter().filter(|e| e.involves(agent_id)).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
