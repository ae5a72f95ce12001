//! Domain value types: bonds, RFQs and quotes, trade records, NAV history,
//! and the event log

pub mod bond;
pub mod event;
pub mod nav;
pub mod order;
pub mod trade;

pub use bond::{Bond, BondSpec, PRICE_BASIS};
pub use event::{Event, EventLog};
pub use nav::{DuplicateNavStep, NavEntry, NavHistory};
pub use order::{BuySideConfirm, DealerConfirm, OrderId, OrderIdParseError, Quote, Rfq, Side};
pub use trade::{PriceSnapshot, TradeRecord};
