//! Data models for accounts, metrics, equity points, trades, and fetch state.

mod account;
mod equity;
mod fetch;
mod metrics;
mod trade;

pub use account::Account;
pub use equity::EquityPoint;
pub use fetch::FetchState;
pub use metrics::MetricsSummary;
pub use trade::{TradeRecord, TradeSide};
