//! Performance summary computed by the journal service for one account
//! over one date window.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// KPI summary for the selected account and window.
///
/// Every ratio and amount is optional: the backend omits a field when the
/// window holds too few trades to compute it. The summary is never cached
/// beyond the current selection; the service recomputes it on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Fraction of winning trades (0.0 to 1.0)
    pub win_rate: Option<f64>,

    /// Average profit on winning trades
    pub avg_win: Option<Decimal>,

    /// Average loss on losing trades
    pub avg_loss: Option<Decimal>,

    /// Gross profit / gross loss
    pub profit_factor: Option<f64>,

    /// Expected P&L per trade
    pub expectancy: Option<Decimal>,

    /// Maximum drawdown over the window
    pub max_drawdown: Option<f64>,

    /// Number of trades in the window
    pub total_trades: u32,
}

impl MetricsSummary {
    /// Win rate as a percentage, when known.
    pub fn win_rate_pct(&self) -> Option<f64> {
        self.win_rate.map(|r| r * 100.0)
    }

    /// True when the window held no trades at all.
    pub fn is_empty_window(&self) -> bool {
        self.total_trades == 0
    }
}
