//! Daily equity curve points.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One day on the equity curve: cumulative equity plus the day's net P&L.
///
/// The server returns the series ordered by date and recomputes it fully on
/// every fetch; nothing is merged incrementally on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub net_pnl_day: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_point_ordering_by_date() {
        let a = EquityPoint {
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            equity: dec!(10000),
            net_pnl_day: dec!(0),
        };
        let b = EquityPoint {
            date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(),
            equity: dec!(10120),
            net_pnl_day: dec!(120),
        };
        assert!(a.date < b.date);
    }
}
