//! Individual trade records from the journal service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// One executed trade, as recorded by the journal backend.
///
/// A read-only projection: the client never mutates trades, only lists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Server-assigned identifier
    pub id: i64,

    /// Instrument ticker
    pub symbol: String,

    /// Trade direction
    pub side: TradeSide,

    /// Quantity filled
    pub qty: Decimal,

    /// Average fill price
    pub price: Decimal,

    /// Execution timestamp
    pub executed_at: DateTime<Utc>,

    /// Broker fee, when reported
    pub fee: Option<Decimal>,

    /// Transaction tax, when reported
    pub tax: Option<Decimal>,

    /// Execution venue, when reported
    pub venue: Option<String>,
}

impl TradeRecord {
    /// Gross traded value (qty * price).
    pub fn notional(&self) -> Decimal {
        self.qty * self.price
    }

    /// Notional adjusted for fee and tax: costs reduce a sell's proceeds
    /// and increase a buy's outlay.
    pub fn net_amount(&self) -> Decimal {
        let costs = self.fee.unwrap_or(Decimal::ZERO) + self.tax.unwrap_or(Decimal::ZERO);
        match self.side {
            TradeSide::Buy => self.notional() + costs,
            TradeSide::Sell => self.notional() - costs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(side: TradeSide) -> TradeRecord {
        TradeRecord {
            id: 1,
            symbol: "2330".to_string(),
            side,
            qty: dec!(1000),
            price: dec!(600.5),
            executed_at: Utc::now(),
            fee: Some(dec!(85)),
            tax: Some(dec!(180)),
            venue: None,
        }
    }

    #[test]
    fn test_notional() {
        assert_eq!(sample(TradeSide::Buy).notional(), dec!(600500));
    }

    #[test]
    fn test_net_amount_buy_adds_costs() {
        assert_eq!(sample(TradeSide::Buy).net_amount(), dec!(600765));
    }

    #[test]
    fn test_net_amount_sell_subtracts_costs() {
        assert_eq!(sample(TradeSide::Sell).net_amount(), dec!(600235));
    }

    #[test]
    fn test_side_as_str() {
        assert_eq!(TradeSide::Buy.as_str(), "BUY");
        assert_eq!(TradeSide::Sell.as_str(), "SELL");
    }
}
