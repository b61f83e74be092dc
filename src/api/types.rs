//! Wire types for the journal backend API.
//!
//! These mirror the backend JSON exactly and are converted into the domain
//! models at the boundary; conversion fails fast on shape mismatch instead
//! of letting loosely-typed values travel further.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Account, EquityPoint, MetricsSummary, TradeRecord, TradeSide};

/// Login request body for POST /auth/login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token pair returned by a successful login. Only the access token is used.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Registration request body for POST /auth/register.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// User record returned by a successful registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
}

/// Account entry from GET /accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub account_code: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub broker: Option<String>,
}

impl From<AccountResponse> for Account {
    fn from(resp: AccountResponse) -> Self {
        Account {
            id: resp.id,
            code: resp.account_code,
            currency: resp.currency,
            nickname: resp.nickname,
            broker: resp.broker,
        }
    }
}

/// KPI summary from GET /kpis/summary.
#[derive(Debug, Clone, Deserialize)]
pub struct KpiSummaryResponse {
    pub win_rate: Option<f64>,
    pub avg_win: Option<Decimal>,
    pub avg_loss: Option<Decimal>,
    pub profit_factor: Option<f64>,
    pub expectancy: Option<Decimal>,
    pub mdd: Option<f64>,
    pub total_trades: u32,
}

impl From<KpiSummaryResponse> for MetricsSummary {
    fn from(resp: KpiSummaryResponse) -> Self {
        MetricsSummary {
            win_rate: resp.win_rate,
            avg_win: resp.avg_win,
            avg_loss: resp.avg_loss,
            profit_factor: resp.profit_factor,
            expectancy: resp.expectancy,
            max_drawdown: resp.mdd,
            total_trades: resp.total_trades,
        }
    }
}

/// Equity point from GET /equity/daily.
#[derive(Debug, Clone, Deserialize)]
pub struct EquityPointResponse {
    pub date: NaiveDate,
    pub equity: Decimal,
    pub net_pnl_day: Decimal,
}

impl From<EquityPointResponse> for EquityPoint {
    fn from(resp: EquityPointResponse) -> Self {
        EquityPoint {
            date: resp.date,
            equity: resp.equity,
            net_pnl_day: resp.net_pnl_day,
        }
    }
}

/// Trade entry from GET /accounts/{id}/trades.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    pub id: i64,
    pub symbol: String,
    pub side: String,
    pub qty: Decimal,
    pub price: Decimal,
    pub trade_ts: String,
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub tax: Option<Decimal>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl TryFrom<TradeResponse> for TradeRecord {
    type Error = String;

    fn try_from(resp: TradeResponse) -> Result<Self, Self::Error> {
        let side = match resp.side.to_uppercase().as_str() {
            "BUY" => TradeSide::Buy,
            "SELL" => TradeSide::Sell,
            other => return Err(format!("unknown trade side: {}", other)),
        };
        let executed_at = parse_timestamp(&resp.trade_ts)
            .ok_or_else(|| format!("unparseable trade timestamp: {}", resp.trade_ts))?;

        Ok(TradeRecord {
            id: resp.id,
            symbol: resp.symbol,
            side,
            qty: resp.qty,
            price: resp.price,
            executed_at,
            fee: resp.fee,
            tax: resp.tax,
            venue: resp.venue,
        })
    }
}

/// Result of a CSV statement upload.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvImportResult {
    pub account_id: i64,
    pub imported_trades: u32,
    pub ignored_rows: u32,
}

/// Query parameters for GET /kpis/summary.
#[derive(Debug, Clone, Serialize)]
pub struct KpiQuery {
    pub account_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub scope: &'static str,
}

/// Query parameters for GET /equity/daily.
#[derive(Debug, Clone, Serialize)]
pub struct EquityQuery {
    pub account_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Optional filters for GET /accounts/{id}/trades.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TradeListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// Parse a backend timestamp: RFC 3339 when the server includes an offset,
/// otherwise a naive datetime taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
