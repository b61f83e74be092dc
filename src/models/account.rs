//! Brokerage account as reported by the journal service.

use serde::{Deserialize, Serialize};

/// A single brokerage account. Immutable once fetched; selection is tracked
/// separately by account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Server-assigned identifier
    pub id: i64,

    /// Display code (e.g. broker account number)
    pub code: String,

    /// Account currency, when the broker connection reports one
    pub currency: Option<String>,

    /// User-chosen nickname
    pub nickname: Option<String>,

    /// Broker name behind the account
    pub broker: Option<String>,
}

impl Account {
    /// Label used in tables: nickname when present, otherwise the code.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.code)
    }
}
