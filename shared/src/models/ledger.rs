//! Stock ledger entries
//!
//! The ledger is the append-only audit trail of signed quantity changes
//! per store and variant. Finalizing a count appends one entry per line
//! with a nonzero delta, referencing the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Source event that produced a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    Count,
    Sale,
    Transfer,
    Purchase,
    Adjustment,
}

impl LedgerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSource::Count => "count",
            LedgerSource::Sale => "sale",
            LedgerSource::Transfer => "transfer",
            LedgerSource::Purchase => "purchase",
            LedgerSource::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for LedgerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(LedgerSource::Count),
            "sale" => Ok(LedgerSource::Sale),
            "transfer" => Ok(LedgerSource::Transfer),
            "purchase" => Ok(LedgerSource::Purchase),
            "adjustment" => Ok(LedgerSource::Adjustment),
            other => Err(format!("unknown ledger source: {}", other)),
        }
    }
}

/// One signed stock movement with its resulting balance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLedgerEntry {
    pub id: Uuid,
    pub store_id: Uuid,
    pub variant_id: Uuid,
    pub qty_delta: i64,
    pub resulting_balance: i64,
    pub source: LedgerSource,
    /// Back-reference to the source event, e.g. the count session id
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
