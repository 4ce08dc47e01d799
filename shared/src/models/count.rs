//! Count session domain model
//!
//! A count session is a bounded workflow instance for performing a
//! physical inventory count at one store. The session lifecycle is
//! draft -> in_progress -> finalized, strictly one-directional. Line
//! aggregation and reconciliation are implemented here as pure
//! operations so the server can apply them inside a transaction and
//! tests can exercise them directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::variant::Variant;

/// Errors from pure count-session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CountError {
    /// The session is finalized; no further writes are legal.
    #[error("count session is finalized")]
    SessionFinalized,

    /// Scanned quantities must be positive.
    #[error("scan quantity must be positive")]
    NonPositiveQuantity,

    /// A quantity (or an accumulated line total) exceeds [`MAX_LINE_QTY`].
    #[error("counted quantity exceeds the supported range")]
    QuantityOutOfRange,
}

/// Upper bound for a line's counted quantity. Wire input is unbounded
/// i64, so every accumulation checks against this before committing.
pub const MAX_LINE_QTY: i64 = 1_000_000_000;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    InProgress,
    Finalized,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Finalized => "finalized",
        }
    }

    /// Whether scan and set-quantity writes are legal in this state
    pub fn accepts_writes(&self) -> bool {
        !matches!(self, SessionStatus::Finalized)
    }

    /// Any non-finalized session may be finalized, including a draft
    /// with zero lines.
    pub fn can_finalize(&self) -> bool {
        !matches!(self, SessionStatus::Finalized)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SessionStatus::Draft),
            "in_progress" => Ok(SessionStatus::InProgress),
            "finalized" => Ok(SessionStatus::Finalized),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

/// How a count line was populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMethod {
    Scan,
    Manual,
    SkuLookup,
}

impl CountMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMethod::Scan => "scan",
            CountMethod::Manual => "manual",
            CountMethod::SkuLookup => "sku_lookup",
        }
    }
}

impl FromStr for CountMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(CountMethod::Scan),
            "manual" => Ok(CountMethod::Manual),
            "sku_lookup" => Ok(CountMethod::SkuLookup),
            other => Err(format!("unknown count method: {}", other)),
        }
    }
}

/// Per-variant row within a count session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountLine {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub sku: String,
    pub product_name: String,
    /// On-hand snapshot captured when the variant was first added to the
    /// session. Never re-captured, even if stock moves during the count.
    /// None means on-hand was unknown at snapshot time.
    pub expected_qty: Option<i64>,
    pub counted_qty: i64,
    pub method: CountMethod,
    pub location: Option<String>,
}

impl CountLine {
    /// counted - expected, treating an unknown expected quantity as 0.
    /// Display-only; not persisted.
    pub fn delta(&self) -> i64 {
        self.counted_qty - self.expected_qty.unwrap_or(0)
    }
}

/// A signed stock adjustment produced by finalize
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Adjustment {
    pub variant_id: Uuid,
    pub qty_delta: i64,
}

/// Reconciliation summary returned by finalize. Informational only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalizeSummary {
    /// Lines with a nonzero delta
    pub adjusted: u32,
    /// Lines whose counted quantity matched the expected snapshot
    pub zero: u32,
}

/// A physical inventory count at one store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountSession {
    pub id: Uuid,
    pub code: String,
    pub status: SessionStatus,
    pub note: Option<String>,
    pub store_id: Uuid,
    pub store_code: String,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub lines: Vec<CountLine>,
}

impl CountSession {
    /// Apply a resolved scan: add `qty` to the variant's line, creating
    /// the line with the given expected snapshot if it does not exist.
    /// A draft session becomes in_progress on the first accepted write.
    pub fn apply_scan(
        &mut self,
        variant: &Variant,
        qty: i64,
        expected_on_hand: Option<i64>,
        method: CountMethod,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&CountLine, CountError> {
        if !self.status.accepts_writes() {
            return Err(CountError::SessionFinalized);
        }
        if qty <= 0 {
            return Err(CountError::NonPositiveQuantity);
        }
        if qty > MAX_LINE_QTY {
            return Err(CountError::QuantityOutOfRange);
        }

        let idx = match self.lines.iter().position(|l| l.variant_id == variant.id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.counted_qty = line
                    .counted_qty
                    .checked_add(qty)
                    .filter(|total| *total <= MAX_LINE_QTY)
                    .ok_or(CountError::QuantityOutOfRange)?;
                if location.is_some() {
                    line.location = location;
                }
                idx
            }
            None => {
                self.lines.push(CountLine {
                    id: Uuid::new_v4(),
                    variant_id: variant.id,
                    sku: variant.sku.clone(),
                    product_name: variant.product_name.clone(),
                    expected_qty: expected_on_hand,
                    counted_qty: qty,
                    method,
                    location,
                });
                self.lines.len() - 1
            }
        };

        self.touch(now);
        Ok(&self.lines[idx])
    }

    /// Overwrite a line's counted quantity to an absolute value. Creates
    /// the line (method manual) if the variant has no line yet. Negative
    /// input is clamped to zero; values above [`MAX_LINE_QTY`] are
    /// rejected.
    pub fn set_counted(
        &mut self,
        variant: &Variant,
        counted_qty: i64,
        expected_on_hand: Option<i64>,
        location: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&CountLine, CountError> {
        if !self.status.accepts_writes() {
            return Err(CountError::SessionFinalized);
        }
        if counted_qty > MAX_LINE_QTY {
            return Err(CountError::QuantityOutOfRange);
        }

        let counted = counted_qty.max(0);
        let idx = match self.lines.iter().position(|l| l.variant_id == variant.id) {
            Some(idx) => {
                let line = &mut self.lines[idx];
                line.counted_qty = counted;
                if location.is_some() {
                    line.location = location;
                }
                idx
            }
            None => {
                self.lines.push(CountLine {
                    id: Uuid::new_v4(),
                    variant_id: variant.id,
                    sku: variant.sku.clone(),
                    product_name: variant.product_name.clone(),
                    expected_qty: expected_on_hand,
                    counted_qty: counted,
                    method: CountMethod::Manual,
                    location,
                });
                self.lines.len() - 1
            }
        };

        self.touch(now);
        Ok(&self.lines[idx])
    }

    /// Compute the signed adjustments and summary for this session
    /// without mutating it. Only nonzero deltas become adjustments.
    pub fn reconcile(&self) -> (Vec<Adjustment>, FinalizeSummary) {
        let mut adjustments = Vec::new();
        let mut summary = FinalizeSummary {
            adjusted: 0,
            zero: 0,
        };

        for line in &self.lines {
            let delta = line.delta();
            if delta == 0 {
                summary.zero += 1;
            } else {
                summary.adjusted += 1;
                adjustments.push(Adjustment {
                    variant_id: line.variant_id,
                    qty_delta: delta,
                });
            }
        }

        (adjustments, summary)
    }

    /// Close the session: compute the reconciliation, flip to finalized
    /// and stamp finalized_at. Terminal; a second call fails.
    pub fn finalize(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Adjustment>, FinalizeSummary), CountError> {
        if !self.status.can_finalize() {
            return Err(CountError::SessionFinalized);
        }

        let (adjustments, summary) = self.reconcile();
        self.status = SessionStatus::Finalized;
        self.finalized_at = Some(now);
        Ok((adjustments, summary))
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if self.status == SessionStatus::Draft {
            self.status = SessionStatus::InProgress;
        }
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }
}

// ---------------------------------------------------------------------------
// Wire payloads shared between the backend handlers and the client
// ---------------------------------------------------------------------------

/// Scan submission. At least one of barcode/sku/variant_id is required;
/// variant_id is authoritative when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub variant_id: Option<Uuid>,
    /// Quantity to add; defaults to 1
    pub qty: Option<i64>,
    pub location: Option<String>,
}

/// Explicit quantity overwrite for one variant's line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetQuantityRequest {
    pub variant_id: Uuid,
    pub counted_qty: i64,
    pub location: Option<String>,
}

/// Create a session in draft for one store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub store_id: Uuid,
    /// Autogenerated when absent
    pub code: Option<String>,
    pub note: Option<String>,
}

/// Create-session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: Uuid,
}

/// Finalize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub ok: bool,
    pub summary: FinalizeSummary,
}

/// Session list filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    pub store_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
    /// Matches session code or note
    pub q: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
