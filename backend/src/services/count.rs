//! Count session service
//!
//! Owns the authoritative copy of every count session. All mutation
//! happens inside a transaction that locks the session row (`FOR
//! UPDATE`), so concurrent scans, quantity edits, and finalize calls
//! serialize per session: an in-flight scan either lands before a
//! finalize or is rejected by the state guard, never after. The pure
//! lifecycle and aggregation rules live in the shared crate; this
//! service re-reads state, applies them, and persists the result.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{
    Adjustment, CountLine, CountMethod, CountSession, CreateSessionRequest, CreatedSession,
    FinalizeResponse, LedgerSource, Page, Pagination, ScanRequest, SessionFilter, SessionStatus,
    SetQuantityRequest, StockLedgerEntry, Variant,
};

/// Service for the count-session lifecycle, line aggregation, and
/// finalize/reconciliation
#[derive(Clone)]
pub struct CountService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    code: String,
    status: String,
    note: Option<String>,
    store_id: Uuid,
    store_code: String,
    store_name: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finalized_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: Uuid,
    session_id: Uuid,
    variant_id: Uuid,
    sku: String,
    product_name: String,
    expected_qty: Option<i64>,
    counted_qty: i64,
    method: String,
    location: Option<String>,
}

#[derive(Debug, FromRow)]
struct VariantRow {
    id: Uuid,
    sku: String,
    barcode: Option<String>,
    product_name: String,
}

#[derive(Debug, FromRow)]
struct LedgerRow {
    id: Uuid,
    store_id: Uuid,
    variant_id: Uuid,
    qty_delta: i64,
    resulting_balance: i64,
    source: String,
    reference_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, lines: Vec<LineRow>) -> AppResult<CountSession> {
        let status = SessionStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let lines = lines
            .into_iter()
            .map(LineRow::into_line)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CountSession {
            id: self.id,
            code: self.code,
            status,
            note: self.note,
            store_id: self.store_id,
            store_code: self.store_code,
            store_name: self.store_name,
            created_at: self.created_at,
            started_at: self.started_at,
            finalized_at: self.finalized_at,
            lines,
        })
    }
}

impl LineRow {
    fn into_line(self) -> AppResult<CountLine> {
        let method = CountMethod::from_str(&self.method)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

        Ok(CountLine {
            id: self.id,
            variant_id: self.variant_id,
            sku: self.sku,
            product_name: self.product_name,
            expected_qty: self.expected_qty,
            counted_qty: self.counted_qty,
            method,
            location: self.location,
        })
    }
}

const SESSION_SELECT: &str = r#"
    SELECT s.id, s.code, s.status, s.note, s.store_id,
           st.code AS store_code, st.name AS store_name,
           s.created_at, s.started_at, s.finalized_at
    FROM count_sessions s
    JOIN stores st ON st.id = s.store_id
"#;

const LINE_SELECT: &str = r#"
    SELECT id, session_id, variant_id, sku, product_name,
           expected_qty, counted_qty, method, location
    FROM count_lines
"#;

impl CountService {
    /// Create a new CountService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List the tenant's count sessions with optional store, status, and
    /// free-text filters
    pub async fn list_sessions(
        &self,
        tenant_id: Uuid,
        filter: SessionFilter,
    ) -> AppResult<Page<CountSession>> {
        let paging = Pagination {
            page: filter.page.unwrap_or(1),
            page_size: filter.page_size.unwrap_or(20),
        }
        .clamped();
        let status = filter.status.map(|s| s.as_str().to_string());

        let filter_sql = r#"
            WHERE s.tenant_id = $1
              AND ($2::uuid IS NULL OR s.store_id = $2)
              AND ($3::text IS NULL OR s.status = $3)
              AND ($4::text IS NULL
                   OR s.code ILIKE '%' || $4 || '%'
                   OR s.note ILIKE '%' || $4 || '%')
        "#;

        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "{} {} ORDER BY s.created_at DESC LIMIT $5 OFFSET $6",
            SESSION_SELECT, filter_sql
        ))
        .bind(tenant_id)
        .bind(filter.store_id)
        .bind(&status)
        .bind(&filter.q)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.db)
        .await?;

        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM count_sessions s {}",
            filter_sql
        ))
        .bind(tenant_id)
        .bind(filter.store_id)
        .bind(&status)
        .bind(&filter.q)
        .fetch_one(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let line_rows = sqlx::query_as::<_, LineRow>(&format!(
            "{} WHERE session_id = ANY($1) ORDER BY sku",
            LINE_SELECT
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_session: HashMap<Uuid, Vec<LineRow>> = HashMap::new();
        for line in line_rows {
            by_session.entry(line.session_id).or_default().push(line);
        }

        let results = rows
            .into_iter()
            .map(|row| {
                let lines = by_session.remove(&row.id).unwrap_or_default();
                row.into_session(lines)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Page { results, count })
    }

    /// Create a session in draft for one store. The store is fixed for
    /// the session's whole lifetime.
    pub async fn create_session(
        &self,
        tenant_id: Uuid,
        input: CreateSessionRequest,
    ) -> AppResult<CreatedSession> {
        let store_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(input.store_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        if !store_exists {
            return Err(AppError::NotFound("Store".to_string()));
        }

        let code = match input.code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => generate_session_code(),
        };

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO count_sessions (id, tenant_id, store_id, code, status, note)
            VALUES ($1, $2, $3, $4, 'draft', $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(input.store_id)
        .bind(&code)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateEntry("code".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        tracing::info!(session = %code, store = %input.store_id, "count session created");
        Ok(CreatedSession { id })
    }

    /// Fetch one session with its full line set
    pub async fn get_session(&self, tenant_id: Uuid, session_id: Uuid) -> AppResult<CountSession> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "{} WHERE s.id = $1 AND s.tenant_id = $2",
            SESSION_SELECT
        ))
        .bind(session_id)
        .bind(tenant_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Count session".to_string()))?;

        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "{} WHERE session_id = $1 ORDER BY sku",
            LINE_SELECT
        ))
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        row.into_session(lines)
    }

    /// Apply a scan: resolve the identifier, add the quantity to the
    /// variant's line (snapshotting expected on-hand on first touch),
    /// and return the refreshed session. The first accepted scan moves a
    /// draft session to in_progress within the same transaction.
    pub async fn scan(
        &self,
        tenant_id: Uuid,
        session_id: Uuid,
        input: ScanRequest,
    ) -> AppResult<CountSession> {
        if input.variant_id.is_none()
            && !has_text(&input.barcode)
            && !has_text(&input.sku)
        {
            return Err(AppError::MissingIdentifier);
        }

        let mut tx = self.db.begin().await?;
        let mut session = Self::load_session_for_update(&mut tx, tenant_id, session_id).await?;
        if !session.status.accepts_writes() {
            return Err(AppError::InvalidSessionState(format!(
                "count session {} is finalized",
                session.code
            )));
        }

        let (variant, method) = Self::resolve_variant(&mut tx, tenant_id, &input).await?;
        let qty = input.qty.unwrap_or(1);

        // Expected on-hand is snapshotted only when the line is created
        let expected = if session.lines.iter().any(|l| l.variant_id == variant.id) {
            None
        } else {
            Self::on_hand(&mut tx, session.store_id, variant.id).await?
        };

        let line = session
            .apply_scan(&variant, qty, expected, method, input.location.clone(), Utc::now())?
            .clone();

        Self::upsert_line(&mut tx, session_id, &line).await?;
        Self::store_session_progress(&mut tx, &session).await?;
        tx.commit().await?;

        tracing::debug!(session = %session.code, sku = %line.sku, qty, "scan applied");
        Ok(session)
    }

    /// Overwrite one line's counted quantity to an absolute value and
    /// return the refreshed session
    pub async fn set_quantity(
        &self,
        tenant_id: Uuid,
        session_id: Uuid,
        input: SetQuantityRequest,
    ) -> AppResult<CountSession> {
        let mut tx = self.db.begin().await?;
        let mut session = Self::load_session_for_update(&mut tx, tenant_id, session_id).await?;
        if !session.status.accepts_writes() {
            return Err(AppError::InvalidSessionState(format!(
                "count session {} is finalized",
                session.code
            )));
        }

        let variant = Self::find_variant_by_id(&mut tx, tenant_id, input.variant_id).await?;

        let expected = if session.lines.iter().any(|l| l.variant_id == variant.id) {
            None
        } else {
            Self::on_hand(&mut tx, session.store_id, variant.id).await?
        };

        let line = session
            .set_counted(
                &variant,
                input.counted_qty,
                expected,
                input.location.clone(),
                Utc::now(),
            )?
            .clone();

        Self::upsert_line(&mut tx, session_id, &line).await?;
        Self::store_session_progress(&mut tx, &session).await?;
        tx.commit().await?;

        tracing::debug!(
            session = %session.code,
            sku = %line.sku,
            counted = line.counted_qty,
            "counted quantity set"
        );
        Ok(session)
    }

    /// Atomically close a session: one ledger entry per nonzero-delta
    /// line plus the status flip, all in a single transaction. A second
    /// finalize fails on the state guard, so adjustments can never be
    /// applied twice.
    pub async fn finalize(&self, tenant_id: Uuid, session_id: Uuid) -> AppResult<FinalizeResponse> {
        let mut tx = self.db.begin().await?;
        let mut session = Self::load_session_for_update(&mut tx, tenant_id, session_id).await?;

        let (adjustments, summary) = session.finalize(Utc::now()).map_err(|_| {
            AppError::InvalidSessionState(format!(
                "count session {} is already finalized",
                session.code
            ))
        })?;

        // Lock the affected variant rows in a stable order before reading
        // balances, so concurrent finalizes touching the same variants
        // serialize their ledger appends instead of chaining
        // resulting_balance off the same stale base.
        let variant_ids = adjusted_variant_ids(&adjustments);
        if !variant_ids.is_empty() {
            sqlx::query("SELECT id FROM variants WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(&variant_ids)
                .execute(&mut *tx)
                .await?;
        }

        for adjustment in &adjustments {
            let current = Self::on_hand(&mut tx, session.store_id, adjustment.variant_id)
                .await?
                .unwrap_or(0);
            let balance = current.checked_add(adjustment.qty_delta).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "stock balance overflow for variant {}",
                    adjustment.variant_id
                ))
            })?;

            sqlx::query(
                r#"
                INSERT INTO stock_ledger
                    (id, tenant_id, store_id, variant_id, qty_delta,
                     resulting_balance, source, reference_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(session.store_id)
            .bind(adjustment.variant_id)
            .bind(adjustment.qty_delta)
            .bind(balance)
            .bind(LedgerSource::Count.as_str())
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE count_sessions SET status = 'finalized', finalized_at = $2 WHERE id = $1")
            .bind(session_id)
            .bind(session.finalized_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            session = %session.code,
            adjusted = summary.adjusted,
            zero = summary.zero,
            "count session finalized"
        );
        Ok(FinalizeResponse { ok: true, summary })
    }

    /// Ledger entries produced by one count session (audit view)
    pub async fn session_ledger(
        &self,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> AppResult<Vec<StockLedgerEntry>> {
        let session_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM count_sessions WHERE id = $1 AND tenant_id = $2)",
        )
        .bind(session_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        if !session_exists {
            return Err(AppError::NotFound("Count session".to_string()));
        }

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, store_id, variant_id, qty_delta, resulting_balance,
                   source, reference_id, created_at
            FROM stock_ledger
            WHERE tenant_id = $1 AND reference_id = $2 AND source = 'count'
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(session_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let source = LedgerSource::from_str(&row.source)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
                Ok(StockLedgerEntry {
                    id: row.id,
                    store_id: row.store_id,
                    variant_id: row.variant_id,
                    qty_delta: row.qty_delta,
                    resulting_balance: row.resulting_balance,
                    source,
                    reference_id: row.reference_id,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    // -- internal helpers, all running on the caller's transaction --

    /// Load a session and its lines with the session row locked, so
    /// concurrent mutations of the same session serialize here.
    async fn load_session_for_update(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        session_id: Uuid,
    ) -> AppResult<CountSession> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "{} WHERE s.id = $1 AND s.tenant_id = $2 FOR UPDATE OF s",
            SESSION_SELECT
        ))
        .bind(session_id)
        .bind(tenant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Count session".to_string()))?;

        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "{} WHERE session_id = $1 ORDER BY sku",
            LINE_SELECT
        ))
        .bind(session_id)
        .fetch_all(&mut **tx)
        .await?;

        row.into_session(lines)
    }

    /// Resolve a scan identifier to a catalog variant. Precedence:
    /// variant id (authoritative), then barcode, then SKU text.
    async fn resolve_variant(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        input: &ScanRequest,
    ) -> AppResult<(Variant, CountMethod)> {
        if let Some(variant_id) = input.variant_id {
            let variant = Self::find_variant_by_id(tx, tenant_id, variant_id).await?;
            return Ok((variant, CountMethod::SkuLookup));
        }

        if let Some(barcode) = input.barcode.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Scanner bursts sometimes carry a SKU, so fall back to it
            let row = sqlx::query_as::<_, VariantRow>(
                r#"
                SELECT id, sku, barcode, product_name
                FROM variants
                WHERE tenant_id = $1 AND (barcode = $2 OR sku = $2)
                LIMIT 1
                "#,
            )
            .bind(tenant_id)
            .bind(barcode)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::VariantNotFound(barcode.to_string()))?;

            return Ok((variant_from_row(row), CountMethod::Scan));
        }

        if let Some(sku) = input.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let row = sqlx::query_as::<_, VariantRow>(
                "SELECT id, sku, barcode, product_name FROM variants WHERE tenant_id = $1 AND sku = $2",
            )
            .bind(tenant_id)
            .bind(sku)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::VariantNotFound(sku.to_string()))?;

            return Ok((variant_from_row(row), CountMethod::SkuLookup));
        }

        Err(AppError::MissingIdentifier)
    }

    async fn find_variant_by_id(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: Uuid,
        variant_id: Uuid,
    ) -> AppResult<Variant> {
        let row = sqlx::query_as::<_, VariantRow>(
            "SELECT id, sku, barcode, product_name FROM variants WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(variant_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::VariantNotFound(variant_id.to_string()))?;

        Ok(variant_from_row(row))
    }

    /// Current on-hand at a store: the latest resulting balance in the
    /// ledger, or None when the variant has no history there.
    async fn on_hand(
        tx: &mut Transaction<'_, Postgres>,
        store_id: Uuid,
        variant_id: Uuid,
    ) -> AppResult<Option<i64>> {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT resulting_balance
            FROM stock_ledger
            WHERE store_id = $1 AND variant_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(store_id)
        .bind(variant_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(balance)
    }

    /// Persist one mutated line. expected_qty is written only on insert;
    /// the snapshot is never re-captured on conflict.
    async fn upsert_line(
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        line: &CountLine,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO count_lines
                (id, session_id, variant_id, sku, product_name,
                 expected_qty, counted_qty, method, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (session_id, variant_id) DO UPDATE
            SET counted_qty = EXCLUDED.counted_qty,
                location = EXCLUDED.location
            "#,
        )
        .bind(line.id)
        .bind(session_id)
        .bind(line.variant_id)
        .bind(&line.sku)
        .bind(&line.product_name)
        .bind(line.expected_qty)
        .bind(line.counted_qty)
        .bind(line.method.as_str())
        .bind(&line.location)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Persist the implicit draft -> in_progress transition together
    /// with the line write, never as a separate step.
    async fn store_session_progress(
        tx: &mut Transaction<'_, Postgres>,
        session: &CountSession,
    ) -> AppResult<()> {
        sqlx::query("UPDATE count_sessions SET status = $2, started_at = $3 WHERE id = $1")
            .bind(session.id)
            .bind(session.status.as_str())
            .bind(session.started_at)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

fn variant_from_row(row: VariantRow) -> Variant {
    Variant {
        id: row.id,
        sku: row.sku,
        barcode: row.barcode,
        product_name: row.product_name,
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// CNT- plus six hex characters from a fresh UUID
fn generate_session_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("CNT-{}", id[..6].to_uppercase())
}

/// Variant ids touched by a finalize, sorted and deduplicated so row
/// locks are always acquired in the same order across transactions.
fn adjusted_variant_ids(adjustments: &[Adjustment]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = adjustments.iter().map(|a| a.variant_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_is_sorted_and_deduplicated() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let adjustments = vec![
            Adjustment {
                variant_id: b,
                qty_delta: 3,
            },
            Adjustment {
                variant_id: a,
                qty_delta: -1,
            },
            Adjustment {
                variant_id: b,
                qty_delta: 2,
            },
        ];

        let ids = adjusted_variant_ids(&adjustments);
        assert_eq!(ids.len(), 2);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn session_codes_have_the_expected_shape() {
        let code = generate_session_code();
        assert!(code.starts_with("CNT-"));
        assert_eq!(code.len(), 10);
        assert!(code[4..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
