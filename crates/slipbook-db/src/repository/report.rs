//! # Report Repository
//!
//! Read-only aggregates over receipts: what was billed, what was
//! collected, who still owes, and whether stored totals still agree with
//! their lines.

use chrono::{DateTime, Utc};
use slipbook_core::format::to_iso8601;
use slipbook_core::{Receipt, ReceiptSummary, TotalDiscrepancy};
use tracing::debug;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::receipt::{hydrate, RECEIPT_COLUMNS};
use crate::schema::ColumnSet;

/// `paid` counts the full total even if `amount_paid_kobo` is missing on an
/// older row; `part_paid` counts what was recorded. Missing payment columns
/// read as NULL.
fn summary_select(columns: &ColumnSet) -> String {
    let status = columns.or("receipts", "payment_status", "NULL");
    let paid = columns.or("receipts", "amount_paid_kobo", "NULL");

    format!(
        r#"
        SELECT
            COUNT(*) AS receipt_count,
            COALESCE(SUM(total_kobo), 0) AS billed_kobo,
            COALESCE(SUM(CASE {status}
                WHEN 'paid' THEN total_kobo
                WHEN 'part_paid' THEN COALESCE({paid}, 0)
                ELSE 0
            END), 0) AS collected_kobo,
            COALESCE(SUM({status} = 'paid'), 0) AS paid_count,
            COALESCE(SUM({status} = 'part_paid'), 0) AS part_paid_count,
            COALESCE(SUM({status} = 'not_paid'), 0) AS not_paid_count,
            COALESCE(SUM({status} IS NULL), 0) AS unset_count
        FROM receipts
        "#,
        status = status,
        paid = paid
    )
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: Database,
}

impl ReportRepository {
    pub fn new(db: Database) -> Self {
        ReportRepository { db }
    }

    /// Totals over every receipt, or over `[start, end)` when given.
    pub async fn summary(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> DbResult<ReceiptSummary> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(ReceiptSummary::default());
        };

        debug!(?range, "Summarizing receipts");

        let select = summary_select(&*self.db.columns().await?);
        let summary = match range {
            Some((start, end)) => {
                sqlx::query_as(&format!(
                    "{} WHERE created_at >= ?1 AND created_at < ?2",
                    select
                ))
                .bind(to_iso8601(start))
                .bind(to_iso8601(end))
                .fetch_one(pool)
                .await?
            }
            None => sqlx::query_as(&select).fetch_one(pool).await?,
        };

        Ok(summary)
    }

    /// Receipts marked not paid or part paid, newest first.
    pub async fn outstanding_receipts(&self) -> DbResult<Vec<Receipt>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        let columns = self.db.columns().await?;
        if !columns.has("receipts", "payment_status") {
            return Ok(Vec::new());
        }

        let receipts: Vec<Receipt> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM receipts
            WHERE payment_status IN ('not_paid', 'part_paid')
            ORDER BY created_at DESC, rowid DESC
            "#,
            columns.select_list("receipts", RECEIPT_COLUMNS)
        ))
        .fetch_all(pool)
        .await?;

        hydrate(pool, receipts).await
    }

    /// Receipts whose stored total differs from the sum of their lines.
    ///
    /// Every receipt written through [`ReceiptRepository`] passes this
    /// check; rows edited by hand or carried over from older builds may not.
    ///
    /// [`ReceiptRepository`]: crate::repository::receipt::ReceiptRepository
    pub async fn audit_totals(&self) -> DbResult<Vec<TotalDiscrepancy>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as(
            r#"
            SELECT
                r.id AS receipt_id,
                r.receipt_number AS receipt_number,
                r.total_kobo AS stored_kobo,
                CAST(COALESCE(SUM(ROUND(i.quantity * i.price_kobo)), 0) AS INTEGER) AS computed_kobo
            FROM receipts r
            LEFT JOIN receipt_items i ON i.receipt_id = r.id
            GROUP BY r.id
            HAVING stored_kobo != computed_kobo
            ORDER BY r.created_at
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}
