//! Relational mirror of the transaction set.
//!
//! Holds the base fields only. Used for hour-of-day range queries; the
//! in-memory unusual-hour rule and `unusual_hour_rows` must agree.

use super::ScoreStore;
use crate::{
    dataset::TransactionSet,
    error::ScoreResult,
    types::RowId,
};
use rusqlite::{params, Connection};

/// `strftime` reads this layout; fractional seconds are not needed here.
const MIRROR_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl ScoreStore {
    /// Replace the mirror for `run_id` with the rows of `set`.
    pub fn mirror_transactions(&self, run_id: &str, set: &TransactionSet) -> ScoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_mirror(&tx, run_id, set)?;
        tx.commit()?;
        Ok(())
    }

    pub fn mirror_row_count(&self, run_id: &str) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?)
    }

    /// Rows whose hour of day lies in `start_hour..=end_hour`, in row order.
    pub fn unusual_hour_rows(
        &self,
        run_id: &str,
        start_hour: u32,
        end_hour: u32,
    ) -> ScoreResult<Vec<RowId>> {
        let mut stmt = self.conn.prepare(
            "SELECT row_id FROM transactions
             WHERE run_id = ?1
               AND CAST(strftime('%H', timestamp) AS INTEGER) BETWEEN ?2 AND ?3
             ORDER BY row_id",
        )?;
        let rows = stmt
            .query_map(params![run_id, start_hour, end_hour], |r| {
                r.get::<_, i64>(0).map(|id| id as RowId)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

pub(super) fn write_mirror(conn: &Connection, run_id: &str, set: &TransactionSet) -> ScoreResult<()> {
    conn.execute("DELETE FROM transactions WHERE run_id = ?1", params![run_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO transactions
            (run_id, row_id, user_id, device_id, timestamp, amount, refund_flag)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for txn in set.rows() {
        stmt.execute(params![
            run_id,
            txn.row as i64,
            txn.user_id,
            txn.device_id,
            txn.timestamp.format(MIRROR_TIMESTAMP_FORMAT).to_string(),
            txn.amount,
            txn.refund_flag as i64,
        ])?;
    }
    log::debug!("Mirrored {} transactions for run {run_id}", set.len());
    Ok(())
}
