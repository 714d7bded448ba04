//! Scored results per transaction.

use super::ScoreStore;
use crate::{dataset::ScoredRecord, error::ScoreResult};
use rusqlite::{params, Connection};

impl ScoreStore {
    pub fn save_scores(&self, run_id: &str, records: &[ScoredRecord]) -> ScoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        write_scores(&tx, run_id, records)?;
        tx.commit()?;
        Ok(())
    }

    pub fn score_count(&self, run_id: &str) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_score WHERE run_id = ?1",
            params![run_id],
            |r| r.get(0),
        )?)
    }

    pub fn high_risk_count(&self, run_id: &str, threshold: u32) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_score WHERE run_id = ?1 AND risk_score >= ?2",
            params![run_id, threshold],
            |r| r.get(0),
        )?)
    }

    /// Distinct users among high-risk rows, joined back to the mirror.
    pub fn high_risk_user_count(&self, run_id: &str, threshold: u32) -> ScoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(DISTINCT t.user_id)
             FROM transaction_score s
             JOIN transactions t ON t.run_id = s.run_id AND t.row_id = s.row_id
             WHERE s.run_id = ?1 AND s.risk_score >= ?2",
            params![run_id, threshold],
            |r| r.get(0),
        )?)
    }
}

pub(super) fn write_scores(conn: &Connection, run_id: &str, records: &[ScoredRecord]) -> ScoreResult<()> {
    conn.execute("DELETE FROM transaction_score WHERE run_id = ?1", params![run_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO transaction_score
            (run_id, row_id, hour, txn_hour, month,
             high_freq_flag, unusual_hour_flag, refund_heavy_flag,
             shared_device_flag, avg_amount, amount_spike_flag, risk_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    for r in records {
        stmt.execute(params![
            run_id,
            r.row as i64,
            r.hour,
            r.txn_hour,
            r.month,
            r.high_freq_flag,
            r.unusual_hour_flag,
            r.refund_heavy_flag,
            r.shared_device_flag,
            r.avg_amount,
            r.amount_spike_flag,
            r.risk_score,
        ])?;
    }
    Ok(())
}
