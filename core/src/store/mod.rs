//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Pipeline stages never execute SQL; the engine and the runner call
//! store methods.

use crate::{
    dataset::{ScoredRecord, TransactionSet},
    error::ScoreResult,
    event::EventLogEntry,
};
use rusqlite::{params, Connection};

mod mirror;
mod scores;

pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    /// Open (or create) the results database at `path`.
    pub fn open(path: &str) -> ScoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only applies to real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoreResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_transactions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_scores.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> ScoreResult<()> {
        insert_run(&self.conn, run_id, seed, version)
    }

    pub fn run_exists(&self, run_id: &str) -> ScoreResult<bool> {
        run_exists(&self.conn, run_id)
    }

    /// Write everything a finished run produced in one transaction:
    /// the run row (if new), the mirror, the scores and the event log.
    /// On any error nothing is committed.
    pub fn persist_run(
        &self,
        run_id: &str,
        seed: u64,
        set: &TransactionSet,
        records: &[ScoredRecord],
        events: &[EventLogEntry],
    ) -> ScoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        if !run_exists(&tx, run_id)? {
            insert_run(&tx, run_id, seed, env!("CARGO_PKG_VERSION"))?;
        }
        mirror::write_mirror(&tx, run_id, set)?;
        scores::write_scores(&tx, run_id, records)?;
        clear_events(&tx, run_id)?;
        for entry in events {
            append_event(&tx, entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> ScoreResult<()> {
        append_event(&self.conn, entry)
    }

    /// Drop a run's event log so a re-run replaces it.
    pub fn clear_events(&self, run_id: &str) -> ScoreResult<()> {
        clear_events(&self.conn, run_id)
    }

    pub fn events_for_run(&self, run_id: &str) -> ScoreResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, stage, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    stage: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn insert_run(conn: &Connection, run_id: &str, seed: u64, version: &str) -> ScoreResult<()> {
    conn.execute(
        "INSERT INTO run (run_id, seed, version) VALUES (?1, ?2, ?3)",
        params![run_id, seed as i64, version],
    )?;
    Ok(())
}

fn run_exists(conn: &Connection, run_id: &str) -> ScoreResult<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM run WHERE run_id = ?1",
        params![run_id],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}

fn append_event(conn: &Connection, entry: &EventLogEntry) -> ScoreResult<()> {
    conn.execute(
        "INSERT INTO event_log (run_id, seq, stage, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.run_id,
            entry.seq as i64,
            entry.stage,
            entry.event_type,
            entry.payload,
        ],
    )?;
    Ok(())
}

fn clear_events(conn: &Connection, run_id: &str) -> ScoreResult<()> {
    conn.execute("DELETE FROM event_log WHERE run_id = ?1", params![run_id])?;
    Ok(())
}
