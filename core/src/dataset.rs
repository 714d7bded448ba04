//! The transaction set threaded through the pipeline.
//!
//! RULE: stages never mutate a set in place. Each stage consumes the
//! current set and returns it with one or more columns added. Rows are
//! never removed or reordered, so a column is a plain Vec indexed by row.
//!
//! Reading a column that no earlier stage produced is a schema error.

use crate::{
    error::{ScoreError, ScoreResult},
    time_features::TimeFeatures,
    transaction::Transaction,
    types::RowId,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Rule flag columns, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagColumn {
    HighFrequency,
    UnusualHour,
    RefundHeavy,
    SharedDevice,
    AmountSpike,
}

impl FlagColumn {
    pub const ALL: [FlagColumn; 5] = [
        FlagColumn::HighFrequency,
        FlagColumn::UnusualHour,
        FlagColumn::RefundHeavy,
        FlagColumn::SharedDevice,
        FlagColumn::AmountSpike,
    ];

    /// Stable column name used in exports and schema errors.
    pub fn column_name(self) -> &'static str {
        match self {
            FlagColumn::HighFrequency => "high_freq_flag",
            FlagColumn::UnusualHour   => "unusual_hour_flag",
            FlagColumn::RefundHeavy   => "refund_heavy_flag",
            FlagColumn::SharedDevice  => "shared_device_flag",
            FlagColumn::AmountSpike   => "amount_spike_flag",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSet {
    rows: Vec<Transaction>,
    time: Option<Vec<TimeFeatures>>,
    flags: BTreeMap<FlagColumn, Vec<bool>>,
    avg_amount: Option<Vec<f64>>,
    risk_score: Option<Vec<u32>>,
}

impl TransactionSet {
    /// Wrap `rows` in input order. Row identity is the position in the
    /// input, so any `row` the caller set is overwritten.
    pub fn new(mut rows: Vec<Transaction>) -> Self {
        for (position, txn) in rows.iter_mut().enumerate() {
            txn.row = position;
        }
        Self {
            rows,
            time: None,
            flags: BTreeMap::new(),
            avg_amount: None,
            risk_score: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    // ── Column readers ─────────────────────────────────────────

    pub fn time_features(&self) -> ScoreResult<&[TimeFeatures]> {
        self.time
            .as_deref()
            .ok_or_else(|| ScoreError::schema("txn_hour"))
    }

    pub fn flag(&self, column: FlagColumn) -> ScoreResult<&[bool]> {
        self.flags
            .get(&column)
            .map(Vec::as_slice)
            .ok_or_else(|| ScoreError::schema(column.column_name()))
    }

    pub fn avg_amounts(&self) -> ScoreResult<&[f64]> {
        self.avg_amount
            .as_deref()
            .ok_or_else(|| ScoreError::schema("avg_amount"))
    }

    pub fn risk_scores(&self) -> ScoreResult<&[u32]> {
        self.risk_score
            .as_deref()
            .ok_or_else(|| ScoreError::schema("risk_score"))
    }

    pub fn has_flag(&self, column: FlagColumn) -> bool {
        self.flags.contains_key(&column)
    }

    /// Rows whose flag in `column` is set.
    pub fn flagged_rows(&self, column: FlagColumn) -> ScoreResult<Vec<RowId>> {
        Ok(self
            .flag(column)?
            .iter()
            .enumerate()
            .filter_map(|(i, &set)| set.then_some(i))
            .collect())
    }

    pub fn flagged_count(&self, column: FlagColumn) -> ScoreResult<usize> {
        Ok(self.flag(column)?.iter().filter(|&&set| set).count())
    }

    /// Number of distinct users among the given rows.
    pub fn distinct_users(&self, rows: &[RowId]) -> usize {
        rows.iter()
            .map(|&i| self.rows[i].user_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    // ── Column writers ─────────────────────────────────────────

    pub fn with_time_features(mut self, column: Vec<TimeFeatures>) -> Self {
        self.check_len(column.len(), "txn_hour");
        self.time = Some(column);
        self
    }

    pub fn with_flag(mut self, flag: FlagColumn, column: Vec<bool>) -> Self {
        self.check_len(column.len(), flag.column_name());
        self.flags.insert(flag, column);
        self
    }

    pub fn with_avg_amounts(mut self, column: Vec<f64>) -> Self {
        self.check_len(column.len(), "avg_amount");
        self.avg_amount = Some(column);
        self
    }

    pub fn with_risk_scores(mut self, column: Vec<u32>) -> Self {
        self.check_len(column.len(), "risk_score");
        self.risk_score = Some(column);
        self
    }

    fn check_len(&self, len: usize, column: &str) {
        assert_eq!(
            len,
            self.rows.len(),
            "column '{column}' has {len} values for {} rows",
            self.rows.len()
        );
    }

    // ── Export ─────────────────────────────────────────────────

    /// Fully enriched view of one row. Requires every column.
    pub fn record(&self, row: RowId) -> ScoreResult<ScoredRecord> {
        let txn = &self.rows[row];
        let time = &self.time_features()?[row];
        let flag = |column: FlagColumn| -> ScoreResult<u8> { Ok(u8::from(self.flag(column)?[row])) };

        Ok(ScoredRecord {
            row: txn.row,
            user_id: txn.user_id.clone(),
            device_id: txn.device_id.clone(),
            timestamp: txn.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            amount: txn.amount,
            refund_flag: u8::from(txn.refund_flag),
            hour: time.hour,
            txn_hour: time.txn_hour.format(TIMESTAMP_FORMAT).to_string(),
            month: time.month.to_string(),
            high_freq_flag: flag(FlagColumn::HighFrequency)?,
            unusual_hour_flag: flag(FlagColumn::UnusualHour)?,
            refund_heavy_flag: flag(FlagColumn::RefundHeavy)?,
            shared_device_flag: flag(FlagColumn::SharedDevice)?,
            avg_amount: self.avg_amounts()?[row],
            amount_spike_flag: flag(FlagColumn::AmountSpike)?,
            risk_score: self.risk_scores()?[row],
        })
    }

    pub fn records(&self, rows: &[RowId]) -> ScoreResult<Vec<ScoredRecord>> {
        rows.iter().map(|&row| self.record(row)).collect()
    }
}

/// Timestamp layout for exports. Fractional seconds are written only
/// when present, so whole-second inputs round-trip unchanged.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Column order of [`ScoredRecord`] exports.
pub const SCORED_RECORD_FIELDS: [&str; 16] = [
    "row",
    "user_id",
    "device_id",
    "timestamp",
    "amount",
    "refund_flag",
    "hour",
    "txn_hour",
    "month",
    "high_freq_flag",
    "unusual_hour_flag",
    "refund_heavy_flag",
    "shared_device_flag",
    "avg_amount",
    "amount_spike_flag",
    "risk_score",
];

/// One output row: the original fields plus every derived column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub row: RowId,
    pub user_id: String,
    pub device_id: String,
    pub timestamp: String,
    pub amount: f64,
    pub refund_flag: u8,
    pub hour: u32,
    pub txn_hour: String,
    pub month: String,
    pub high_freq_flag: u8,
    pub unusual_hour_flag: u8,
    pub refund_heavy_flag: u8,
    pub shared_device_flag: u8,
    pub avg_amount: f64,
    pub amount_spike_flag: u8,
    pub risk_score: u32,
}
