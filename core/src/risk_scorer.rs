//! Risk Scorer and High-Risk Selector.
//!
//! The score is an additive heuristic, not a probability:
//!
//! ```text
//! risk_score = unusual_hour    (2)  hour in the suspicious window
//!            + refund          (3)  raw refund_flag == 1
//!            + large_amount    (2)  amount > large_amount_threshold
//!            + shared_device   (2)  shared_device_flag == 1
//!            + high_frequency  (3)  high_freq_flag == 1
//!            + amount_spike    (2)  amount_spike_flag == 1
//! ```
//!
//! Each score depends only on its own row once the flags exist, and is
//! recomputed from scratch on every run.

use crate::{
    config::ScoringConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    stage::PipelineStage,
    transaction::Transaction,
    types::RowId,
};
use serde::Serialize;

/// The flags one row contributes to its score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowSignals {
    pub unusual_hour: bool,
    pub refund: bool,
    pub large_amount: bool,
    pub shared_device: bool,
    pub high_frequency: bool,
    pub amount_spike: bool,
}

pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Weighted sum for one row.
    pub fn score(&self, signals: &RowSignals) -> u32 {
        let w = &self.config.weights;
        [
            (signals.unusual_hour,   w.unusual_hour),
            (signals.refund,         w.refund),
            (signals.large_amount,   w.large_amount),
            (signals.shared_device,  w.shared_device),
            (signals.high_frequency, w.high_frequency),
            (signals.amount_spike,   w.amount_spike),
        ]
        .into_iter()
        .filter(|&(set, _)| set)
        .fold(0u32, |score, (_, weight)| score.saturating_add(weight))
    }

    fn signals(&self, txn: &Transaction, hour: u32, flags: &RowFlags<'_>, row: RowId) -> RowSignals {
        RowSignals {
            unusual_hour: self.config.unusual_hours.contains(hour),
            refund: txn.refund_flag,
            large_amount: txn.amount > self.config.large_amount_threshold,
            shared_device: flags.shared_device[row],
            high_frequency: flags.high_frequency[row],
            amount_spike: flags.amount_spike[row],
        }
    }
}

struct RowFlags<'a> {
    shared_device: &'a [bool],
    high_frequency: &'a [bool],
    amount_spike: &'a [bool],
}

impl PipelineStage for RiskScorer {
    fn name(&self) -> &'static str {
        "risk_score"
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        // Resolve every input column before scoring a single row.
        let time = set.time_features()?;
        let flags = RowFlags {
            shared_device: set.flag(FlagColumn::SharedDevice)?,
            high_frequency: set.flag(FlagColumn::HighFrequency)?,
            amount_spike: set.flag(FlagColumn::AmountSpike)?,
        };

        let scores = set
            .rows()
            .iter()
            .enumerate()
            .map(|(row, txn)| self.score(&self.signals(txn, time[row].hour, &flags, row)))
            .collect();
        Ok(set.with_risk_scores(scores))
    }
}

// ── High-risk selection ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighRiskSelection {
    pub threshold: u32,
    /// Selected rows, in input order.
    pub rows: Vec<RowId>,
    pub distinct_users: usize,
}

pub struct HighRiskSelector {
    threshold: u32,
}

impl HighRiskSelector {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Rows scoring at or above the threshold.
    pub fn select(&self, set: &TransactionSet) -> ScoreResult<HighRiskSelection> {
        let rows: Vec<RowId> = set
            .risk_scores()?
            .iter()
            .enumerate()
            .filter_map(|(row, &score)| (score >= self.threshold).then_some(row))
            .collect();
        let distinct_users = set.distinct_users(&rows);
        Ok(HighRiskSelection {
            threshold: self.threshold,
            rows,
            distinct_users,
        })
    }
}
