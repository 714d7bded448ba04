//! Pipeline events: the audit trail of a scoring run.
//!
//! Every stage reports what it did as events. The engine returns them to
//! the caller and, when a store is attached, appends them to the event log.

use crate::types::RunId;
use serde::{Deserialize, Serialize};

/// Variants are append-only; the tag is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunInitialized {
        run_id: RunId,
        rows: usize,
    },
    StageCompleted {
        stage: String,
    },
    RuleApplied {
        rule: String,
        column: String,
        flagged: usize,
    },
    /// A rule matched nothing. Reportable, never an error.
    EmptyResult {
        rule: String,
    },
    ScoringCompleted {
        max_score: u32,
        mean_score: f64,
    },
    HighRiskSelected {
        threshold: u32,
        transactions: usize,
        users: usize,
    },
}

impl PipelineEvent {
    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            PipelineEvent::RunInitialized { .. }   => "run_initialized",
            PipelineEvent::StageCompleted { .. }   => "stage_completed",
            PipelineEvent::RuleApplied { .. }      => "rule_applied",
            PipelineEvent::EmptyResult { .. }      => "empty_result",
            PipelineEvent::ScoringCompleted { .. } => "scoring_completed",
            PipelineEvent::HighRiskSelected { .. } => "high_risk_selected",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    /// Position of the event within its run.
    pub seq: u64,
    pub stage: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized PipelineEvent
}
