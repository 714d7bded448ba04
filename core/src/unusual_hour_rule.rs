//! Unusual-Hour Rule.
//!
//! Per-row predicate: the transaction's hour of day falls inside the
//! configured closed window (02:00 to 04:59 by default). No grouping.

use crate::{
    config::UnusualHourConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    stage::PipelineStage,
};

pub struct UnusualHourRule {
    config: UnusualHourConfig,
}

impl UnusualHourRule {
    pub fn new(config: UnusualHourConfig) -> Self {
        Self { config }
    }
}

impl PipelineStage for UnusualHourRule {
    fn name(&self) -> &'static str {
        "unusual_hour"
    }

    fn flag_column(&self) -> Option<FlagColumn> {
        Some(FlagColumn::UnusualHour)
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let column = set
            .time_features()?
            .iter()
            .map(|t| self.config.contains(t.hour))
            .collect();
        Ok(set.with_flag(FlagColumn::UnusualHour, column))
    }
}
