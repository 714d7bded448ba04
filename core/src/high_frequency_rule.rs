//! High-Frequency Rule.
//!
//! Flags every transaction in a (user, hour bucket) group holding more
//! than `max_txns_per_hour` transactions. The comparison is strict: a
//! bucket at exactly the threshold stays clean.

use crate::{
    config::HighFrequencyConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    grouping::{group_counts, keys_where},
    stage::PipelineStage,
};

pub struct HighFrequencyRule {
    config: HighFrequencyConfig,
}

impl HighFrequencyRule {
    pub fn new(config: HighFrequencyConfig) -> Self {
        Self { config }
    }
}

impl PipelineStage for HighFrequencyRule {
    fn name(&self) -> &'static str {
        "high_frequency"
    }

    fn flag_column(&self) -> Option<FlagColumn> {
        Some(FlagColumn::HighFrequency)
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let time = set.time_features()?;
        let keys: Vec<_> = set
            .rows()
            .iter()
            .zip(time)
            .map(|(txn, t)| (txn.user_id.as_str(), t.txn_hour))
            .collect();

        let threshold = self.config.max_txns_per_hour;
        let busy = keys_where(group_counts(keys.iter().copied()), |n| n > threshold);
        let column = keys.iter().map(|key| busy.contains(key)).collect();

        Ok(set.with_flag(FlagColumn::HighFrequency, column))
    }
}
