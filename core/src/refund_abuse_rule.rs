//! Refund-Abuse Rule.
//!
//! Counts refund transactions per (user, calendar month). When a pair
//! holds more than `max_refunds_per_month` refunds, EVERY transaction of
//! that user in that month is flagged, refund or not.

use crate::{
    config::RefundAbuseConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    grouping::{group_counts, keys_where},
    stage::PipelineStage,
};

pub struct RefundAbuseRule {
    config: RefundAbuseConfig,
}

impl RefundAbuseRule {
    pub fn new(config: RefundAbuseConfig) -> Self {
        Self { config }
    }
}

impl PipelineStage for RefundAbuseRule {
    fn name(&self) -> &'static str {
        "refund_abuse"
    }

    fn flag_column(&self) -> Option<FlagColumn> {
        Some(FlagColumn::RefundHeavy)
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let time = set.time_features()?;
        let keys: Vec<_> = set
            .rows()
            .iter()
            .zip(time)
            .map(|(txn, t)| (txn.user_id.as_str(), t.month))
            .collect();

        let refund_keys = set
            .rows()
            .iter()
            .zip(&keys)
            .filter(|(txn, _)| txn.refund_flag)
            .map(|(_, key)| *key);

        let threshold = self.config.max_refunds_per_month;
        let heavy = keys_where(group_counts(refund_keys), |n| n > threshold);
        let column = keys.iter().map(|key| heavy.contains(key)).collect();

        Ok(set.with_flag(FlagColumn::RefundHeavy, column))
    }
}
