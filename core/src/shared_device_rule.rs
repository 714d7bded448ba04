//! Shared-Device Rule.
//!
//! Flags every transaction on a device used by at least
//! `min_unique_users` distinct users (inclusive).

use crate::{
    config::SharedDeviceConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    grouping::{distinct_counts, keys_where},
    stage::PipelineStage,
};

pub struct SharedDeviceRule {
    config: SharedDeviceConfig,
}

impl SharedDeviceRule {
    pub fn new(config: SharedDeviceConfig) -> Self {
        Self { config }
    }
}

impl PipelineStage for SharedDeviceRule {
    fn name(&self) -> &'static str {
        "shared_device"
    }

    fn flag_column(&self) -> Option<FlagColumn> {
        Some(FlagColumn::SharedDevice)
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let users_per_device = distinct_counts(
            set.rows()
                .iter()
                .map(|txn| (txn.device_id.as_str(), txn.user_id.as_str())),
        );
        let min_users = self.config.min_unique_users;
        let shared = keys_where(users_per_device, |n| n >= min_users);

        let column = set
            .rows()
            .iter()
            .map(|txn| shared.contains(txn.device_id.as_str()))
            .collect();
        Ok(set.with_flag(FlagColumn::SharedDevice, column))
    }
}
