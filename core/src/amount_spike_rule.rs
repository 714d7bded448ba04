//! Amount-Spike Rule.
//!
//! Adds `avg_amount`, the mean amount over all of the user's transactions
//! (the evaluated one included), and flags rows whose amount is strictly
//! greater than `multiplier * avg_amount`.

use crate::{
    config::AmountSpikeConfig,
    dataset::{FlagColumn, TransactionSet},
    error::ScoreResult,
    grouping::group_means,
    stage::PipelineStage,
};

pub struct AmountSpikeRule {
    config: AmountSpikeConfig,
}

impl AmountSpikeRule {
    pub fn new(config: AmountSpikeConfig) -> Self {
        Self { config }
    }
}

impl PipelineStage for AmountSpikeRule {
    fn name(&self) -> &'static str {
        "amount_spike"
    }

    fn flag_column(&self) -> Option<FlagColumn> {
        Some(FlagColumn::AmountSpike)
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let means = group_means(
            set.rows()
                .iter()
                .map(|txn| (txn.user_id.as_str(), txn.amount)),
        );

        let mut averages = Vec::with_capacity(set.len());
        let mut spikes = Vec::with_capacity(set.len());
        for txn in set.rows() {
            let avg = means.get(txn.user_id.as_str()).copied().unwrap_or(txn.amount);
            averages.push(avg);
            spikes.push(txn.amount > self.config.multiplier * avg);
        }

        Ok(set
            .with_avg_amounts(averages)
            .with_flag(FlagColumn::AmountSpike, spikes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{set_of, txn},
        transaction::Transaction,
    };

    fn amounts(user: &str, values: &[f64]) -> Vec<Transaction> {
        values
            .iter()
            .map(|&a| txn(user, "d", "2024-01-01 12:00:00", a, false))
            .collect()
    }

    fn run(rows: Vec<Transaction>) -> TransactionSet {
        AmountSpikeRule::new(AmountSpikeConfig::default())
            .apply(set_of(rows))
            .unwrap()
    }

    #[test]
    fn moderate_outlier_is_not_a_spike() {
        let set = run(amounts("u1", &[10.0, 10.0, 100.0]));
        assert_eq!(set.avg_amounts().unwrap(), &[40.0, 40.0, 40.0]);
        assert_eq!(set.flagged_count(FlagColumn::AmountSpike).unwrap(), 0);

        let set = run(amounts("u1", &[10.0, 10.0, 200.0]));
        assert_eq!(set.flagged_count(FlagColumn::AmountSpike).unwrap(), 0);
    }

    #[test]
    fn large_outlier_is_flagged_alone() {
        let set = run(amounts("u1", &[10.0, 10.0, 10.0, 200.0]));
        assert_eq!(set.avg_amounts().unwrap()[0], 57.5);
        assert_eq!(
            set.flag(FlagColumn::AmountSpike).unwrap(),
            &[false, false, false, true]
        );
    }

    #[test]
    fn single_transaction_never_spikes() {
        let set = run(amounts("solo", &[5000.0]));
        assert_eq!(set.flagged_count(FlagColumn::AmountSpike).unwrap(), 0);
    }

    #[test]
    fn averages_are_per_user() {
        let mut rows = amounts("u1", &[10.0, 10.0, 10.0, 200.0]);
        rows.extend(amounts("u2", &[200.0, 200.0]));
        let set = run(rows);
        assert_eq!(set.avg_amounts().unwrap()[4], 200.0);
        assert_eq!(set.flagged_rows(FlagColumn::AmountSpike).unwrap(), vec![3]);
    }
}
