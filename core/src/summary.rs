//! End-of-run summary for operators.

use crate::{
    dataset::FlagColumn,
    engine::ScoringOutcome,
    error::ScoreResult,
};
use serde::Serialize;
use std::{collections::HashSet, fmt};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub column: &'static str,
    pub flagged_transactions: usize,
    pub flagged_users: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total_transactions: usize,
    pub total_users: usize,
    /// Transaction count per hour of day.
    pub hourly_volume: [usize; 24],
    pub rules: Vec<RuleSummary>,
    pub high_risk_threshold: u32,
    pub high_risk_transactions: usize,
    pub high_risk_users: usize,
}

impl RunSummary {
    pub fn from_outcome(outcome: &ScoringOutcome) -> ScoreResult<Self> {
        let set = &outcome.set;

        let mut hourly_volume = [0usize; 24];
        for t in set.time_features()? {
            hourly_volume[t.hour as usize] += 1;
        }

        let rules = FlagColumn::ALL
            .into_iter()
            .filter(|&column| set.has_flag(column))
            .map(|column| {
                let rows = set.flagged_rows(column)?;
                Ok(RuleSummary {
                    column: column.column_name(),
                    flagged_transactions: rows.len(),
                    flagged_users: set.distinct_users(&rows),
                })
            })
            .collect::<ScoreResult<Vec<_>>>()?;

        let total_users = set
            .rows()
            .iter()
            .map(|t| t.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        Ok(Self {
            run_id: outcome.run_id.clone(),
            total_transactions: set.len(),
            total_users,
            hourly_volume,
            rules,
            high_risk_threshold: outcome.high_risk.threshold,
            high_risk_transactions: outcome.high_risk.rows.len(),
            high_risk_users: outcome.high_risk.distinct_users,
        })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== RUN SUMMARY ===")?;
        writeln!(f, "  run_id:        {}", self.run_id)?;
        writeln!(f, "  transactions:  {}", self.total_transactions)?;
        writeln!(f, "  users:         {}", self.total_users)?;
        writeln!(f)?;
        writeln!(f, "=== RULES ===")?;
        for rule in &self.rules {
            writeln!(
                f,
                "  {:<20} {:>7} txns | {:>6} users",
                rule.column, rule.flagged_transactions, rule.flagged_users
            )?;
        }
        writeln!(f)?;
        writeln!(f, "=== HOURLY VOLUME ===")?;
        for (hour, count) in self.hourly_volume.iter().enumerate() {
            writeln!(f, "  {hour:02}:00  {count}")?;
        }
        writeln!(f)?;
        write!(
            f,
            "flagged {} high-risk users with risk scores >= {} ({} transactions)",
            self.high_risk_users, self.high_risk_threshold, self.high_risk_transactions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ScoringConfig,
        engine::ScoringEngine,
        testing::txn,
    };

    #[test]
    fn counts_rules_hours_and_high_risk_users() {
        let rows = vec![
            txn("a", "d1", "2024-01-01 03:00:00", 1500.0, true),
            txn("a", "d1", "2024-01-01 03:30:00", 20.0, false),
            txn("b", "d2", "2024-01-01 12:00:00", 20.0, false),
        ]
        .into_iter()
        .enumerate()
        .map(|(row, mut t)| {
            t.row = row;
            t
        })
        .collect();
        let engine = ScoringEngine::build("summary".into(), ScoringConfig::default()).unwrap();
        let summary = RunSummary::from_outcome(&engine.run(rows).unwrap()).unwrap();

        assert_eq!(summary.total_transactions, 3);
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.hourly_volume[3], 2);
        assert_eq!(summary.hourly_volume[12], 1);
        assert_eq!(summary.rules.len(), 5);

        let unusual = summary
            .rules
            .iter()
            .find(|r| r.column == "unusual_hour_flag")
            .unwrap();
        assert_eq!((unusual.flagged_transactions, unusual.flagged_users), (2, 1));

        assert_eq!(summary.high_risk_transactions, 1);
        assert_eq!(summary.high_risk_users, 1);
        assert!(summary.to_string().ends_with("flagged 1 high-risk users with risk scores >= 5 (1 transactions)"));
    }
}
