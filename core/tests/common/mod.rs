#![allow(dead_code)]

use riskscore_core::{
    config::ScoringConfig,
    engine::{ScoringEngine, ScoringOutcome},
    time_features::parse_timestamp,
    transaction::Transaction,
};

pub fn txn(user: &str, device: &str, timestamp: &str, amount: f64, refund: bool) -> Transaction {
    Transaction {
        row: 0,
        user_id: user.into(),
        device_id: device.into(),
        timestamp: parse_timestamp(timestamp).expect("test timestamp"),
        amount,
        refund_flag: refund,
    }
}

pub fn engine(run_id: &str) -> ScoringEngine {
    ScoringEngine::build(run_id.into(), ScoringConfig::default()).expect("default config")
}

pub fn score(rows: Vec<Transaction>) -> ScoringOutcome {
    engine("test-run").run(rows).expect("pipeline run")
}
