//! Risk scorer and high-risk selector, end to end.

mod common;

use common::{engine, score, txn};
use riskscore_core::{
    config::ScoringConfig,
    engine::ScoringEngine,
    error::ScoreError,
    event::PipelineEvent,
};

/// hour=3, refund, amount 1500, shared device, nothing else: 2+3+2+2 = 9.
#[test]
fn documented_combination_scores_nine() {
    let mut rows = vec![txn("u0", "shared", "2024-06-01 03:10:00", 1500.0, true)];
    for u in 1..5 {
        rows.push(txn(&format!("u{u}"), "shared", "2024-06-01 12:00:00", 10.0, false));
    }
    let records = score(rows).records().unwrap();

    let target = &records[0];
    assert_eq!(target.hour, 3);
    assert_eq!(target.shared_device_flag, 1);
    assert_eq!(target.high_freq_flag, 0);
    assert_eq!(target.amount_spike_flag, 0);
    assert_eq!(target.risk_score, 9);
    assert_eq!(records[1].risk_score, 2);
}

#[test]
fn every_signal_at_once_scores_fourteen() {
    let mut rows = Vec::new();
    for minute in 0..5 {
        rows.push(txn("x", "shared", &format!("2024-06-01 03:{:02}:00", minute * 10), 10.0, false));
    }
    rows.push(txn("x", "shared", "2024-06-01 03:55:00", 2000.0, true));
    for u in 1..5 {
        rows.push(txn(&format!("u{u}"), "shared", "2024-06-02 12:00:00", 10.0, false));
    }
    let records = score(rows).records().unwrap();
    assert_eq!(records[5].risk_score, 14);
    assert_eq!(records[0].risk_score, 2 + 2 + 3);
}

#[test]
fn selector_boundary_is_inclusive() {
    let rows = vec![
        // unusual hour + refund = 5
        txn("five", "d5", "2024-06-01 03:00:00", 10.0, true),
        // unusual hour + large amount = 4
        txn("four", "d4", "2024-06-01 03:00:00", 1500.0, false),
        txn("five", "d5", "2024-06-01 13:00:00", 10.0, false),
    ];
    let outcome = score(rows);
    let scores = outcome.set.risk_scores().unwrap();
    assert_eq!(&scores[..2], &[5, 4]);
    assert_eq!(outcome.high_risk.rows, vec![0]);
    assert_eq!(outcome.high_risk.distinct_users, 1);

    let selected = outcome
        .events
        .iter()
        .find_map(|e| match &e.event {
            PipelineEvent::HighRiskSelected { transactions, users, .. } => Some((*transactions, *users)),
            _ => None,
        })
        .unwrap();
    assert_eq!(selected, (1, 1));
}

#[test]
fn custom_threshold_is_honoured() {
    let config = ScoringConfig {
        high_risk_threshold: 4,
        ..ScoringConfig::default()
    };
    let engine = ScoringEngine::build("threshold-4".into(), config).unwrap();
    let outcome = engine
        .run(vec![txn("four", "d4", "2024-06-01 03:00:00", 1500.0, false)])
        .unwrap();
    assert_eq!(outcome.high_risk.rows, vec![0]);
}

#[test]
fn stages_run_in_documented_order() {
    assert_eq!(
        engine("order").stage_names(),
        vec![
            "time_features",
            "high_frequency",
            "unusual_hour",
            "refund_abuse",
            "shared_device",
            "amount_spike",
            "risk_score",
        ]
    );
}

/// A pipeline missing a rule stage cannot score.
#[test]
fn scorer_without_rules_is_a_schema_error() {
    use riskscore_core::{risk_scorer::RiskScorer, time_features::TimeFeatureExtractor};

    let mut engine = ScoringEngine::new("partial".into(), ScoringConfig::default());
    engine.register(Box::new(TimeFeatureExtractor));
    engine.register(Box::new(RiskScorer::new(ScoringConfig::default())));
    let err = engine
        .run(vec![txn("u", "d", "2024-01-01 00:00:00", 1.0, false)])
        .err()
        .expect("scoring must fail");
    assert!(matches!(err, ScoreError::Schema { .. }), "got {err:?}");
}

#[test]
fn invalid_config_is_rejected_at_build() {
    let mut config = ScoringConfig::default();
    config.amount_spike.multiplier = 0.0;
    assert!(ScoringEngine::build("bad".into(), config).is_err());
}

#[test]
fn empty_input_scores_nothing() {
    let outcome = score(Vec::new());
    assert!(outcome.set.is_empty());
    assert!(outcome.high_risk.rows.is_empty());
    assert_eq!(outcome.high_risk.distinct_users, 0);
}

#[test]
fn overflowing_weights_are_rejected_at_build() {
    let mut config = ScoringConfig::default();
    config.weights.refund = u32::MAX;
    let err = ScoringEngine::build("overflow".into(), config).err().expect("must reject");
    assert!(matches!(err, ScoreError::InvalidConfig(_)), "got {err:?}");
}
