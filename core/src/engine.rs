//! The scoring engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Time feature extractor  (hour, txn_hour, month)
//!   2. High-frequency rule     (high_freq_flag)
//!   3. Unusual-hour rule       (unusual_hour_flag)
//!   4. Refund-abuse rule       (refund_heavy_flag)
//!   5. Shared-device rule      (shared_device_flag)
//!   6. Amount-spike rule       (avg_amount, amount_spike_flag)
//!   7. Risk scorer             (risk_score)
//! followed by the high-risk selection.
//!
//! RULES:
//!   - Each stage receives the set returned by the previous one.
//!   - A failing stage aborts the run; nothing is persisted.
//!   - Persistence is one database transaction: all of it or none.
//!   - Every stage outcome is recorded as a PipelineEvent.

use crate::{
    amount_spike_rule::AmountSpikeRule,
    config::ScoringConfig,
    dataset::{FlagColumn, ScoredRecord, TransactionSet},
    error::ScoreResult,
    event::{EventLogEntry, PipelineEvent},
    high_frequency_rule::HighFrequencyRule,
    refund_abuse_rule::RefundAbuseRule,
    risk_scorer::{HighRiskSelection, HighRiskSelector, RiskScorer},
    shared_device_rule::SharedDeviceRule,
    sink::{RecordSink, Subset},
    stage::PipelineStage,
    store::ScoreStore,
    time_features::TimeFeatureExtractor,
    transaction::Transaction,
    types::RunId,
    unusual_hour_rule::UnusualHourRule,
};

/// Stage name used for events the engine emits itself.
const ENGINE_STAGE: &str = "engine";

pub struct ScoringEngine {
    pub run_id: RunId,
    /// Seed recorded with the run; 0 for runs over a file export.
    pub seed: u64,
    pub config: ScoringConfig,
    stages: Vec<Box<dyn PipelineStage>>,
    selector: HighRiskSelector,
    pub store: Option<ScoreStore>,
}

/// An event together with the stage that emitted it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub stage: &'static str,
    pub event: PipelineEvent,
}

pub struct ScoringOutcome {
    pub run_id: RunId,
    pub set: TransactionSet,
    pub high_risk: HighRiskSelection,
    pub events: Vec<RecordedEvent>,
}

impl ScoringEngine {
    /// An engine with no stages registered.
    pub fn new(run_id: RunId, config: ScoringConfig) -> Self {
        let selector = HighRiskSelector::new(config.high_risk_threshold);
        Self {
            run_id,
            seed: 0,
            config,
            stages: Vec::new(),
            selector,
            store: None,
        }
    }

    /// Build a fully wired engine with all stages registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, config: ScoringConfig) -> ScoreResult<Self> {
        config.validate()?;
        let mut engine = ScoringEngine::new(run_id, config.clone());

        // Execution order is fixed.
        engine.register(Box::new(TimeFeatureExtractor));
        engine.register(Box::new(HighFrequencyRule::new(config.high_frequency.clone())));
        engine.register(Box::new(UnusualHourRule::new(config.unusual_hours.clone())));
        engine.register(Box::new(RefundAbuseRule::new(config.refund_abuse.clone())));
        engine.register(Box::new(SharedDeviceRule::new(config.shared_device.clone())));
        engine.register(Box::new(AmountSpikeRule::new(config.amount_spike.clone())));
        engine.register(Box::new(RiskScorer::new(config)));
        Ok(engine)
    }

    /// Attach a results database. Scores, the mirror and the event log
    /// are written to it at the end of each successful run.
    pub fn with_store(mut self, store: ScoreStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, stage: Box<dyn PipelineStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `transactions`, then select high-risk rows.
    pub fn run(&self, transactions: Vec<Transaction>) -> ScoreResult<ScoringOutcome> {
        let mut events = vec![RecordedEvent {
            stage: ENGINE_STAGE,
            event: PipelineEvent::RunInitialized {
                run_id: self.run_id.clone(),
                rows: transactions.len(),
            },
        }];

        let mut set = TransactionSet::new(transactions);
        for stage in &self.stages {
            let had_scores = set.risk_scores().is_ok();
            set = stage.apply(set)?;
            events.extend(stage_events(stage.as_ref(), &set, had_scores)?);
        }

        let high_risk = self.selector.select(&set)?;
        log::info!(
            "run={} flagged {} high-risk users across {} transactions (score >= {})",
            self.run_id,
            high_risk.distinct_users,
            high_risk.rows.len(),
            high_risk.threshold
        );
        events.push(RecordedEvent {
            stage: ENGINE_STAGE,
            event: PipelineEvent::HighRiskSelected {
                threshold: high_risk.threshold,
                transactions: high_risk.rows.len(),
                users: high_risk.distinct_users,
            },
        });

        let outcome = ScoringOutcome {
            run_id: self.run_id.clone(),
            set,
            high_risk,
            events,
        };
        if let Some(store) = &self.store {
            self.persist(store, &outcome)?;
        }
        Ok(outcome)
    }

    fn persist(&self, store: &ScoreStore, outcome: &ScoringOutcome) -> ScoreResult<()> {
        let entries = outcome
            .events
            .iter()
            .enumerate()
            .map(|(seq, recorded)| -> ScoreResult<EventLogEntry> {
                Ok(EventLogEntry {
                    id: None,
                    run_id: self.run_id.clone(),
                    seq: seq as u64,
                    stage: recorded.stage.to_string(),
                    event_type: recorded.event.type_name().to_string(),
                    payload: serde_json::to_string(&recorded.event)?,
                })
            })
            .collect::<ScoreResult<Vec<_>>>()?;
        store.persist_run(&self.run_id, self.seed, &outcome.set, &outcome.records()?, &entries)?;
        log::debug!("run={} persisted {} events", self.run_id, entries.len());
        Ok(())
    }
}

/// Events describing what `stage` just added to `set`.
fn stage_events(
    stage: &dyn PipelineStage,
    set: &TransactionSet,
    had_scores: bool,
) -> ScoreResult<Vec<RecordedEvent>> {
    let name = stage.name();
    let mut events = Vec::new();

    match stage.flag_column() {
        Some(column) => {
            let flagged = set.flagged_count(column)?;
            if flagged == 0 {
                log::warn!("Rule '{name}' flagged no transactions");
                events.push(RecordedEvent {
                    stage: name,
                    event: PipelineEvent::EmptyResult { rule: name.to_string() },
                });
            } else {
                log::info!("Rule '{name}' flagged {flagged} of {} transactions", set.len());
            }
            events.push(RecordedEvent {
                stage: name,
                event: PipelineEvent::RuleApplied {
                    rule: name.to_string(),
                    column: column.column_name().to_string(),
                    flagged,
                },
            });
        }
        None => {
            events.push(RecordedEvent {
                stage: name,
                event: PipelineEvent::StageCompleted { stage: name.to_string() },
            });
        }
    }

    if let Ok(scores) = set.risk_scores() {
        if !had_scores && !set.is_empty() {
            let max_score = scores.iter().copied().max().unwrap_or(0);
            let mean_score = scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64;
            events.push(RecordedEvent {
                stage: name,
                event: PipelineEvent::ScoringCompleted { max_score, mean_score },
            });
        }
    }
    Ok(events)
}

impl ScoringOutcome {
    /// Every row, fully enriched, in input order.
    pub fn records(&self) -> ScoreResult<Vec<ScoredRecord>> {
        let all: Vec<_> = (0..self.set.len()).collect();
        self.set.records(&all)
    }

    /// One subset per rule that ran, then the high-risk selection.
    pub fn subsets(&self) -> ScoreResult<Vec<(Subset, Vec<ScoredRecord>)>> {
        let mut out = Vec::new();
        for column in FlagColumn::ALL {
            if self.set.has_flag(column) {
                let rows = self.set.flagged_rows(column)?;
                out.push((Subset::for_flag(column), self.set.records(&rows)?));
            }
        }
        out.push((Subset::HighRisk, self.set.records(&self.high_risk.rows)?));
        Ok(out)
    }

    pub fn write_to(&self, sink: &mut dyn RecordSink) -> ScoreResult<()> {
        for (subset, records) in self.subsets()? {
            sink.write_subset(subset, &records)?;
        }
        Ok(())
    }
}
