//! Synthetic transaction datasets.
//!
//! Produces a reproducible dataset for dry runs and tests: background
//! activity plus a handful of planted patterns, one per detection rule.
//! The same (seed, users, rows) always yields the same rows.

use crate::{
    error::{ScoreError, ScoreResult},
    rng::{RngStream, StreamRng},
    transaction::Transaction,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const DAYS_COVERED: u64 = 90;
const SHARED_POOL_DEVICES: usize = 20;
const REFUND_PROBABILITY: f64 = 0.03;
const MAX_BASELINE_AMOUNT: f64 = 5000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthSpec {
    pub seed: u64,
    pub users: usize,
    /// Background transactions. Planted patterns are added on top.
    pub rows: usize,
}

pub fn generate(spec: SynthSpec) -> ScoreResult<Vec<Transaction>> {
    if spec.users == 0 {
        return Err(ScoreError::InvalidConfig(
            "synthetic dataset needs at least one user".into(),
        ));
    }
    let epoch = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid synthetic epoch"))?;

    let mut out = Vec::with_capacity(spec.rows + spec.users / 5);
    baseline(&spec, epoch, &mut out);
    bursts(&spec, epoch, &mut out);
    refund_runs(&spec, epoch, &mut out);
    shared_device(&spec, epoch, &mut out);
    spikes(&spec, epoch, &mut out);

    for (row, txn) in out.iter_mut().enumerate() {
        txn.row = row;
    }
    log::debug!("Generated {} synthetic transactions for {} users", out.len(), spec.users);
    Ok(out)
}

fn user_id(index: usize) -> String {
    format!("u-{index:06}")
}

fn own_device(index: usize) -> String {
    format!("dev-{index:06}")
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn push(out: &mut Vec<Transaction>, user: usize, device: String, ts: NaiveDateTime, amount: f64, refund: bool) {
    out.push(Transaction {
        row: 0,
        user_id: user_id(user),
        device_id: device,
        timestamp: ts,
        amount: cents(amount),
        refund_flag: refund,
    });
}

fn random_instant(rng: &mut StreamRng, epoch: NaiveDateTime) -> NaiveDateTime {
    let secs = rng.next_u64_below(DAYS_COVERED * 86_400);
    epoch + Duration::seconds(secs as i64)
}

fn baseline(spec: &SynthSpec, epoch: NaiveDateTime, out: &mut Vec<Transaction>) {
    let mut rng = StreamRng::new(spec.seed, RngStream::Baseline);
    for _ in 0..spec.rows {
        let user = rng.index_below(spec.users);
        let device = if rng.chance(0.9) {
            own_device(user)
        } else {
            format!("dev-pool-{:02}", rng.index_below(SHARED_POOL_DEVICES))
        };
        let ts = random_instant(&mut rng, epoch);
        let amount = rng.pareto(15.0, 1.8).min(MAX_BASELINE_AMOUNT);
        let refund = rng.chance(REFUND_PROBABILITY);
        push(out, user, device, ts, amount, refund);
    }
}

/// Seven transactions inside one hour.
fn bursts(spec: &SynthSpec, epoch: NaiveDateTime, out: &mut Vec<Transaction>) {
    let mut rng = StreamRng::new(spec.seed, RngStream::Bursts);
    for _ in 0..(spec.users / 50).max(1) {
        let user = rng.index_below(spec.users);
        let start = random_instant(&mut rng, epoch);
        let hour_start = start - Duration::seconds(start.and_utc().timestamp() % 3600);
        for i in 0..7 {
            let ts = hour_start + Duration::minutes(i * 8);
            let amount = rng.pareto(20.0, 2.0).min(MAX_BASELINE_AMOUNT);
            push(out, user, own_device(user), ts, amount, false);
        }
    }
}

/// Five refunds inside one calendar month.
fn refund_runs(spec: &SynthSpec, epoch: NaiveDateTime, out: &mut Vec<Transaction>) {
    let mut rng = StreamRng::new(spec.seed, RngStream::Refunds);
    for _ in 0..(spec.users / 100).max(1) {
        let user = rng.index_below(spec.users);
        let month_start = epoch + Duration::days(31 * rng.next_u64_below(3) as i64);
        for day in 0..5 {
            let ts = month_start + Duration::days(day * 4) + Duration::hours(rng.next_u64_below(24) as i64);
            let amount = rng.pareto(30.0, 1.5).min(MAX_BASELINE_AMOUNT);
            push(out, user, own_device(user), ts, amount, true);
        }
    }
}

/// One device used by six consecutive users (distinct when there are six or more).
fn shared_device(spec: &SynthSpec, epoch: NaiveDateTime, out: &mut Vec<Transaction>) {
    let mut rng = StreamRng::new(spec.seed, RngStream::SharedDevices);
    let first = rng.index_below(spec.users);
    for k in 0..6 {
        let user = (first + k) % spec.users;
        let ts = random_instant(&mut rng, epoch);
        let amount = rng.pareto(15.0, 1.8).min(MAX_BASELINE_AMOUNT);
        push(out, user, "dev-shared-00".into(), ts, amount, false);
    }
}

/// A large purchase well above the user's usual spend.
fn spikes(spec: &SynthSpec, epoch: NaiveDateTime, out: &mut Vec<Transaction>) {
    let mut rng = StreamRng::new(spec.seed, RngStream::Spikes);
    for _ in 0..(spec.users / 50).max(1) {
        let user = rng.index_below(spec.users);
        for _ in 0..4 {
            let ts = random_instant(&mut rng, epoch);
            push(out, user, own_device(user), ts, 10.0 + rng.next_f64() * 5.0, false);
        }
        let ts = random_instant(&mut rng, epoch);
        push(out, user, own_device(user), ts, 1500.0 + rng.next_f64() * 1000.0, false);
    }
}
