//! Time Feature Extractor.
//!
//! Derives the grouping keys every time-based rule reads:
//!   - `hour`     hour of day, 0..=23
//!   - `txn_hour` timestamp floored to the start of its hour
//!   - `month`    calendar year-month

use crate::{
    dataset::TransactionSet,
    error::{ScoreError, ScoreResult},
    stage::PipelineStage,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formats accepted for naive timestamps, tried in order.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp as written in transaction exports.
/// Offsets are dropped in favour of the written wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A calendar month, the refund-abuse grouping period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(ts: &NaiveDateTime) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFeatures {
    pub hour: u32,
    pub txn_hour: NaiveDateTime,
    pub month: YearMonth,
}

impl TimeFeatures {
    pub fn of(ts: &NaiveDateTime) -> Option<Self> {
        let txn_hour = ts.date().and_hms_opt(ts.hour(), 0, 0)?;
        Some(Self {
            hour: ts.hour(),
            txn_hour,
            month: YearMonth::of(ts),
        })
    }
}

pub struct TimeFeatureExtractor;

impl PipelineStage for TimeFeatureExtractor {
    fn name(&self) -> &'static str {
        "time_features"
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet> {
        let features = set
            .rows()
            .iter()
            .map(|txn| {
                TimeFeatures::of(&txn.timestamp).ok_or_else(|| {
                    ScoreError::malformed(
                        txn.row,
                        format!("user_id={}", txn.user_id),
                        format!("cannot bucket timestamp {}", txn.timestamp),
                    )
                })
            })
            .collect::<ScoreResult<Vec<_>>>()?;
        Ok(set.with_time_features(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn accepts_export_formats() {
        let expected = ts("2024-01-05 03:47:12");
        assert_eq!(ts("2024-01-05T03:47:12"), expected);
        assert_eq!(ts("2024-01-05 03:47:12.000"), expected);
        assert_eq!(ts("2024-01-05T03:47:12+05:00"), expected);
        assert_eq!(ts("2024-01-05 03:47").minute(), 47);
        assert_eq!(ts("2024-01-05").hour(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("05/01/2024 03:47").is_none());
        assert!(parse_timestamp("2024-13-01 00:00:00").is_none());
    }

    #[test]
    fn floors_to_hour_and_month() {
        let features = TimeFeatures::of(&ts("2024-02-29 23:59:59.999")).unwrap();
        assert_eq!(features.hour, 23);
        assert_eq!(features.txn_hour, ts("2024-02-29 23:00:00"));
        assert_eq!(features.month.to_string(), "2024-02");
    }
}
