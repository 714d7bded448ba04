//! The typed transaction record and its ingestion-time validation.

use crate::{
    error::{ScoreError, ScoreResult},
    time_features::parse_timestamp,
    types::{DeviceId, RowId, UserId},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Input columns every source must provide.
pub const REQUIRED_FIELDS: [&str; 5] = ["user_id", "device_id", "timestamp", "amount", "refund_flag"];

/// One validated transaction. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub row: RowId,
    pub user_id: UserId,
    pub device_id: DeviceId,
    pub timestamp: NaiveDateTime,
    pub amount: f64,
    pub refund_flag: bool,
}

/// A record as it arrives from a columnar source, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub user_id: String,
    pub device_id: String,
    pub timestamp: String,
    pub amount: String,
    pub refund_flag: String,
}

impl RawTransaction {
    /// Validate every field and produce a typed record.
    /// `row` is the 0-based data row the record was read from.
    pub fn validate(self, row: RowId) -> ScoreResult<Transaction> {
        let user_id = self.user_id.trim().to_string();
        let device_id = self.device_id.trim().to_string();
        let record = format!("user_id={user_id}");

        if user_id.is_empty() {
            return Err(ScoreError::malformed(row, record, "empty user_id"));
        }
        if device_id.is_empty() {
            return Err(ScoreError::malformed(row, record, "empty device_id"));
        }

        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| {
            ScoreError::malformed(
                row,
                record.clone(),
                format!("unparsable timestamp '{}'", self.timestamp),
            )
        })?;

        let amount: f64 = self.amount.trim().parse().map_err(|_| {
            ScoreError::malformed(
                row,
                record.clone(),
                format!("non-numeric amount '{}'", self.amount),
            )
        })?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ScoreError::malformed(
                row,
                record,
                format!("amount must be finite and non-negative, got {amount}"),
            ));
        }

        let refund_flag = parse_refund_flag(&self.refund_flag).ok_or_else(|| {
            ScoreError::malformed(
                row,
                record.clone(),
                format!("refund_flag must be 0 or 1, got '{}'", self.refund_flag),
            )
        })?;

        Ok(Transaction {
            row,
            user_id,
            device_id,
            timestamp,
            amount,
            refund_flag,
        })
    }
}

fn parse_refund_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}
