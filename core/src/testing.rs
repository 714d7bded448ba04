//! Builders shared by unit tests.

use crate::{dataset::TransactionSet, time_features::parse_timestamp, transaction::Transaction};

pub fn txn(user: &str, device: &str, timestamp: &str, amount: f64, refund: bool) -> Transaction {
    Transaction {
        row: 0,
        user_id: user.into(),
        device_id: device.into(),
        timestamp: parse_timestamp(timestamp).unwrap(),
        amount,
        refund_flag: refund,
    }
}

pub fn set_of(rows: Vec<Transaction>) -> TransactionSet {
    TransactionSet::new(rows)
}
