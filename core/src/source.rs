//! CSV data source.
//!
//! The header is checked for every required column before any row is
//! read, so a missing column is a schema error rather than a per-row
//! failure. Extra columns are ignored.

use crate::{
    error::{ScoreError, ScoreResult},
    transaction::{RawTransaction, Transaction, REQUIRED_FIELDS},
};
use std::{fs::File, io::Read};

pub fn read_csv(path: &str) -> ScoreResult<Vec<Transaction>> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open {path}: {e}"))?;
    let rows = read_csv_from(file)?;
    log::info!("Loaded {} transactions from {path}", rows.len());
    Ok(rows)
}

pub fn read_csv_from<R: Read>(reader: R) -> ScoreResult<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for field in REQUIRED_FIELDS {
        if !headers.iter().any(|h| h == field) {
            return Err(ScoreError::schema(field));
        }
    }

    rdr.deserialize::<RawTransaction>()
        .enumerate()
        .map(|(row, record)| {
            let raw = record.map_err(|e| ScoreError::malformed(row, "unreadable record", e.to_string()))?;
            raw.validate(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_with_extra_columns() {
        let data = "transaction_id,user_id,device_id,timestamp,amount,refund_flag\n\
                    t1,u1,d1,2024-01-01 02:30:00,15.00,0\n\
                    t2,u2,d1,2024-01-01T14:00:00,1200,1\n";
        let rows = read_csv_from(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row, 1);
        assert_eq!(rows[1].user_id, "u2");
        assert!(rows[1].refund_flag);
    }

    #[test]
    fn missing_column_fails_before_rows() {
        let data = "user_id,device_id,timestamp,refund_flag\nu1,d1,not-a-date,0\n";
        match read_csv_from(data.as_bytes()) {
            Err(ScoreError::Schema { field }) => assert_eq!(field, "amount"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_row_aborts_the_load() {
        let data = "user_id,device_id,timestamp,amount,refund_flag\n\
                    u1,d1,2024-01-01 00:00:00,1,0\n\
                    u2,d1,2024-01-01 00:00:00,abc,0\n";
        match read_csv_from(data.as_bytes()) {
            Err(ScoreError::MalformedInput { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected malformed input, got {other:?}"),
        }
    }
}
