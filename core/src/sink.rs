//! Output sinks for flagged subsets.

use crate::{
    dataset::{FlagColumn, ScoredRecord, SCORED_RECORD_FIELDS},
    error::ScoreResult,
};
use std::{
    collections::BTreeMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

/// A named output subset. One per rule plus the final selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subset {
    HighFrequency,
    UnusualHour,
    RefundHeavy,
    SharedDevice,
    AmountSpike,
    HighRisk,
}

impl Subset {
    pub fn for_flag(column: FlagColumn) -> Self {
        match column {
            FlagColumn::HighFrequency => Subset::HighFrequency,
            FlagColumn::UnusualHour   => Subset::UnusualHour,
            FlagColumn::RefundHeavy   => Subset::RefundHeavy,
            FlagColumn::SharedDevice  => Subset::SharedDevice,
            FlagColumn::AmountSpike   => Subset::AmountSpike,
        }
    }

    /// Stable identifier; also the file stem for directory sinks.
    pub fn name(self) -> &'static str {
        match self {
            Subset::HighFrequency => "high_frequency_users",
            Subset::UnusualHour   => "unusual_time_transactions",
            Subset::RefundHeavy   => "refund_heavy_users",
            Subset::SharedDevice  => "shared_device_users",
            Subset::AmountSpike   => "amount_spike_users",
            Subset::HighRisk      => "high_risk_users",
        }
    }
}

pub trait RecordSink {
    fn write_subset(&mut self, subset: Subset, records: &[ScoredRecord]) -> ScoreResult<()>;
}

/// Serialize records as CSV. The header is written even for an empty subset.
pub fn write_csv<W: Write>(writer: W, records: &[ScoredRecord]) -> ScoreResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(SCORED_RECORD_FIELDS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `<dir>/<subset>.csv`, creating the directory if needed.
pub struct CsvDirSink {
    dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl AsRef<Path>) -> ScoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, subset: Subset) -> PathBuf {
        self.dir.join(format!("{}.csv", subset.name()))
    }
}

impl RecordSink for CsvDirSink {
    fn write_subset(&mut self, subset: Subset, records: &[ScoredRecord]) -> ScoreResult<()> {
        let path = self.path_for(subset);
        write_csv(File::create(&path)?, records)?;
        log::info!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// Keeps the CSV text of each subset in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub subsets: BTreeMap<Subset, String>,
}

impl RecordSink for MemorySink {
    fn write_subset(&mut self, subset: Subset, records: &[ScoredRecord]) -> ScoreResult<()> {
        let mut buf = Vec::new();
        write_csv(&mut buf, records)?;
        let text = String::from_utf8(buf).map_err(|e| anyhow::anyhow!("non-UTF-8 CSV output: {e}"))?;
        self.subsets.insert(subset, text);
        Ok(())
    }
}
