//! Shared primitive types used across the scoring pipeline.

/// Position of a transaction in the loaded input. Stable for a run.
pub type RowId = usize;

/// Owner of a transaction.
pub type UserId = String;

pub type DeviceId = String;

/// The canonical run identifier.
pub type RunId = String;
