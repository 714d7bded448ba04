//! Pipeline stage trait.
//!
//! RULE: Every stage is a pure transform `TransactionSet -> TransactionSet`.
//! A stage reads only columns produced by earlier stages and adds its own.
//! It either annotates every row or returns an error; there is no partial
//! result. Execution order is fixed and documented in engine.rs.

use crate::{dataset::{FlagColumn, TransactionSet}, error::ScoreResult};

pub trait PipelineStage {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// The flag column this stage adds, if it is a detection rule.
    fn flag_column(&self) -> Option<FlagColumn> {
        None
    }

    fn apply(&self, set: TransactionSet) -> ScoreResult<TransactionSet>;
}
