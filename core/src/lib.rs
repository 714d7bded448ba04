//! Rule-based fraud risk scoring over batches of transactions.
//!
//! A run loads a transaction set, passes it through a fixed pipeline of
//! detection rules (see engine.rs), scores every transaction and selects
//! the high-risk ones.

pub mod amount_spike_rule;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod event;
pub mod grouping;
pub mod high_frequency_rule;
pub mod refund_abuse_rule;
pub mod risk_scorer;
pub mod rng;
pub mod shared_device_rule;
pub mod sink;
pub mod source;
pub mod stage;
pub mod store;
pub mod summary;
pub mod synth;
pub mod time_features;
pub mod transaction;
pub mod types;
pub mod unusual_hour_rule;

#[cfg(test)]
mod testing;
