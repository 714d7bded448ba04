//! Rule thresholds and score weights.
//!
//! Thresholds are fixed inputs to a run, never learned. `Default` carries
//! the production values; a JSON file may override any subset of them.

use crate::error::{ScoreError, ScoreResult};
use serde::{Deserialize, Serialize};

// ── Rule parameters ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighFrequencyConfig {
    /// A (user, hour bucket) group is flagged when its count is strictly
    /// greater than this.
    pub max_txns_per_hour: usize,
}

impl Default for HighFrequencyConfig {
    fn default() -> Self {
        Self { max_txns_per_hour: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnusualHourConfig {
    /// First suspicious hour of day (inclusive).
    pub start_hour: u32,
    /// Last suspicious hour of day (inclusive).
    pub end_hour: u32,
}

impl Default for UnusualHourConfig {
    fn default() -> Self {
        Self {
            start_hour: 2,
            end_hour: 4,
        }
    }
}

impl UnusualHourConfig {
    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefundAbuseConfig {
    /// Refunds per (user, calendar month) above which the month is flagged.
    pub max_refunds_per_month: usize,
}

impl Default for RefundAbuseConfig {
    fn default() -> Self {
        Self {
            max_refunds_per_month: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedDeviceConfig {
    /// Distinct users on one device at which the device is flagged (inclusive).
    pub min_unique_users: usize,
}

impl Default for SharedDeviceConfig {
    fn default() -> Self {
        Self { min_unique_users: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountSpikeConfig {
    pub multiplier: f64,
}

impl Default for AmountSpikeConfig {
    fn default() -> Self {
        Self { multiplier: 3.0 }
    }
}

// ── Scoring ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub unusual_hour: u32,
    pub refund: u32,
    pub large_amount: u32,
    pub shared_device: u32,
    pub high_frequency: u32,
    pub amount_spike: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            unusual_hour: 2,
            refund: 3,
            large_amount: 2,
            shared_device: 2,
            high_frequency: 3,
            amount_spike: 2,
        }
    }
}

impl ScoreWeights {
    fn all(&self) -> [u32; 6] {
        [
            self.unusual_hour,
            self.refund,
            self.large_amount,
            self.shared_device,
            self.high_frequency,
            self.amount_spike,
        ]
    }

    /// Highest score a single transaction can reach, or `None` when the
    /// weights do not fit in a `u32` score.
    pub fn max_score(&self) -> Option<u32> {
        self.all()
            .into_iter()
            .try_fold(0u32, |total, weight| total.checked_add(weight))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub high_frequency: HighFrequencyConfig,
    pub unusual_hours: UnusualHourConfig,
    pub refund_abuse: RefundAbuseConfig,
    pub shared_device: SharedDeviceConfig,
    pub amount_spike: AmountSpikeConfig,
    pub weights: ScoreWeights,
    /// Raw amount strictly above which the large-amount weight applies.
    pub large_amount_threshold: f64,
    /// Score at or above which a transaction is high risk.
    pub high_risk_threshold: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_frequency: HighFrequencyConfig::default(),
            unusual_hours: UnusualHourConfig::default(),
            refund_abuse: RefundAbuseConfig::default(),
            shared_device: SharedDeviceConfig::default(),
            amount_spike: AmountSpikeConfig::default(),
            weights: ScoreWeights::default(),
            large_amount_threshold: 1000.0,
            high_risk_threshold: 5,
        }
    }
}

impl ScoringConfig {
    /// Load overrides from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ScoringConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScoreResult<()> {
        let hours = &self.unusual_hours;
        if hours.start_hour > 23 || hours.end_hour > 23 {
            return Err(ScoreError::InvalidConfig(format!(
                "unusual hours must lie in 0..=23, got {}..={}",
                hours.start_hour, hours.end_hour
            )));
        }
        if hours.start_hour > hours.end_hour {
            return Err(ScoreError::InvalidConfig(format!(
                "unusual hour window is empty: {}..={}",
                hours.start_hour, hours.end_hour
            )));
        }
        let multiplier = self.amount_spike.multiplier;
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ScoreError::InvalidConfig(format!(
                "amount spike multiplier must be positive, got {multiplier}"
            )));
        }
        if self.shared_device.min_unique_users == 0 {
            return Err(ScoreError::InvalidConfig(
                "shared device threshold must be at least 1 user".into(),
            ));
        }
        if self.weights.max_score().is_none() {
            return Err(ScoreError::InvalidConfig(
                "score weights overflow when summed".into(),
            ));
        }
        if !self.large_amount_threshold.is_finite() || self.large_amount_threshold < 0.0 {
            return Err(ScoreError::InvalidConfig(format!(
                "large amount threshold must be non-negative, got {}",
                self.large_amount_threshold
            )));
        }
        Ok(())
    }
}
