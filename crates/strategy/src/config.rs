use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Pipeline parameters (TOML). Every field is optional in the file.
///
/// Example `config/pipeline.toml`:
/// ```toml
/// barrier_upper = 2.0
/// barrier_lower = 0.9
/// ticks_for_trade = 5
/// cooldown_ms = 20000
/// history_capacity = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Offset added to the start price for the upper barrier.
    pub barrier_upper: f64,
    /// Offset subtracted from the start price for the lower barrier.
    pub barrier_lower: f64,
    /// Prices a trade collects before it is evaluated.
    pub ticks_for_trade: i64,
    /// Minimum time between two signals.
    pub cooldown_ms: i64,
    /// Length of the rolling price and digit windows.
    pub history_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            barrier_upper: 2.0,
            barrier_lower: 0.9,
            ticks_for_trade: 5,
            cooldown_ms: 20_000,
            history_capacity: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read pipeline config at '{path}': {e}"))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("pipeline config at '{path}': {e}")))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let cfg: PipelineConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticks_for_trade <= 0 {
            return Err(Error::Config(format!(
                "ticks_for_trade must be positive, got {}",
                self.ticks_for_trade
            )));
        }
        if !self.barrier_upper.is_finite() || self.barrier_upper < 0.0 {
            return Err(Error::Config(format!(
                "barrier_upper must be a non-negative number, got {}",
                self.barrier_upper
            )));
        }
        if !self.barrier_lower.is_finite() || self.barrier_lower < 0.0 {
            return Err(Error::Config(format!(
                "barrier_lower must be a non-negative number, got {}",
                self.barrier_lower
            )));
        }
        if self.cooldown_ms < 0 {
            return Err(Error::Config(format!(
                "cooldown_ms must not be negative, got {}",
                self.cooldown_ms
            )));
        }
        if self.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Validated `ticks_for_trade` as a length.
    pub fn trade_len(&self) -> usize {
        self.ticks_for_trade.max(1) as usize
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.barrier_upper, 2.0);
        assert_eq!(cfg.barrier_lower, 0.9);
        assert_eq!(cfg.ticks_for_trade, 5);
        assert_eq!(cfg.cooldown_ms, 20_000);
        assert_eq!(cfg.history_capacity, 1000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = PipelineConfig::from_toml("ticks_for_trade = 3\ncooldown_ms = 0\n").unwrap();
        assert_eq!(cfg.ticks_for_trade, 3);
        assert_eq!(cfg.cooldown_ms, 0);
        assert_eq!(cfg.barrier_upper, 2.0);
        assert_eq!(cfg.history_capacity, 1000);
    }

    #[test]
    fn rejects_non_positive_ticks_for_trade() {
        for ticks in [0, -1] {
            let cfg = PipelineConfig {
                ticks_for_trade: ticks,
                ..PipelineConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn rejects_negative_barriers_and_cooldown() {
        let upper = PipelineConfig {
            barrier_upper: -0.1,
            ..PipelineConfig::default()
        };
        let lower = PipelineConfig {
            barrier_lower: f64::NAN,
            ..PipelineConfig::default()
        };
        let cooldown = PipelineConfig {
            cooldown_ms: -5,
            ..PipelineConfig::default()
        };
        assert!(upper.validate().is_err());
        assert!(lower.validate().is_err());
        assert!(cooldown.validate().is_err());
    }

    #[test]
    fn rejects_zero_history_capacity() {
        let cfg = PipelineConfig {
            history_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = PipelineConfig::from_toml("ticks_for_trade = \"five\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
