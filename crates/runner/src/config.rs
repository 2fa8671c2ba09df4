//! Engine configuration
//!
//! Loaded from JSON, then optionally overridden from the environment:
//!
//! | Variable                     | Field                                |
//! |------------------------------|--------------------------------------|
//! | `TOTAL_STOP_LOSS_RATIO`      | `risk.max_total_loss_rate`           |
//! | `DAILY_LOSS_LIMIT_RATIO`     | `risk.max_daily_loss_rate`           |
//! | `MAX_STRATEGY_CAPITAL_RATIO` | `risk.max_strategy_capital_rate`     |
//! | `MAX_SINGLE_TRADE_RATIO`     | `risk.max_single_trade_rate`         |
//! | `MAX_TRADES_PER_HOUR`        | `risk.max_trades_per_hour`           |
//! | `TRADING_MODE`               | `mode` (`backtest`, `shadow`, `live`)|

use cn5_core::{AccountTag, InstanceId, Money, RiskConfig, Symbol};
use cn5_rules::MarketRules;
use cn5_strategy::StrategySpec;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Where trades go and how the instance starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    #[default]
    Backtest,
    Shadow,
    Live,
}

impl TradingMode {
    pub fn account_tag(&self) -> AccountTag {
        match self {
            TradingMode::Backtest => AccountTag::Backtest,
            TradingMode::Shadow => AccountTag::Shadow,
            TradingMode::Live => AccountTag::Live,
        }
    }

    /// Shadow and live instances resume from the trade log
    pub fn rehydrates(&self) -> bool {
        !matches!(self, TradingMode::Backtest)
    }
}

impl FromStr for TradingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backtest" => Ok(TradingMode::Backtest),
            "shadow" => Ok(TradingMode::Shadow),
            "live" => Ok(TradingMode::Live),
            other => Err(ConfigError::Env {
                var: "TRADING_MODE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RehydrationConfig {
    /// Trading sessions of bars replayed into indicators on restart
    pub lookback_sessions: usize,
    /// Start anyway when history is shorter than the strategy warm-up
    pub allow_partial_history: bool,
}

impl Default for RehydrationConfig {
    fn default() -> Self {
        Self {
            lookback_sessions: 30,
            allow_partial_history: false,
        }
    }
}

/// One strategy instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub id: InstanceId,
    pub symbols: Vec<Symbol>,
    pub initial_capital: Money,
    #[serde(default)]
    pub strategy: StrategySpec,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: TradingMode,
    pub risk: RiskConfig,
    pub market: MarketRules,
    pub rehydration: RehydrationConfig,
    pub instances: Vec<InstanceConfig>,
    /// JSONL trade log; trades stay in memory when unset
    pub trade_log: Option<PathBuf>,
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let risk = &mut self.risk;
        for (var, field) in [
            ("TOTAL_STOP_LOSS_RATIO", &mut risk.max_total_loss_rate),
            ("DAILY_LOSS_LIMIT_RATIO", &mut risk.max_daily_loss_rate),
            ("MAX_STRATEGY_CAPITAL_RATIO", &mut risk.max_strategy_capital_rate),
            ("MAX_SINGLE_TRADE_RATIO", &mut risk.max_single_trade_rate),
        ] {
            if let Some(value) = lookup(var) {
                *field = parse_env(var, &value)?;
            }
        }

        if let Some(value) = lookup("MAX_TRADES_PER_HOUR") {
            risk.max_trades_per_hour = parse_env("MAX_TRADES_PER_HOUR", &value)?;
        }

        if let Some(value) = lookup("TRADING_MODE") {
            self.mode = value.parse()?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let risk = &self.risk;
        if risk.total_capital <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "total_capital must be positive, got {}",
                risk.total_capital
            )));
        }

        for (name, rate) in [
            ("max_total_loss_rate", risk.max_total_loss_rate),
            ("max_daily_loss_rate", risk.max_daily_loss_rate),
            ("max_strategy_capital_rate", risk.max_strategy_capital_rate),
            ("max_single_trade_rate", risk.max_single_trade_rate),
        ] {
            if rate <= Decimal::ZERO || rate > Decimal::ONE {
                return Err(ConfigError::Invalid(format!(
                    "{} must be in (0, 1], got {}",
                    name, rate
                )));
            }
        }

        if risk.max_trades_per_hour == 0 {
            return Err(ConfigError::Invalid(
                "max_trades_per_hour must be at least 1".to_string(),
            ));
        }

        if self.market.lot_size <= Decimal::ZERO {
            return Err(ConfigError::Invalid("lot_size must be positive".to_string()));
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            if !seen.insert(instance.id.as_str()) {
                return Err(ConfigError::InvalidInstance(format!(
                    "duplicate instance id '{}'",
                    instance.id
                )));
            }
            if instance.initial_capital <= Decimal::ZERO {
                return Err(ConfigError::InvalidInstance(format!(
                    "'{}' needs positive initial_capital",
                    instance.id
                )));
            }
            if instance.symbols.is_empty() {
                return Err(ConfigError::InvalidInstance(format!(
                    "'{}' subscribes to no symbols",
                    instance.id
                )));
            }
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {var}")]
    Env { var: String, value: String },

    #[error("Invalid risk config: {0}")]
    Invalid(String),

    #[error("Invalid instance config: {0}")]
    InvalidInstance(String),
}
