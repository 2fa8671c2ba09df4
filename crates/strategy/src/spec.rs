//! Strategy selection from configuration

use crate::ma_cross::{MovingAverageCross, MovingAverageCrossConfig};
use crate::mean_reversion::{MeanReversion, MeanReversionConfig};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};

/// Built-in strategy and its parameters, as written in config files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategySpec {
    MaCross(MovingAverageCrossConfig),
    MeanReversion(MeanReversionConfig),
}

impl StrategySpec {
    pub fn build(&self) -> Box<dyn Strategy> {
        match self {
            StrategySpec::MaCross(config) => Box::new(MovingAverageCross::new(config.clone())),
            StrategySpec::MeanReversion(config) => Box::new(MeanReversion::new(config.clone())),
        }
    }
}

impl Default for StrategySpec {
    fn default() -> Self {
        StrategySpec::MaCross(MovingAverageCrossConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_from_json() {
        let spec: StrategySpec =
            serde_json::from_str(r#"{"kind":"mean_reversion","period":10}"#).unwrap();
        match &spec {
            StrategySpec::MeanReversion(c) => assert_eq!(c.period, 10),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(spec.build().name(), "mean_reversion");
        assert_eq!(StrategySpec::default().build().name(), "ma_cross");
    }
}
