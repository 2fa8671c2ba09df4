//! Risk audit sinks

use cn5_ports::{RiskDecision, RiskLog};
use log::{info, warn};
use std::sync::Mutex;

/// Writes every verdict through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRiskSink;

impl RiskLog for LogRiskSink {
    fn record(&self, decision: RiskDecision) {
        let RiskDecision {
            instance_id,
            order,
            verdict,
        } = decision;
        if verdict.passed {
            info!(
                "[RISK] [{}] {} {} {} @ {} approved (score {})",
                instance_id, order.side, order.quantity, order.symbol, order.fill_price,
                verdict.risk_score
            );
        } else {
            warn!(
                "[RISK] [{}] {} {} {} rejected by {}: {} (score {})",
                instance_id,
                order.side,
                order.quantity,
                order.symbol,
                verdict.triggered_rule.map(|r| r.code()).unwrap_or("-"),
                verdict.reason.as_deref().unwrap_or_default(),
                verdict.risk_score
            );
        }
    }
}

/// Keeps every verdict in memory, for audits and tests
#[derive(Debug, Default)]
pub struct MemoryRiskLog {
    decisions: Mutex<Vec<RiskDecision>>,
}

impl MemoryRiskLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decisions(&self) -> Vec<RiskDecision> {
        self.decisions
            .lock()
            .map(|d| d.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn rejected_count(&self) -> usize {
        self.decisions()
            .iter()
            .filter(|d| !d.verdict.passed)
            .count()
    }
}

impl RiskLog for MemoryRiskLog {
    fn record(&self, decision: RiskDecision) {
        let mut decisions = self
            .decisions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        decisions.push(decision);
    }
}
