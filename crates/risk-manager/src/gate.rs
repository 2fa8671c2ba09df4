//! Risk gate: aggregate + config + validator + audit sink

use crate::aggregate::{AccountAggregate, SharedAggregate};
use crate::config::RiskConfigHandle;
use crate::sink::LogRiskSink;
use cn5_core::{CandidateOrder, RiskConfig, RiskVerdict};
use cn5_ports::{RiskDecision, RiskLog};
use cn5_risk::RiskValidator;
use std::sync::Arc;
use tokio::sync::MutexGuard;

/// Everything an orchestrator needs to gate orders, shared by all instances
#[derive(Clone)]
pub struct RiskGate {
    aggregate: SharedAggregate,
    config: RiskConfigHandle,
    sink: Arc<dyn RiskLog>,
}

impl RiskGate {
    pub fn new(aggregate: SharedAggregate, config: RiskConfigHandle) -> Self {
        Self {
            aggregate,
            config,
            sink: Arc::new(LogRiskSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn RiskLog>) -> Self {
        self.sink = sink;
        self
    }

    pub fn aggregate(&self) -> &SharedAggregate {
        &self.aggregate
    }

    pub fn config(&self) -> &RiskConfigHandle {
        &self.config
    }

    /// Enter the critical section
    pub async fn lock(&self) -> MutexGuard<'_, AccountAggregate> {
        self.aggregate.lock().await
    }

    /// Validate an order against a locked aggregate and record the verdict
    pub fn check(
        &self,
        aggregate: &AccountAggregate,
        instance_id: &str,
        order: &CandidateOrder,
        config: &RiskConfig,
    ) -> RiskVerdict {
        let exposure = aggregate.exposure_for(instance_id, order.timestamp);
        let verdict = RiskValidator::validate(order, &exposure, config);
        self.sink.record(RiskDecision {
            instance_id: instance_id.to_string(),
            order: order.clone(),
            verdict: verdict.clone(),
        });
        verdict
    }
}
