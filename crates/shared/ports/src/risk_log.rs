use cn5_core::{CandidateOrder, InstanceId, RiskVerdict};

/// One risk decision, as recorded for audit
#[derive(Debug, Clone)]
pub struct RiskDecision {
    pub instance_id: InstanceId,
    pub order: CandidateOrder,
    pub verdict: RiskVerdict,
}

/// Sink for every risk verdict, passed or rejected
pub trait RiskLog: Send + Sync {
    fn record(&self, decision: RiskDecision);
}
