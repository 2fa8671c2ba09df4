//! Live runner - one task per instance, cooperative stop
//!
//! Instances stop individually with [`LiveRunner::stop_instance`] or all at
//! once with [`LiveRunner::shutdown`]. A stopping instance always finishes
//! the bar it is processing.

use crate::orchestrator::{BarOutcome, InstanceStats, Orchestrator};
use cn5_core::{AccountState, InstanceId};
use cn5_ports::BarSource;
use cn5_risk_manager::RiskGate;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Final state of a live instance task
#[derive(Debug, Clone)]
pub struct InstanceReport {
    pub instance_id: InstanceId,
    pub stats: InstanceStats,
    pub account: AccountState,
    pub halted: Option<String>,
}

/// A spawned instance task and its own stop signal
struct LiveInstance {
    instance_id: InstanceId,
    stop_tx: watch::Sender<bool>,
    gate: RiskGate,
    handle: JoinHandle<InstanceReport>,
}

impl LiveInstance {
    fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    async fn join(self) -> Option<InstanceReport> {
        match self.handle.await {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("[{}] Instance task failed: {}", self.instance_id, e);
                None
            }
        }
    }
}

/// Owns the per-instance tasks, each with its own stop signal
pub struct LiveRunner {
    instances: Vec<LiveInstance>,
}

impl LiveRunner {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    /// Start processing bars from `source` on a dedicated task
    pub fn spawn(&mut self, orchestrator: Orchestrator, source: Box<dyn BarSource>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let instance_id = orchestrator.instance_id().to_string();
        let gate = orchestrator.gate().clone();
        let handle = tokio::spawn(run_instance(orchestrator, source, stop_rx));
        self.instances.push(LiveInstance {
            instance_id,
            stop_tx,
            gate,
            handle,
        });
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Ids of the instances still owned by the runner
    pub fn instance_ids(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.instance_id.as_str())
    }

    /// Stop one instance after its in-flight bar and wait for it.
    ///
    /// The instance leaves the shared aggregate, so its exposure no longer
    /// counts toward the portfolio-wide risk rules. Other instances keep
    /// running. Returns `None` if no such instance is running.
    pub async fn stop_instance(&mut self, instance_id: &str) -> Option<InstanceReport> {
        let index = self
            .instances
            .iter()
            .position(|i| i.instance_id == instance_id)?;
        let instance = self.instances.remove(index);
        instance.stop();

        let gate = instance.gate.clone();
        let report = instance.join().await;
        gate.lock().await.remove(instance_id);
        report
    }

    /// Ask every instance to stop after its in-flight bar
    pub fn stop(&self) {
        for instance in &self.instances {
            instance.stop();
        }
    }

    /// Wait for every instance task to finish
    pub async fn join(self) -> Vec<InstanceReport> {
        let mut reports = Vec::with_capacity(self.instances.len());
        for instance in self.instances {
            if let Some(report) = instance.join().await {
                reports.push(report);
            }
        }
        reports
    }

    /// Signal stop and wait
    pub async fn shutdown(self) -> Vec<InstanceReport> {
        self.stop();
        self.join().await
    }
}

impl Default for LiveRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_instance(
    mut orchestrator: Orchestrator,
    mut source: Box<dyn BarSource>,
    mut stop_rx: watch::Receiver<bool>,
) -> InstanceReport {
    let instance_id = orchestrator.instance_id().to_string();
    log::info!("[{}] Instance started ({})", instance_id, source.name());

    loop {
        if *stop_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            bar = source.next_bar() => {
                let Some(bar) = bar else {
                    log::info!("[{}] Bar source closed", instance_id);
                    break;
                };
                match orchestrator.process_bar(&bar).await {
                    Ok(BarOutcome::Filled(trade)) => {
                        log::debug!("[{}] Trade {} settled", instance_id, trade.id);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        log::error!("[{}] Instance halted: {}", instance_id, e);
                        break;
                    }
                }
            }
        }
    }

    orchestrator.stop();
    InstanceReport {
        instance_id,
        stats: orchestrator.stats().clone(),
        account: orchestrator.ledger().snapshot(),
        halted: orchestrator.halt_reason().map(str::to_string),
    }
}
