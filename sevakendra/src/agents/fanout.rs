use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::specialist::SpecialistInvoker;
use crate::models::{PanelFindings, Report};

/// Runs the specialist panel concurrently and joins on all of it.
///
/// Every invoker runs as its own task inside a [`JoinSet`], with at most
/// `max_workers` in flight at once. [`FanOutCoordinator::run`] only returns
/// once each task has finished or failed, so the caller never sees a partial
/// panel. Tasks own their inputs and share nothing mutable. If the future
/// returned by `run` is dropped early, the `JoinSet` aborts the remaining
/// tasks with it.
#[derive(Debug, Clone)]
pub struct FanOutCoordinator {
    max_workers: usize,
}

impl FanOutCoordinator {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub async fn run(&self, invokers: &[SpecialistInvoker], report: &Report) -> PanelFindings {
        let permits = Arc::new(Semaphore::new(self.max_workers));
        let report: Arc<str> = Arc::from(report.as_str());
        let mut tasks = JoinSet::new();

        for invoker in invokers {
            let invoker = invoker.clone();
            let report = Arc::clone(&report);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = permits.acquire_owned().await.ok();
                invoker.invoke(&report).await
            });
        }

        info!(
            specialists = invokers.len(),
            max_workers = self.max_workers,
            "Specialist panel dispatched"
        );

        let mut findings = PanelFindings::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => {
                    info!(
                        role = %result.role,
                        answered = result.text.is_some(),
                        "Specialist slot settled"
                    );
                    findings.record(result);
                }
                Err(e) => {
                    // The slot keeps its absent entry.
                    error!(error = %e, "Specialist task did not complete");
                }
            }
        }

        info!(
            answered = findings.present_count(),
            missing = ?findings.absent_roles(),
            "Specialist panel joined"
        );
        findings
    }
}

impl Default for FanOutCoordinator {
    fn default() -> Self {
        Self::new(3)
    }
}
