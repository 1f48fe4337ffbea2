use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::{Client, Request};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::RequestPlan;
use crate::error::HttpError;
use crate::http::{BodyMode, RequestExecutor};

/// Live count of worker loops, shared between a manager and its observers.
#[derive(Debug, Clone, Default)]
pub struct WorkerGauge(Arc<AtomicUsize>);

impl WorkerGauge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> WorkerGuard<'_> {
        self.0.fetch_add(1, Ordering::AcqRel);
        WorkerGuard {
            active: self.0.as_ref(),
        }
    }
}

struct WorkerGuard<'gauge> {
    active: &'gauge AtomicUsize,
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        loop {
            let current = self.active.load(Ordering::Acquire);
            let Some(next) = current.checked_sub(1) else {
                break;
            };
            if self
                .active
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }
}

/// The request every worker of a run repeats, built once.
#[derive(Debug)]
pub struct Workload {
    template: Request,
    mode: BodyMode,
    clients: NonZeroUsize,
}

impl Workload {
    /// # Errors
    ///
    /// Returns an error when the request template cannot be built.
    pub fn from_plan(plan: &RequestPlan, client: &Client) -> Result<Self, HttpError> {
        Ok(Self {
            template: plan.template(client)?,
            mode: plan.mode,
            clients: plan.clients,
        })
    }

    #[must_use]
    pub const fn clients(&self) -> NonZeroUsize {
        self.clients
    }
}

/// Totals reported once every worker has exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManagerReport {
    pub workers: usize,
    /// Completed attempts, whatever their outcome.
    pub attempts: u64,
    /// Workers whose task ended abnormally.
    pub failed_workers: usize,
}

/// Fans a workload out over a fixed number of worker loops.
#[derive(Debug, Clone)]
pub struct Manager {
    executor: RequestExecutor,
    gauge: WorkerGauge,
}

impl Manager {
    /// Workers of this manager are counted on `gauge`.
    #[must_use]
    pub const fn new(executor: RequestExecutor, gauge: WorkerGauge) -> Self {
        Self { executor, gauge }
    }

    /// Spawns exactly `workload.clients()` loops that issue requests back to
    /// back until `token` is cancelled, waits for all of them, then sends
    /// the report on `done`.
    ///
    /// A loop checks the token before each attempt and never abandons an
    /// attempt in flight, so every started request is recorded.
    pub async fn run(
        self,
        token: CancellationToken,
        workload: Workload,
        done: oneshot::Sender<ManagerReport>,
    ) -> ManagerReport {
        let workers = workload.clients().get();
        let workload = Arc::new(workload);
        let mut worker_handles = Vec::with_capacity(workers);

        for _ in 0..workers {
            let executor = self.executor.clone();
            let gauge = self.gauge.clone();
            let token = token.clone();
            let workload = Arc::clone(&workload);

            let handle = tokio::spawn(async move {
                let _active = gauge.enter();
                let mut attempts: u64 = 0;
                while !token.is_cancelled() {
                    if let Err(err) = executor
                        .execute_template(&workload.template, workload.mode)
                        .await
                    {
                        debug!("Request failed: {}", err);
                    }
                    attempts = attempts.saturating_add(1);
                }
                attempts
            });
            worker_handles.push(handle);
        }

        let mut report = ManagerReport {
            workers,
            ..ManagerReport::default()
        };
        for handle in worker_handles {
            match handle.await {
                Ok(attempts) => report.attempts = report.attempts.saturating_add(attempts),
                Err(err) => {
                    error!("Worker task failed: {}", err);
                    report.failed_workers = report.failed_workers.saturating_add(1);
                }
            }
        }

        if done.send(report).is_err() {
            debug!("Run boundary stopped listening before workers joined");
        }
        report
    }
}
