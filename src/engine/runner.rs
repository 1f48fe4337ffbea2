use std::sync::Arc;

use reqwest::Client;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::LoadConfig;
use crate::error::{AppError, AppResult};
use crate::http::{ClientSettings, RequestExecutor, build_client};
use crate::metrics::{MetricTitles, MetricsRecorder, http_metric_groups};

use super::manager::{Manager, WorkerGauge, Workload};
use super::report::RunSummary;
use super::state::{RunState, RunStatus};

/// Public run boundary: owns one run's state and metric namespace, and
/// drives a [`Manager`] until it finishes or the caller cancels.
#[derive(Debug)]
pub struct ScenarioRunner {
    state: RunState,
    executor: RequestExecutor,
    gauge: WorkerGauge,
}

impl ScenarioRunner {
    /// Registers the run's metric namespace and builds its pooled client.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or the namespace is
    /// rejected by the recorder.
    pub fn new(
        run_id: impl Into<String>,
        recorder: Arc<dyn MetricsRecorder>,
        settings: &ClientSettings,
    ) -> AppResult<Self> {
        let client = build_client(settings)?;
        Self::with_client(run_id, recorder, client)
    }

    /// Like [`ScenarioRunner::new`] with a caller-supplied client.
    ///
    /// # Errors
    ///
    /// Returns an error when the namespace is rejected by the recorder.
    pub fn with_client(
        run_id: impl Into<String>,
        recorder: Arc<dyn MetricsRecorder>,
        client: Client,
    ) -> AppResult<Self> {
        let titles = MetricTitles::http();
        let state = RunState::new(run_id.into());
        let groups = http_metric_groups(state.request_id(), &titles);
        recorder.register(&groups, state.request_id()).map_err(|err| {
            error!(
                "Failed to register metrics for run {}: {}",
                state.request_id(),
                err
            );
            AppError::metrics(err)
        })?;

        Ok(Self {
            executor: RequestExecutor::new(client, recorder, titles),
            state,
            gauge: WorkerGauge::new(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> &RunState {
        &self.state
    }

    /// Gauge of this run's live workers.
    #[must_use]
    pub fn gauge(&self) -> WorkerGauge {
        self.gauge.clone()
    }

    /// Runs `config` until every worker exits or `ctx` is cancelled.
    ///
    /// The configuration is validated before any worker starts. Workers
    /// observe the same token and are always joined before this returns,
    /// so the recorder holds every attempt once it does.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the manager
    /// task fails. Per-request failures are recorded, never returned.
    pub async fn run(
        mut self,
        ctx: CancellationToken,
        config: &LoadConfig,
    ) -> AppResult<RunSummary> {
        let plan = config.prepare().map_err(|err| {
            error!("Invalid load configuration: {}", err);
            AppError::validation(err)
        })?;
        let workload = Workload::from_plan(&plan, self.executor.client())?;

        self.state.start();
        let begin = Instant::now();
        info!(
            run_id = self.state.request_id(),
            url = %plan.url,
            method = %plan.method,
            clients = plan.clients.get(),
            "Starting run"
        );

        let (done_tx, done_rx) = oneshot::channel();
        let manager = Manager::new(self.executor.clone(), self.gauge.clone());
        let manager_handle = tokio::spawn(manager.run(ctx.clone(), workload, done_tx));

        // Workers only stop once the token fires, so both branches can be
        // ready together; cancellation must win that tie.
        let status = tokio::select! {
            biased;
            () = ctx.cancelled_owned() => {
                info!("Job completed");
                RunStatus::Cancelled
            }
            _ = done_rx => {
                info!("Run completed");
                RunStatus::Completed
            }
        };

        let report = manager_handle.await?;
        self.state.finish(status);
        info!(
            run_id = self.state.request_id(),
            attempts = report.attempts,
            workers = report.workers,
            "Workers joined"
        );

        Ok(RunSummary {
            state: self.state,
            elapsed: begin.elapsed(),
            manager: report,
        })
    }
}
