use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::MetricsError;
use crate::metrics::{HistogramSummary, InMemoryRecorder, MetricTitles, MetricsSnapshot};

use super::manager::ManagerReport;
use super::state::{RunState, RunStatus};

/// Percent values are carried as integers scaled by this factor.
const PERCENT_DIVISOR: u64 = 100;

/// What [`ScenarioRunner::run`](super::ScenarioRunner::run) returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Final state of the run, carrying its terminal status.
    pub state: RunState,
    pub elapsed: Duration,
    pub manager: ManagerReport,
}

impl RunSummary {
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.state.request_id()
    }

    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.state.status()
    }
}

/// Post-run report combining the run summary with the recorded metrics.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
    pub workers: usize,
    pub attempts: u64,
    pub success: u64,
    pub fail: u64,
    pub other_fail: u64,
    pub success_rate_x100: u64,
    pub avg_rps_x100: u64,
    pub latency_us: Option<HistogramSummary>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    #[must_use]
    pub fn new(summary: &RunSummary, snapshot: MetricsSnapshot, titles: &MetricTitles) -> Self {
        let success = snapshot.counter(titles.success).unwrap_or(0);
        let fail = snapshot.counter(titles.fail).unwrap_or(0);
        let other_fail = snapshot.counter(titles.other_fail).unwrap_or(0);
        let latency_us = snapshot.histogram(titles.latency).cloned();
        let elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX);
        let total = success.saturating_add(fail).saturating_add(other_fail);

        Self {
            run_id: summary.run_id().to_owned(),
            status: summary.status(),
            started_at: summary.state.start_time(),
            elapsed_ms,
            workers: summary.manager.workers,
            attempts: summary.manager.attempts,
            success,
            fail,
            other_fail,
            success_rate_x100: scaled_ratio(success, total, 10_000),
            avg_rps_x100: scaled_ratio(total, elapsed_ms.max(1), 100_000),
            latency_us,
            metrics: snapshot,
        }
    }

    /// Builds the report from the recorder the run wrote to.
    ///
    /// # Errors
    ///
    /// Returns an error when the recorder holds no namespace or a histogram
    /// cannot be encoded.
    pub fn collect(
        summary: &RunSummary,
        recorder: &InMemoryRecorder,
        titles: &MetricTitles,
    ) -> Result<Self, MetricsError> {
        let snapshot = recorder.snapshot()?.ok_or(MetricsError::NotRegistered)?;
        Ok(Self::new(summary, snapshot, titles))
    }

    #[must_use]
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!("Run: {} ({})", self.run_id, self.status.as_str()));
        if let Some(started_at) = self.started_at {
            lines.push(format!("Started: {}", started_at.to_rfc3339()));
        }
        lines.push(format!("Duration: {}ms", self.elapsed_ms));
        lines.push(format!("Workers: {}", self.workers));
        lines.push(format!("Total Requests: {}", self.attempts));
        lines.push(format!(
            "Successful: {} ({}.{:02}%)",
            self.success,
            self.success_rate_x100 / PERCENT_DIVISOR,
            self.success_rate_x100 % PERCENT_DIVISOR
        ));
        lines.push(format!("HTTP Failures: {}", self.fail));
        lines.push(format!("Transport Failures: {}", self.other_fail));
        lines.push(format!(
            "Avg RPS: {}.{:02}",
            self.avg_rps_x100 / PERCENT_DIVISOR,
            self.avg_rps_x100 % PERCENT_DIVISOR
        ));
        match self.latency_us.as_ref() {
            Some(latency) if latency.count > 0 => {
                lines.push(format!(
                    "Latency Min/Mean/Max: {}us / {}us / {}us",
                    latency.min, latency.mean, latency.max
                ));
                lines.push(format!(
                    "Latency P50/P90/P99: {}us / {}us / {}us",
                    latency.p50, latency.p90, latency.p99
                ));
            }
            Some(_) | None => lines.push("Latency: no samples".to_owned()),
        }
        if self.metrics.dropped_notifications > 0 {
            lines.push(format!(
                "Dropped Notifications: {}",
                self.metrics.dropped_notifications
            ));
        }
        lines
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn scaled_ratio(numerator: u64, denominator: u64, scale: u128) -> u64 {
    let scaled = u128::from(numerator)
        .saturating_mul(scale)
        .checked_div(u128::from(denominator))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
