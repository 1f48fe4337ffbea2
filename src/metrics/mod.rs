//! Run metrics: the recorder contract, per-run namespaces, and latency
//! histograms.
mod group;
mod histogram;
mod hub;
mod recorder;
mod snapshot;
mod titles;

#[cfg(test)]
mod tests;

pub use group::{Graph, Metric, MetricGroup, MetricKind};
pub use histogram::LatencyHistogram;
pub use hub::MetricsHub;
pub use recorder::{InMemoryRecorder, MetricsRecorder};
pub use snapshot::{
    GraphSnapshot, GroupSnapshot, HistogramSummary, MetricSnapshot, MetricValue, MetricsSnapshot,
};
pub use titles::{
    FAIL_SUFFIX, LATENCY_SUFFIX, MetricTitles, OTHER_FAIL_SUFFIX, SUCCESS_SUFFIX,
    http_metric_groups,
};
