use serde::Serialize;

use crate::error::MetricsError;

use super::group::MetricKind;
use super::histogram::LatencyHistogram;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: u64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    /// Base64 HDR V2 encoding, decodable with `LatencyHistogram::decode_base64`.
    pub encoded: String,
}

impl HistogramSummary {
    /// Summarize a histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be serialized.
    pub fn from_histogram(hist: &LatencyHistogram) -> Result<Self, MetricsError> {
        let (p50, p90, p99) = hist.percentiles();
        Ok(Self {
            count: hist.count(),
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50,
            p90,
            p99,
            encoded: hist.encode_base64()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetricValue {
    Counter(u64),
    Histogram(HistogramSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub title: String,
    pub kind: MetricKind,
    pub value: MetricValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    pub title: String,
    pub unit: String,
    pub metrics: Vec<MetricSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSnapshot {
    pub name: String,
    pub graphs: Vec<GraphSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub run_id: String,
    pub groups: Vec<GroupSnapshot>,
    pub dropped_notifications: u64,
}

impl MetricsSnapshot {
    pub fn metrics(&self) -> impl Iterator<Item = &MetricSnapshot> {
        self.groups
            .iter()
            .flat_map(|group| group.graphs.iter())
            .flat_map(|graph| graph.metrics.iter())
    }

    #[must_use]
    pub fn counter(&self, title: &str) -> Option<u64> {
        self.metrics()
            .find(|metric| metric.title == title)
            .and_then(|metric| match &metric.value {
                MetricValue::Counter(total) => Some(*total),
                MetricValue::Histogram(_) => None,
            })
    }

    #[must_use]
    pub fn histogram(&self, title: &str) -> Option<&HistogramSummary> {
        self.metrics()
            .find(|metric| metric.title == title)
            .and_then(|metric| match &metric.value {
                MetricValue::Histogram(summary) => Some(summary),
                MetricValue::Counter(_) => None,
            })
    }
}
