use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Running total of integer increments.
    Counter,
    /// Distribution of sampled values.
    Histogram,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub title: String,
    pub kind: MetricKind,
}

impl Metric {
    #[must_use]
    pub fn counter(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            kind: MetricKind::Counter,
        }
    }

    #[must_use]
    pub fn histogram(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            kind: MetricKind::Histogram,
        }
    }
}

/// A titled set of metrics sharing one unit label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Graph {
    pub title: String,
    pub unit: String,
    pub metrics: Vec<Metric>,
}

/// Metrics declared for one run, grouped into graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricGroup {
    pub name: String,
    pub graphs: Vec<Graph>,
}

impl MetricGroup {
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.graphs.iter().flat_map(|graph| graph.metrics.iter())
    }
}
