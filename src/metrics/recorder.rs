use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::error::MetricsError;

use super::group::{MetricGroup, MetricKind};
use super::histogram::LatencyHistogram;
use super::snapshot::{
    GraphSnapshot, GroupSnapshot, HistogramSummary, MetricSnapshot, MetricValue, MetricsSnapshot,
};

/// Sink for run metrics.
///
/// `register` declares the namespace for a run and must succeed once before
/// any `notify`. `notify` is called concurrently from every worker; counters
/// add `value` to their total, histograms record `value` as one sample.
pub trait MetricsRecorder: Send + Sync {
    /// Declare the metric namespace for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the recorder already holds a namespace, the run
    /// id is empty, or a metric title is empty or declared twice.
    fn register(&self, groups: &[MetricGroup], run_id: &str) -> Result<(), MetricsError>;

    /// Record one increment or sample for `metric`.
    fn notify(&self, metric: &str, value: u64);
}

#[derive(Debug)]
struct Namespace {
    run_id: String,
    groups: Vec<MetricGroup>,
    counters: BTreeMap<String, AtomicU64>,
    histograms: BTreeMap<String, Mutex<LatencyHistogram>>,
}

impl Namespace {
    fn build(groups: &[MetricGroup], run_id: &str) -> Result<Self, MetricsError> {
        if run_id.trim().is_empty() {
            return Err(MetricsError::EmptyRunId);
        }

        let mut seen = BTreeSet::new();
        let mut counters = BTreeMap::new();
        let mut histograms = BTreeMap::new();
        for group in groups {
            for metric in group.metrics() {
                if metric.title.is_empty() {
                    return Err(MetricsError::EmptyTitle {
                        group: group.name.clone(),
                    });
                }
                if !seen.insert(metric.title.as_str()) {
                    return Err(MetricsError::DuplicateMetric {
                        group: group.name.clone(),
                        title: metric.title.clone(),
                    });
                }
                match metric.kind {
                    MetricKind::Counter => {
                        counters.insert(metric.title.clone(), AtomicU64::new(0));
                    }
                    MetricKind::Histogram => {
                        histograms.insert(
                            metric.title.clone(),
                            Mutex::new(LatencyHistogram::new()?),
                        );
                    }
                }
            }
        }

        Ok(Self {
            run_id: run_id.to_owned(),
            groups: groups.to_vec(),
            counters,
            histograms,
        })
    }
}

/// Process-local recorder holding a single run namespace.
///
/// Counters are atomics; each histogram sits behind its own mutex so
/// concurrent workers never lose or tear an update.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    namespace: OnceLock<Namespace>,
    dropped: AtomicU64,
}

impl InMemoryRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        self.namespace
            .get()
            .map(|namespace| namespace.run_id.as_str())
    }

    /// Current total for a counter, `None` if no such counter is registered.
    #[must_use]
    pub fn counter(&self, title: &str) -> Option<u64> {
        self.namespace
            .get()?
            .counters
            .get(title)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    /// Number of samples recorded by a histogram.
    #[must_use]
    pub fn histogram_count(&self, title: &str) -> Option<u64> {
        self.histogram(title).map(|hist| hist.count())
    }

    /// Copy of a histogram's current distribution.
    #[must_use]
    pub fn histogram(&self, title: &str) -> Option<LatencyHistogram> {
        self.namespace
            .get()?
            .histograms
            .get(title)
            .map(|hist| hist.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Notifications that matched no registered metric.
    #[must_use]
    pub fn dropped_notifications(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Point-in-time view of every registered metric, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a histogram cannot be serialized.
    pub fn snapshot(&self) -> Result<Option<MetricsSnapshot>, MetricsError> {
        let Some(namespace) = self.namespace.get() else {
            return Ok(None);
        };

        let mut groups = Vec::with_capacity(namespace.groups.len());
        for group in &namespace.groups {
            let mut graphs = Vec::with_capacity(group.graphs.len());
            for graph in &group.graphs {
                let mut metrics = Vec::with_capacity(graph.metrics.len());
                for metric in &graph.metrics {
                    let value = match metric.kind {
                        MetricKind::Counter => {
                            MetricValue::Counter(self.counter(&metric.title).unwrap_or(0))
                        }
                        MetricKind::Histogram => match self.histogram(&metric.title) {
                            Some(hist) => {
                                MetricValue::Histogram(HistogramSummary::from_histogram(&hist)?)
                            }
                            None => MetricValue::Histogram(HistogramSummary::default()),
                        },
                    };
                    metrics.push(MetricSnapshot {
                        title: metric.title.clone(),
                        kind: metric.kind,
                        value,
                    });
                }
                graphs.push(GraphSnapshot {
                    title: graph.title.clone(),
                    unit: graph.unit.clone(),
                    metrics,
                });
            }
            groups.push(GroupSnapshot {
                name: group.name.clone(),
                graphs,
            });
        }

        Ok(Some(MetricsSnapshot {
            run_id: namespace.run_id.clone(),
            groups,
            dropped_notifications: self.dropped_notifications(),
        }))
    }

    fn drop_sample(&self, metric: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        debug!("Dropped notification for unknown metric '{}'.", metric);
    }
}

impl MetricsRecorder for InMemoryRecorder {
    fn register(&self, groups: &[MetricGroup], run_id: &str) -> Result<(), MetricsError> {
        if let Some(existing) = self.namespace.get() {
            return Err(MetricsError::AlreadyRegistered {
                run_id: existing.run_id.clone(),
            });
        }
        let namespace = Namespace::build(groups, run_id)?;
        self.namespace
            .set(namespace)
            .map_err(|rejected| MetricsError::AlreadyRegistered {
                run_id: rejected.run_id,
            })
    }

    fn notify(&self, metric: &str, value: u64) {
        let Some(namespace) = self.namespace.get() else {
            self.drop_sample(metric);
            return;
        };

        if let Some(counter) = namespace.counters.get(metric) {
            counter.fetch_add(value, Ordering::Relaxed);
            return;
        }

        if let Some(hist) = namespace.histograms.get(metric) {
            let mut hist = hist.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = hist.record(value) {
                drop(hist);
                debug!("Failed to record sample for '{}': {}", metric, err);
                self.drop_sample(metric);
            }
            return;
        }

        self.drop_sample(metric);
    }
}
