use super::group::{Graph, Metric, MetricGroup};

pub const SUCCESS_SUFFIX: &str = ".http_ok";
pub const FAIL_SUFFIX: &str = ".http_fail";
pub const OTHER_FAIL_SUFFIX: &str = ".http_other_fail";
pub const LATENCY_SUFFIX: &str = ".latency";

const RESPONSE_GRAPH_TITLE: &str = "HTTP Response";
const RESPONSE_GRAPH_UNIT: &str = "N";
const LATENCY_GRAPH_TITLE: &str = "Latency";
const LATENCY_GRAPH_UNIT: &str = "Microsecond";

/// Names of the four metrics a run reports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricTitles {
    pub success: &'static str,
    pub fail: &'static str,
    pub other_fail: &'static str,
    pub latency: &'static str,
}

impl MetricTitles {
    #[must_use]
    pub const fn http() -> Self {
        Self {
            success: SUCCESS_SUFFIX,
            fail: FAIL_SUFFIX,
            other_fail: OTHER_FAIL_SUFFIX,
            latency: LATENCY_SUFFIX,
        }
    }
}

impl Default for MetricTitles {
    fn default() -> Self {
        Self::http()
    }
}

/// Builds the metric namespace declaration for an HTTP run.
///
/// One group named `HTTP (<run_id>)` with an "HTTP Response" graph holding
/// the three outcome counters and a "Latency" graph holding the latency
/// histogram.
#[must_use]
pub fn http_metric_groups(run_id: &str, titles: &MetricTitles) -> Vec<MetricGroup> {
    vec![MetricGroup {
        name: format!("HTTP ({})", run_id),
        graphs: vec![
            Graph {
                title: RESPONSE_GRAPH_TITLE.to_owned(),
                unit: RESPONSE_GRAPH_UNIT.to_owned(),
                metrics: vec![
                    Metric::counter(titles.success),
                    Metric::counter(titles.fail),
                    Metric::counter(titles.other_fail),
                ],
            },
            Graph {
                title: LATENCY_GRAPH_TITLE.to_owned(),
                unit: LATENCY_GRAPH_UNIT.to_owned(),
                metrics: vec![Metric::histogram(titles.latency)],
            },
        ],
    }]
}
