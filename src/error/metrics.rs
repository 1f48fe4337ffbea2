use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Run id must not be empty.")]
    EmptyRunId,
    #[error("Metrics namespace '{run_id}' is already in use.")]
    NamespaceInUse { run_id: String },
    #[error("Metrics already registered for run '{run_id}'.")]
    AlreadyRegistered { run_id: String },
    #[error("Metric title must not be empty (group '{group}').")]
    EmptyTitle { group: String },
    #[error("Metric '{title}' is declared more than once in group '{group}'.")]
    DuplicateMetric { group: String, title: String },
    #[error("Histogram error during {context}: {source}")]
    Histogram {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("No metric namespace has been registered.")]
    NotRegistered,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
