use serde::Serialize;

use crate::metrics::MetricTitles;

/// Classification of one request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Status in `200..300`.
    Success,
    /// A response arrived with any other status.
    ApplicationFail,
    /// No response: timeout, refused connection, DNS failure, or a request
    /// that could not be built.
    TransportFail,
}

impl Outcome {
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        if status >= 200 && status < 300 {
            Outcome::Success
        } else {
            Outcome::ApplicationFail
        }
    }

    /// Counter notified for this outcome.
    #[must_use]
    pub const fn counter(self, titles: &MetricTitles) -> &'static str {
        match self {
            Outcome::Success => titles.success,
            Outcome::ApplicationFail => titles.fail,
            Outcome::TransportFail => titles.other_fail,
        }
    }
}
