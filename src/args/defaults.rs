use chrono::Utc;

/// Workers per run when neither the CLI nor the config file sets `clients`.
pub const DEFAULT_CLIENTS: usize = 10;

/// Run identifier derived from the current UTC time, unique per
/// millisecond.
#[must_use]
pub fn default_run_id() -> String {
    format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S%3fZ"))
}
