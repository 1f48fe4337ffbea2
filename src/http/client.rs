use std::time::Duration;

use reqwest::Client;
use tracing::error;

use crate::error::{AppError, AppResult, HttpError};

/// Per-request timeout, covering connect, send, and response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Idle connections kept per host; sized for sustained high concurrency.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 300;

pub const DEFAULT_USER_AGENT: &str = concat!("loadtester/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
        }
    }
}

/// Builds the pooled client shared by every worker of a run.
///
/// # Errors
///
/// Returns an error when the TLS backend or client cannot be initialised.
pub fn build_client(settings: &ClientSettings) -> AppResult<Client> {
    let mut client_builder = Client::builder()
        .timeout(settings.request_timeout)
        .pool_max_idle_per_host(settings.pool_max_idle_per_host);

    if let Some(user_agent) = settings.user_agent.as_deref() {
        client_builder = client_builder.user_agent(user_agent);
    }

    client_builder.build().map_err(|err| {
        error!("Failed to build HTTP client: {}", err);
        AppError::http(HttpError::BuildClientFailed { source: err })
    })
}
