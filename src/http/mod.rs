//! HTTP request execution and outcome classification.
mod client;
mod executor;
mod outcome;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{
    ClientSettings, DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
    build_client,
};
pub use executor::{BodyMode, RequestExecutor, ResponseBody};
pub use outcome::Outcome;
