//! Core library for the `loadtester` CLI.
//!
//! A run drives a fixed number of concurrent workers against one HTTP
//! target until it is cancelled. Every attempt is classified as a success,
//! an HTTP failure, or a transport failure and reported, together with its
//! latency in microseconds, to a [`metrics::MetricsRecorder`] registered
//! under the run's identifier.
//!
//! The entry points are [`engine::ScenarioRunner`] for embedding and the
//! `loadtester` binary built on [`entry::run`].
pub mod args;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod shutdown;
