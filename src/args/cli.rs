use clap::Parser;
use serde_json::Value;
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_header, parse_json_payload, parse_positive_usize,
};
use super::types::{HttpMethod, OutputFormat, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async HTTP load generator: a fixed pool of workers drives one URL as fast as it answers until the run is cancelled, recording outcome counters and a latency histogram."
)]
pub struct TesterArgs {
    /// Target URL
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP method to use
    #[arg(long, short = 'X', default_value = "get", ignore_case = true)]
    pub method: HttpMethod,

    /// Number of concurrent workers
    #[arg(long, short = 'c', default_value = "10", value_parser = parse_positive_usize)]
    pub clients: PositiveUsize,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// JSON request payload, sent by every method except GET
    #[arg(long, short, value_parser = parse_json_payload)]
    pub data: Option<Value>,

    /// Stop the run after this long (supports ms/s/m/h); runs until Ctrl+C when omitted
    #[arg(long, short = 't', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Identifier of the run's metric namespace (defaults to a timestamp)
    #[arg(long = "run-id")]
    pub run_id: Option<String>,

    /// Read full response bodies into memory instead of draining them
    #[arg(long = "capture-body")]
    pub capture_body: bool,

    /// Path to config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Report format printed when the run ends
    #[arg(long = "output-format", value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
