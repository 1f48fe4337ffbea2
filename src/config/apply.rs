use std::collections::BTreeMap;
use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{OutputFormat, PositiveUsize, TesterArgs, default_run_id};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::load::LoadConfig;
use super::types::ConfigFile;

/// Everything the binary needs to start one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub load: LoadConfig,
    /// `None` runs until an external signal cancels it.
    pub duration: Option<Duration>,
    pub run_id: String,
    pub output_format: OutputFormat,
}

impl RunOptions {
    /// Collects the merged arguments into run options.
    ///
    /// # Errors
    ///
    /// Returns an error when no URL was supplied.
    pub fn from_args(args: &TesterArgs) -> AppResult<Self> {
        let url = args
            .url
            .clone()
            .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
        let load = LoadConfig {
            url,
            method: args.method,
            clients: args.clients.get(),
            headers: args.headers.iter().cloned().collect(),
            post_data: args.data.clone(),
            capture_body: args.capture_body,
        };

        Ok(Self {
            load,
            duration: args.duration,
            run_id: args.run_id.clone().unwrap_or_else(default_run_id),
            output_format: args.output_format,
        })
    }
}

/// Applies configuration values to CLI arguments. Values given explicitly on
/// the command line are kept; file headers are merged under CLI headers.
///
/// # Errors
///
/// Returns an error when a config value is out of range.
pub fn apply_config(
    args: &mut TesterArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "clients")
        && let Some(clients) = config.clients
    {
        args.clients = ensure_positive_usize(clients, "clients")?;
    }

    if let Some(headers) = config.headers.as_ref() {
        args.headers = merge_headers(headers, &args.headers);
    }

    if !is_cli(matches, "data")
        && let Some(post_data) = config.post_data.clone()
    {
        args.data = Some(post_data);
    }

    if !is_cli(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        let duration = duration
            .to_duration()
            .map_err(|err| AppError::config(ConfigError::InvalidDuration { source: err }))?;
        args.duration = Some(duration);
    }

    if !is_cli(matches, "run_id")
        && let Some(run_id) = config.run_id.clone()
    {
        args.run_id = Some(run_id);
    }

    if !is_cli(matches, "capture_body")
        && let Some(capture_body) = config.capture_body
    {
        args.capture_body = capture_body;
    }

    if !is_cli(matches, "output_format")
        && let Some(output_format) = config.output_format
    {
        args.output_format = output_format;
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

fn ensure_positive_usize(value: usize, field: &str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value).map_err(|err| {
        AppError::config(ConfigError::FieldMustBePositive {
            field: field.to_owned(),
            source: err,
        })
    })
}

fn merge_headers(
    file_headers: &BTreeMap<String, String>,
    cli_headers: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = file_headers
        .iter()
        .filter(|(name, _)| {
            !cli_headers
                .iter()
                .any(|(cli_name, _)| cli_name.eq_ignore_ascii_case(name))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    merged.extend(cli_headers.iter().cloned());
    merged
}
