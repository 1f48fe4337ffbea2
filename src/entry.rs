use std::sync::Arc;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::args::{OutputFormat, TesterArgs};
use crate::config::{RunOptions, apply_config, load_config};
use crate::engine::{RunReport, ScenarioRunner};
use crate::error::AppResult;
use crate::http::ClientSettings;
use crate::metrics::{MetricTitles, MetricsHub, MetricsRecorder};
use crate::shutdown::{setup_deadline, setup_signal_shutdown_handler};

/// Binary entry point: parse, configure, run, report.
///
/// # Errors
///
/// Returns an error when arguments or configuration are invalid, the run
/// cannot start, or the report cannot be written.
pub fn run() -> AppResult<()> {
    let matches = TesterArgs::command().get_matches();
    let args = TesterArgs::from_arg_matches(&matches)?;

    crate::logger::init_logging(args.verbose, args.no_color);

    let options = resolve_options(args, &matches)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = runtime.block_on(run_async(&options))?;
    print_report(&report, options.output_format)
}

fn resolve_options(mut args: TesterArgs, matches: &ArgMatches) -> AppResult<RunOptions> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, matches, &config)?;
    }
    RunOptions::from_args(&args).inspect_err(|err| error!("{}", err))
}

async fn run_async(options: &RunOptions) -> AppResult<RunReport> {
    let hub = MetricsHub::new();
    let recorder = hub.reserve(&options.run_id)?;
    let shared: Arc<dyn MetricsRecorder> = recorder.clone();
    let runner = ScenarioRunner::new(options.run_id.as_str(), shared, &ClientSettings::default())?;

    let token = CancellationToken::new();
    let signal_handle = setup_signal_shutdown_handler(&token);
    let deadline_handle = options
        .duration
        .map(|duration| setup_deadline(&token, duration));
    if deadline_handle.is_none() {
        info!("No duration set; press Ctrl+C to stop the run");
    }

    let result = runner.run(token.clone(), &options.load).await;

    token.cancel();
    signal_handle.await?;
    if let Some(handle) = deadline_handle {
        handle.await?;
    }

    let summary = result?;
    let report = RunReport::collect(&summary, &recorder, &MetricTitles::http())?;
    drop(hub.release(&options.run_id));
    Ok(report)
}

fn print_report(report: &RunReport, format: OutputFormat) -> AppResult<()> {
    match format {
        OutputFormat::Text => {
            for line in report.text_lines() {
                println!("{}", line);
            }
        }
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
