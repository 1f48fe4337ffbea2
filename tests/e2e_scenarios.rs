
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use loadtester::args::HttpMethod;
use loadtester::config::LoadConfig;
use loadtester::engine::{RunStatus, RunSummary, ScenarioRunner};
use loadtester::error::{AppError, MetricsError};
use loadtester::http::ClientSettings;
use loadtester::metrics::{InMemoryRecorder, MetricTitles, MetricsHub, MetricsRecorder};
use tokio_util::sync::CancellationToken;

use support_single::{refused_url, spawn_http_server_or_skip};

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

async fn run_scenario(
    hub: &MetricsHub,
    run_id: &str,
    config: &LoadConfig,
    cancel_after: Duration,
) -> Result<(RunSummary, Arc<InMemoryRecorder>), String> {
    let recorder = hub.reserve(run_id).map_err(|err| err.to_string())?;
    let shared: Arc<dyn MetricsRecorder> = recorder.clone();
    let runner = ScenarioRunner::new(run_id, shared, &ClientSettings::default())
        .map_err(|err| err.to_string())?;

    let token = CancellationToken::new();
    let deadline = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(cancel_after).await;
        deadline.cancel();
    });

    let summary = runner
        .run(token, config)
        .await
        .map_err(|err| err.to_string())?;
    Ok((summary, recorder))
}

struct Totals {
    success: u64,
    fail: u64,
    other_fail: u64,
    latency: u64,
}

fn totals(recorder: &InMemoryRecorder) -> Totals {
    let titles = MetricTitles::http();
    Totals {
        success: recorder.counter(titles.success).unwrap_or(0),
        fail: recorder.counter(titles.fail).unwrap_or(0),
        other_fail: recorder.counter(titles.other_fail).unwrap_or(0),
        latency: recorder.histogram_count(titles.latency).unwrap_or(0),
    }
}

#[test]
fn e2e_ok_target() -> Result<(), String> {
    let Some((url, server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };
    run_async_test(async move {
        let hub = MetricsHub::new();
        let config = LoadConfig::new(url, HttpMethod::Get, 5);
        let (summary, recorder) =
            run_scenario(&hub, "e2e-ok", &config, Duration::from_millis(400)).await?;
        let totals = totals(&recorder);

        if summary.status() != RunStatus::Cancelled {
            return Err(format!("Unexpected status {:?}", summary.status()));
        }
        if totals.success == 0 || totals.fail != 0 || totals.other_fail != 0 {
            return Err(format!(
                "Unexpected totals: ok={} fail={} other={}",
                totals.success, totals.fail, totals.other_fail
            ));
        }
        if totals.latency != totals.success || totals.success != summary.manager.attempts {
            return Err("Latency samples, successes and attempts differ".to_owned());
        }
        let hits = u64::try_from(server.hits()).map_err(|err| err.to_string())?;
        if hits != totals.success {
            return Err(format!("Server saw {} requests, recorded {}", hits, totals.success));
        }
        Ok(())
    })
}

#[test]
fn e2e_failing_target() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(500)? else {
        return Ok(());
    };
    run_async_test(async move {
        let hub = MetricsHub::new();
        let config = LoadConfig::new(url, HttpMethod::Post, 3).with_post_data("payload".into());
        let (summary, recorder) =
            run_scenario(&hub, "e2e-fail", &config, Duration::from_millis(300)).await?;
        let totals = totals(&recorder);

        if totals.fail == 0 || totals.success != 0 || totals.other_fail != 0 {
            return Err(format!(
                "Unexpected totals: ok={} fail={} other={}",
                totals.success, totals.fail, totals.other_fail
            ));
        }
        if totals.fail != summary.manager.attempts || totals.latency != totals.fail {
            return Err("Every attempt should be an application failure".to_owned());
        }
        Ok(())
    })
}

#[test]
fn e2e_unreachable_target() -> Result<(), String> {
    let url = refused_url()?;
    run_async_test(async move {
        let hub = MetricsHub::new();
        let config = LoadConfig::new(url, HttpMethod::Get, 2);
        let (summary, recorder) =
            run_scenario(&hub, "e2e-refused", &config, Duration::from_millis(200)).await?;
        let totals = totals(&recorder);

        if totals.other_fail == 0 || totals.success != 0 || totals.fail != 0 {
            return Err(format!(
                "Unexpected totals: ok={} fail={} other={}",
                totals.success, totals.fail, totals.other_fail
            ));
        }
        if totals.other_fail != summary.manager.attempts || totals.latency != totals.other_fail {
            return Err("Every attempt should be a transport failure".to_owned());
        }
        Ok(())
    })
}

#[test]
fn e2e_run_ids_are_not_shared() -> Result<(), String> {
    let hub = MetricsHub::new();
    hub.reserve("e2e-shared").map_err(|err| err.to_string())?;
    match hub.reserve("e2e-shared") {
        Err(MetricsError::NamespaceInUse { run_id }) if run_id == "e2e-shared" => {}
        Err(err) => return Err(format!("Unexpected error: {}", err)),
        Ok(_) => return Err("Expected the run id to be rejected".to_owned()),
    }

    let released = hub.release("e2e-shared");
    if released.is_none() || hub.reserve("e2e-shared").is_err() {
        return Err("Released run id should be reusable".to_owned());
    }
    Ok(())
}

#[test]
fn e2e_bad_config_never_starts() -> Result<(), String> {
    run_async_test(async {
        let hub = MetricsHub::new();
        let config = LoadConfig::new("http://localhost:1/", HttpMethod::Get, 0);
        match run_scenario(&hub, "e2e-bad", &config, Duration::from_millis(50)).await {
            Err(message) if message.contains(">= 1") => Ok(()),
            Err(message) => Err(format!("Unexpected error: {}", message)),
            Ok(_) => Err("Expected zero clients to fail".to_owned()),
        }
    })?;

    let recorder = Arc::new(InMemoryRecorder::new());
    let shared: Arc<dyn MetricsRecorder> = recorder;
    match ScenarioRunner::new("", shared, &ClientSettings::default()) {
        Err(AppError::Metrics(MetricsError::EmptyRunId)) => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected empty run id to fail".to_owned()),
    }
}
