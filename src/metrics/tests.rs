use super::*;
use crate::error::MetricsError;
use std::sync::Arc;
use std::thread;

const RUN_ID: &str = "run-42";

fn registered() -> Result<(InMemoryRecorder, MetricTitles), MetricsError> {
    let recorder = InMemoryRecorder::new();
    let titles = MetricTitles::http();
    recorder.register(&http_metric_groups(RUN_ID, &titles), RUN_ID)?;
    Ok((recorder, titles))
}

#[test]
fn http_groups_match_export_layout() -> Result<(), MetricsError> {
    let groups = http_metric_groups(RUN_ID, &MetricTitles::http());
    let [group] = groups.as_slice() else {
        return Err("Expected exactly one group".into());
    };
    if group.name != "HTTP (run-42)" {
        return Err(format!("Unexpected group name {}", group.name).into());
    }
    let [response, latency] = group.graphs.as_slice() else {
        return Err("Expected two graphs".into());
    };
    if response.title != "HTTP Response" || response.unit != "N" {
        return Err("Unexpected response graph header".into());
    }
    let counters: Vec<(&str, MetricKind)> = response
        .metrics
        .iter()
        .map(|metric| (metric.title.as_str(), metric.kind))
        .collect();
    if counters
        != [
            (".http_ok", MetricKind::Counter),
            (".http_fail", MetricKind::Counter),
            (".http_other_fail", MetricKind::Counter),
        ]
    {
        return Err(format!("Unexpected counters {:?}", counters).into());
    }
    if latency.title != "Latency" || latency.unit != "Microsecond" {
        return Err("Unexpected latency graph header".into());
    }
    if latency.metrics != [Metric::histogram(".latency")] {
        return Err("Unexpected latency metrics".into());
    }
    Ok(())
}

#[test]
fn counters_accumulate_values() -> Result<(), MetricsError> {
    let (recorder, titles) = registered()?;
    recorder.notify(titles.success, 1);
    recorder.notify(titles.success, 1);
    recorder.notify(titles.fail, 3);

    if recorder.counter(titles.success) != Some(2) {
        return Err("Expected success == 2".into());
    }
    if recorder.counter(titles.fail) != Some(3) {
        return Err("Expected fail == 3".into());
    }
    if recorder.counter(titles.other_fail) != Some(0) {
        return Err("Expected other_fail == 0".into());
    }
    Ok(())
}

#[test]
fn histogram_keeps_every_sample() -> Result<(), MetricsError> {
    let (recorder, titles) = registered()?;
    for latency_us in [100, 200, 300, 400, 10_000] {
        recorder.notify(titles.latency, latency_us);
    }

    let hist = recorder
        .histogram(titles.latency)
        .ok_or(MetricsError::TestExpectation {
            message: "latency histogram missing",
        })?;
    if hist.count() != 5 {
        return Err(format!("Expected 5 samples, got {}", hist.count()).into());
    }
    if hist.min() != 100 {
        return Err(format!("Unexpected min {}", hist.min()).into());
    }
    let (p50, _, p99) = hist.percentiles();
    if !(299..=301).contains(&p50) {
        return Err(format!("Unexpected p50 {}", p50).into());
    }
    if p99 < 9_990 {
        return Err(format!("Unexpected p99 {}", p99).into());
    }
    Ok(())
}

#[test]
fn second_registration_is_rejected() -> Result<(), MetricsError> {
    let (recorder, titles) = registered()?;
    match recorder.register(&http_metric_groups("other", &titles), "other") {
        Err(MetricsError::AlreadyRegistered { .. }) => {}
        other => return Err(format!("Expected AlreadyRegistered, got {:?}", other).into()),
    }
    if recorder.run_id() != Some(RUN_ID) {
        return Err("Original namespace must be kept".into());
    }
    Ok(())
}

#[test]
fn duplicate_title_is_rejected() -> Result<(), MetricsError> {
    let groups = vec![MetricGroup {
        name: "dup".to_owned(),
        graphs: vec![
            Graph {
                title: "a".to_owned(),
                unit: "N".to_owned(),
                metrics: vec![Metric::counter(".x")],
            },
            Graph {
                title: "b".to_owned(),
                unit: "N".to_owned(),
                metrics: vec![Metric::histogram(".x")],
            },
        ],
    }];
    let recorder = InMemoryRecorder::new();
    match recorder.register(&groups, RUN_ID) {
        Err(MetricsError::DuplicateMetric { title, .. }) if title == ".x" => {}
        other => return Err(format!("Expected DuplicateMetric, got {:?}", other).into()),
    }
    if recorder.run_id().is_some() {
        return Err("Failed registration must not claim the namespace".into());
    }
    Ok(())
}

#[test]
fn empty_run_id_is_rejected() -> Result<(), MetricsError> {
    let recorder = InMemoryRecorder::new();
    let groups = http_metric_groups("", &MetricTitles::http());
    if !matches!(recorder.register(&groups, " "), Err(MetricsError::EmptyRunId)) {
        return Err("Expected EmptyRunId".into());
    }
    Ok(())
}

#[test]
fn unknown_and_early_notifications_are_dropped() -> Result<(), MetricsError> {
    let recorder = InMemoryRecorder::new();
    recorder.notify(SUCCESS_SUFFIX, 1);
    recorder.register(&http_metric_groups(RUN_ID, &MetricTitles::http()), RUN_ID)?;
    recorder.notify(".nope", 1);

    if recorder.dropped_notifications() != 2 {
        return Err(format!(
            "Expected 2 dropped, got {}",
            recorder.dropped_notifications()
        )
        .into());
    }
    if recorder.counter(SUCCESS_SUFFIX) != Some(0) {
        return Err("Early notification must not be counted".into());
    }
    Ok(())
}

#[test]
fn concurrent_notifications_are_not_lost() -> Result<(), MetricsError> {
    const THREADS: u64 = 8;
    const PER_THREAD: u64 = 2_000;

    let (recorder, titles) = registered()?;
    let recorder = Arc::new(recorder);
    let mut handles = Vec::new();
    for worker in 0..THREADS {
        let recorder = Arc::clone(&recorder);
        handles.push(thread::spawn(move || {
            for sample in 0..PER_THREAD {
                recorder.notify(titles.success, 1);
                let latency_us = worker.saturating_mul(1_000).saturating_add(sample);
                recorder.notify(titles.latency, latency_us);
            }
        }));
    }
    for handle in handles {
        if handle.join().is_err() {
            return Err("Worker thread panicked".into());
        }
    }

    let expected = THREADS.saturating_mul(PER_THREAD);
    if recorder.counter(titles.success) != Some(expected) {
        return Err(format!(
            "Expected {} increments, got {:?}",
            expected,
            recorder.counter(titles.success)
        )
        .into());
    }
    if recorder.histogram_count(titles.latency) != Some(expected) {
        return Err("Histogram lost samples".into());
    }
    Ok(())
}

#[test]
fn snapshot_follows_declaration_order() -> Result<(), MetricsError> {
    let (recorder, titles) = registered()?;
    recorder.notify(titles.other_fail, 1);
    recorder.notify(titles.latency, 1_500);

    let snapshot = recorder.snapshot()?.ok_or(MetricsError::TestExpectation {
        message: "snapshot missing",
    })?;
    let order: Vec<&str> = snapshot
        .metrics()
        .map(|metric| metric.title.as_str())
        .collect();
    if order != [".http_ok", ".http_fail", ".http_other_fail", ".latency"] {
        return Err(format!("Unexpected order {:?}", order).into());
    }
    if snapshot.counter(titles.other_fail) != Some(1) {
        return Err("Expected other_fail == 1".into());
    }
    let latency = snapshot
        .histogram(titles.latency)
        .ok_or(MetricsError::TestExpectation {
            message: "latency summary missing",
        })?;
    if latency.count != 1 {
        return Err("Expected one latency sample".into());
    }
    let decoded = LatencyHistogram::decode_base64(&latency.encoded)?;
    if decoded.count() != 1 {
        return Err("Encoded histogram must carry the sample".into());
    }
    Ok(())
}

#[test]
fn snapshot_is_empty_before_registration() -> Result<(), MetricsError> {
    if InMemoryRecorder::new().snapshot()?.is_some() {
        return Err("Expected no snapshot".into());
    }
    Ok(())
}

#[test]
fn hub_refuses_reused_run_id() -> Result<(), MetricsError> {
    let hub = MetricsHub::new();
    let first = hub.reserve(RUN_ID)?;
    match hub.reserve(RUN_ID) {
        Err(MetricsError::NamespaceInUse { run_id }) if run_id == RUN_ID => {}
        other => return Err(format!("Expected NamespaceInUse, got {:?}", other).into()),
    }

    let held = hub.get(RUN_ID).ok_or(MetricsError::TestExpectation {
        message: "reserved namespace missing",
    })?;
    if !Arc::ptr_eq(&first, &held) {
        return Err("Hub must return the reserved recorder".into());
    }

    if hub.release(RUN_ID).is_none() {
        return Err("Expected release to return the recorder".into());
    }
    let _again = hub.reserve(RUN_ID)?;
    if hub.run_ids() != [RUN_ID.to_owned()] {
        return Err("Expected only the re-reserved run".into());
    }
    Ok(())
}
