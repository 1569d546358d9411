//! Every target is scanned once, and every record reaches the sink once.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use sweepr_common::config::PipelineConfig;
use sweepr_common::scan::ScannedHost;
use sweepr_core::sink::JsonLinesSink;
use sweepr_core::sources::ExpressionSource;
use sweepr_core::Pipeline;
use tokio_util::sync::CancellationToken;

use crate::support::*;

#[tokio::test]
async fn every_target_is_scanned_exactly_once() {
    for w in [1, 3, 8] {
        let scanner = ScriptedScanner::new().with_delay(Duration::from_millis(1));
        let sink = GuardedSink::new();
        let observer = RecordingObserver::new();
        let all = numbered_targets(25);

        let summary = pipeline(workers(w), &scanner, &sink, &observer)
            .run(&source(all.clone()), CancellationToken::new())
            .await
            .unwrap();

        let mut calls = scanner.calls();
        calls.sort();
        let mut expected = all.clone();
        expected.sort();
        assert_eq!(calls, expected, "workers = {w}");

        assert_eq!(summary.targets, 25);
        assert_eq!(summary.scanned, 25);
        assert_eq!(summary.skipped, 0);
        assert_eq!(sink.records().len(), 25);
        assert_eq!(
            observer.events().first(),
            Some(&Event::Started {
                targets: 25,
                workers: w
            })
        );
    }
}

#[tokio::test]
async fn one_failed_scan_does_not_affect_the_others() {
    let scanner = ScriptedScanner::new().on("10.0.0.3", Outcome::Fail);
    let sink = GuardedSink::new();
    let observer = RecordingObserver::new();
    let all = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]);

    let summary = pipeline(workers(3), &scanner, &sink, &observer)
        .run(&source(all), CancellationToken::new())
        .await
        .unwrap();

    let mut subjects: Vec<String> = sink.records().into_iter().map(|r| r.subject).collect();
    subjects.sort();
    assert_eq!(subjects, ["10.0.0.1", "10.0.0.2", "10.0.0.4", "10.0.0.5"]);
    assert_eq!(observer.failed_targets(), targets(&["10.0.0.3"]));
    assert_eq!(summary.scanned, 4);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn sink_is_never_entered_concurrently() {
    let scanner = ScriptedScanner::new();
    let sink = GuardedSink::new().with_delay(Duration::from_millis(2));
    let observer = RecordingObserver::new();

    let summary = pipeline(workers(8), &scanner, &sink, &observer)
        .run(&source(numbered_targets(32)), CancellationToken::new())
        .await
        .unwrap();

    assert!(!sink.overlapped());
    assert_eq!(sink.records().len(), 32);
    assert_eq!(summary.persisted, 32);
}

#[tokio::test]
async fn only_open_ports_are_recorded() {
    let scanner = ScriptedScanner::new()
        .on(
            "10.0.0.1",
            Outcome::Hosts(vec![
                ScannedHost::new("10.0.0.1")
                    .with_port(80, "tcp", "open")
                    .with_port(81, "tcp", "closed"),
            ]),
        )
        .on("10.0.0.2", Outcome::Fail);
    let sink = GuardedSink::new();
    let observer = RecordingObserver::new();

    pipeline(workers(1), &scanner, &sink, &observer)
        .run(&source(targets(&["10.0.0.1", "10.0.0.2"])), CancellationToken::new())
        .await
        .unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(
        serde_json::to_value(&records[0]).unwrap(),
        json!({
            "host": "10.0.0.1",
            "tcp": { "80": { "state": "open" } },
            "udp": {}
        })
    );
    assert_eq!(observer.failed_targets(), targets(&["10.0.0.2"]));
}

#[tokio::test]
async fn full_output_queue_slows_workers_down_without_dropping() {
    let mut scanner = ScriptedScanner::new();
    for target in numbered_targets(8) {
        let hosts = (1..=3)
            .map(|i| ScannedHost::new(format!("{target}-{i}")).with_port(443, "tcp", "open"))
            .collect();
        scanner = scanner.on(target.as_str(), Outcome::Hosts(hosts));
    }
    let sink = GuardedSink::new().with_delay(Duration::from_millis(5));
    let observer = RecordingObserver::new();
    let config = PipelineConfig {
        workers: 4,
        result_capacity: 1,
        ..Default::default()
    };

    let summary = pipeline(config, &scanner, &sink, &observer)
        .run(&source(numbered_targets(8)), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.records, 24);
    assert_eq!(summary.persisted, 24);
    assert_eq!(sink.records().len(), 24);
}

#[tokio::test]
async fn failed_writes_are_reported_and_skipped() {
    let scanner = ScriptedScanner::new();
    let sink = GuardedSink::new().failing_on(&["10.0.0.3"]);
    let observer = RecordingObserver::new();

    let summary = pipeline(workers(2), &scanner, &sink, &observer)
        .run(
            &source(targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"])),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.persisted, 4);
    assert_eq!(summary.persist_failures, 1);
    assert!(!summary.is_clean());
    assert!(observer.events().contains(&Event::PersistFailed {
        subject: "10.0.0.3".into()
    }));
}

#[tokio::test]
async fn json_lines_file_end_to_end() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.jsonl");
    let sink = JsonLinesSink::create(&path).await?;

    let pipeline = Pipeline::new(
        workers(2),
        Arc::new(ScriptedScanner::new()),
        Box::new(sink),
        Arc::new(RecordingObserver::new()),
    );
    let summary = pipeline
        .run(&ExpressionSource::new(["10.0.0.1-3"]), CancellationToken::new())
        .await?;
    assert_eq!(summary.persisted, 3);

    let written = std::fs::read_to_string(&path)?;
    let mut hosts = written
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|value| value["host"].as_str().unwrap_or_default().to_string())
        .collect::<Vec<_>>();
    hosts.sort();
    assert_eq!(hosts, ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
    Ok(())
}
