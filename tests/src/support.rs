//! Fakes for the pipeline's collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sweepr_common::config::PipelineConfig;
use sweepr_common::error::{ScanError, SinkError};
use sweepr_common::network::target::Target;
use sweepr_common::ports::{PipelineObserver, RecordSink, ScanOperation};
use sweepr_common::record::Record;
use sweepr_common::scan::{RawScanResult, ScannedHost};
use sweepr_common::summary::PipelineSummary;
use sweepr_core::sources::StaticSource;
use sweepr_core::Pipeline;
use tokio_util::sync::CancellationToken;

pub fn targets(ids: &[&str]) -> Vec<Target> {
    ids.iter().map(|id| Target::new(*id)).collect()
}

pub fn numbered_targets(n: usize) -> Vec<Target> {
    (1..=n).map(|i| Target::new(format!("10.0.{}.{}", i / 250, i % 250))).collect()
}

pub fn source(targets: Vec<Target>) -> StaticSource {
    StaticSource::new(targets)
}

#[derive(Clone)]
pub enum Outcome {
    Hosts(Vec<ScannedHost>),
    Fail,
    /// Never completes; ignores its cancellation token.
    Hang,
    /// Completes only when cancelled.
    WaitForCancel,
}

/// Scan operation answering from a script, recording every invocation.
///
/// Targets without a scripted outcome report one host with port 80 open.
#[derive(Clone, Default)]
pub struct ScriptedScanner {
    script: HashMap<Target, Outcome>,
    delay: Duration,
    calls: Arc<Mutex<Vec<Target>>>,
}

impl ScriptedScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, target: &str, outcome: Outcome) -> Self {
        self.script.insert(Target::new(target), outcome);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Target> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScanOperation for ScriptedScanner {
    async fn scan(
        &self,
        target: &Target,
        cancel: CancellationToken,
    ) -> Result<RawScanResult, ScanError> {
        self.calls.lock().unwrap().push(target.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self.script.get(target).cloned().unwrap_or_else(|| {
            Outcome::Hosts(vec![ScannedHost::new(target.as_str()).with_port(80, "tcp", "open")])
        });

        match outcome {
            Outcome::Hosts(hosts) => Ok(RawScanResult { hosts }),
            Outcome::Fail => Err(ScanError::Failed {
                target: target.clone(),
                reason: "scripted failure".into(),
            }),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(RawScanResult::default())
            }
            Outcome::WaitForCancel => {
                cancel.cancelled().await;
                Err(ScanError::Cancelled {
                    target: target.clone(),
                })
            }
        }
    }
}

/// Sink that records what it receives and detects overlapping appends.
#[derive(Clone, Default)]
pub struct GuardedSink {
    records: Arc<Mutex<Vec<Record>>>,
    in_flight: Arc<AtomicUsize>,
    overlapped: Arc<AtomicBool>,
    fail_subjects: Arc<HashSet<String>>,
    delay: Duration,
}

impl GuardedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_on(mut self, subjects: &[&str]) -> Self {
        self.fail_subjects = Arc::new(subjects.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSink for GuardedSink {
    async fn append(&mut self, record: Record) -> Result<(), SinkError> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let result = if self.fail_subjects.contains(&record.subject) {
            Err(SinkError::new(&record.subject, "scripted write failure"))
        } else {
            self.records.lock().unwrap().push(record);
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { targets: usize, workers: usize },
    ScanFinished { target: Target, records: usize },
    ScanFailed { target: Target, timed_out: bool },
    Persisted { subject: String },
    PersistFailed { subject: String },
    Finished { summary: PipelineSummary },
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn failed_targets(&self) -> Vec<Target> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ScanFailed { target, .. } => Some(target),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl PipelineObserver for RecordingObserver {
    fn pipeline_started(&self, targets: usize, workers: usize) {
        self.push(Event::Started { targets, workers });
    }

    fn scan_finished(&self, target: &Target, _elapsed: Duration, records: usize) {
        self.push(Event::ScanFinished {
            target: target.clone(),
            records,
        });
    }

    fn scan_failed(&self, error: &ScanError, _elapsed: Duration) {
        self.push(Event::ScanFailed {
            target: error.target().clone(),
            timed_out: matches!(error, ScanError::TimedOut { .. }),
        });
    }

    fn record_persisted(&self, subject: &str) {
        self.push(Event::Persisted {
            subject: subject.to_string(),
        });
    }

    fn persist_failed(&self, error: &SinkError) {
        self.push(Event::PersistFailed {
            subject: error.subject.clone(),
        });
    }

    fn pipeline_finished(&self, summary: &PipelineSummary) {
        self.push(Event::Finished {
            summary: summary.clone(),
        });
    }
}

pub fn pipeline(
    config: PipelineConfig,
    scanner: &ScriptedScanner,
    sink: &GuardedSink,
    observer: &RecordingObserver,
) -> Pipeline {
    Pipeline::new(
        config,
        Arc::new(scanner.clone()),
        Box::new(sink.clone()),
        Arc::new(observer.clone()),
    )
}

pub fn workers(workers: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        ..Default::default()
    }
}
