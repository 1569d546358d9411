//! A single executor of the worker pool.
//!
//! Each worker pulls one target at a time from the shared input queue, runs the
//! scan operation, normalizes the result and forwards the records. A failed
//! target is reported and skipped; it never stops the worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sweepr_common::error::ScanError;
use sweepr_common::network::target::Target;
use sweepr_common::ports::{PipelineObserver, ScanOperation};
use sweepr_common::record::Record;
use sweepr_common::scan::RawScanResult;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::normalizer::Normalizer;

pub(crate) type TargetQueue = Arc<Mutex<mpsc::Receiver<Target>>>;

#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub scanner: Arc<dyn ScanOperation>,
    pub normalizer: Arc<Normalizer>,
    pub observer: Arc<dyn PipelineObserver>,
    pub targets: TargetQueue,
    pub records: mpsc::Sender<Record>,
    pub scan_timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerStats {
    pub scanned: usize,
    pub failed: usize,
    /// Failed scans that were abandoned because the run was cancelled.
    pub cancelled: usize,
    pub records: usize,
    /// Records produced but never handed to the aggregator.
    pub undelivered: usize,
}

impl WorkerStats {
    pub fn merge(&mut self, other: WorkerStats) {
        self.scanned += other.scanned;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.records += other.records;
        self.undelivered += other.undelivered;
    }
}

pub(crate) async fn run(worker_id: usize, ctx: WorkerContext) -> WorkerStats {
    let mut stats = WorkerStats::default();

    while let Some(target) = next_target(&ctx).await {
        let started = Instant::now();
        let outcome = scan_target(&ctx, &target).await;
        let elapsed = started.elapsed();

        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                stats.failed += 1;
                if matches!(err, ScanError::Cancelled { .. }) {
                    stats.cancelled += 1;
                }
                ctx.observer.scan_failed(&err, elapsed);
                continue;
            }
        };

        let records = ctx.normalizer.normalize(&raw);
        stats.scanned += 1;
        ctx.observer.scan_finished(&target, elapsed, records.len());

        let mut pending = records.into_iter();
        while let Some(record) = pending.next() {
            // Blocks while the output queue is full.
            if ctx.records.send(record).await.is_err() {
                stats.undelivered += 1 + pending.len();
                warn!(
                    worker = worker_id,
                    host = %target,
                    lost = 1 + pending.len(),
                    "record queue closed, stopping the run"
                );
                // Nothing can be persisted any more; stop the other workers too.
                ctx.cancel.cancel();
                return stats;
            }
            stats.records += 1;
        }
    }

    debug!(worker = worker_id, scanned = stats.scanned, failed = stats.failed, "worker finished");
    stats
}

/// Next queued target, or `None` once the queue is closed and drained or the
/// run is cancelled.
async fn next_target(ctx: &WorkerContext) -> Option<Target> {
    if ctx.cancel.is_cancelled() {
        return None;
    }

    let mut rx = ctx.targets.lock().await;
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        target = rx.recv() => target,
    }
}

async fn scan_target(ctx: &WorkerContext, target: &Target) -> Result<RawScanResult, ScanError> {
    let scan_token = ctx.cancel.child_token();
    let scan = ctx.scanner.scan(target, scan_token.clone());

    let bounded = async {
        match ctx.scan_timeout {
            Some(limit) => match tokio::time::timeout(limit, scan).await {
                Ok(result) => result,
                Err(_) => Err(ScanError::TimedOut {
                    target: target.clone(),
                    timeout: limit,
                }),
            },
            None => scan.await,
        }
    };

    // Dropping the scan future on cancel or timeout releases the worker even
    // if the operation ignores its token.
    let result = tokio::select! {
        result = bounded => result,
        _ = ctx.cancel.cancelled() => Err(ScanError::Cancelled { target: target.clone() }),
    };

    scan_token.cancel();
    result
}
