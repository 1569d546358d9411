//! # Scan Pipeline
//!
//! Owns both queues and both wait points of a run, and is the only place that
//! knows the shutdown order:
//!
//! 1. Size the input queue to the target count and bound the output queue.
//! 2. Start the aggregator, so records can drain before anyone produces them.
//! 3. Start the workers.
//! 4. Enqueue every target, then close the input queue.
//! 5. Wait for every worker to exit.
//! 6. Close the output queue. Only safe after 5, workers may still be sending.
//! 7. Wait for the aggregator to persist whatever is left.
//!
//! Cancellation (external token or the pipeline deadline) only shortens step 5:
//! workers stop taking targets and abandon in-flight scans, while steps 6 and 7
//! still run so queued records are never lost.

mod aggregator;
mod worker;

use std::sync::Arc;

use sweepr_common::config::{PipelineConfig, RecordFilter};
use sweepr_common::error::{EnumerationError, PipelineError};
use sweepr_common::ports::{PipelineObserver, RecordSink, ScanOperation, TargetSource};
use sweepr_common::record::Record;
use sweepr_common::summary::PipelineSummary;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::normalizer::Normalizer;
use aggregator::AggregatorStats;
use worker::{WorkerContext, WorkerStats};

/// A configured, single-use scan pipeline.
///
/// Collaborators are injected here rather than looked up globally, which keeps
/// every stage testable with fakes.
pub struct Pipeline {
    config: PipelineConfig,
    scanner: Arc<dyn ScanOperation>,
    normalizer: Normalizer,
    sink: Box<dyn RecordSink>,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        scanner: Arc<dyn ScanOperation>,
        sink: Box<dyn RecordSink>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            config,
            scanner,
            normalizer: Normalizer::default(),
            sink,
            observer,
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.normalizer = Normalizer::new(filter);
        self
    }

    /// Enumerates targets from `source` and runs them through the pipeline.
    ///
    /// Returns the run summary. A cancelled or timed-out run still persists
    /// every record produced before the interruption and returns its partial
    /// summary inside the error. Enumeration failures abort before any worker
    /// starts. If the aggregator dies, every record it never persisted counts
    /// as a persist failure and the run ends with [`PipelineError::Aggregator`].
    pub async fn run(
        self,
        source: &dyn TargetSource,
        cancel: CancellationToken,
    ) -> Result<PipelineSummary, PipelineError> {
        let targets = source.targets()?;
        if targets.is_empty() {
            return Err(EnumerationError::Empty.into());
        }

        let started = Instant::now();
        let total = targets.len();
        let workers = self.config.worker_count();
        let run_token = cancel.child_token();
        self.observer.pipeline_started(total, workers);

        // 1.
        let (target_tx, target_rx) = mpsc::channel(total);
        let (record_tx, record_rx) = mpsc::channel::<Record>(self.config.queue_capacity());
        let target_rx = Arc::new(Mutex::new(target_rx));

        // 2.
        let sink_stats = Arc::new(AggregatorStats::default());
        let aggregator = tokio::spawn(aggregator::run(
            self.sink,
            record_rx,
            self.observer.clone(),
            sink_stats.clone(),
        ));

        // 3.
        let ctx = WorkerContext {
            scanner: self.scanner,
            normalizer: Arc::new(self.normalizer),
            observer: self.observer.clone(),
            targets: target_rx.clone(),
            records: record_tx.clone(),
            scan_timeout: self.config.scan_timeout,
            cancel: run_token.clone(),
        };
        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker::run(worker_id, ctx.clone()));
        }
        drop(ctx);

        // 4. The queue holds every target, so none of these sends wait.
        for target in targets {
            if target_tx.send(target).await.is_err() {
                break;
            }
        }
        drop(target_tx);

        // 5.
        let mut timed_out = false;
        let worker_stats = {
            let all_done = join_workers(&mut pool);
            tokio::pin!(all_done);
            match self.config.pipeline_timeout {
                Some(limit) => tokio::select! {
                    stats = &mut all_done => stats,
                    _ = tokio::time::sleep_until(started + limit) => {
                        timed_out = true;
                        info!(timeout = ?limit, "pipeline deadline reached, cancelling");
                        run_token.cancel();
                        all_done.await
                    }
                },
                None => all_done.await,
            }
        };
        let skipped = drain_unclaimed(&target_rx).await;

        // 6.
        drop(record_tx);

        // 7.
        let aggregator_died = match aggregator.await {
            Ok(()) => false,
            Err(err) => {
                error!(error = %err, "aggregator task failed");
                true
            }
        };

        let sink_lost = aggregator_died || worker_stats.undelivered > 0;
        let records = worker_stats.records + worker_stats.undelivered;
        let persisted = sink_stats.persisted();
        let persist_failures = if sink_lost {
            records.saturating_sub(persisted)
        } else {
            sink_stats.failures()
        };

        let summary = PipelineSummary {
            targets: total,
            scanned: worker_stats.scanned,
            failed: worker_stats.failed,
            skipped,
            records,
            persisted,
            persist_failures,
            elapsed: started.elapsed(),
        };
        self.observer.pipeline_finished(&summary);

        // A cancel that arrives after the last target finished interrupted nothing.
        let interrupted = summary.skipped > 0 || worker_stats.cancelled > 0;

        match self.config.pipeline_timeout {
            _ if sink_lost => Err(PipelineError::Aggregator { summary }),
            Some(timeout) if timed_out => Err(PipelineError::TimedOut { timeout, summary }),
            _ if cancel.is_cancelled() && interrupted => Err(PipelineError::Cancelled { summary }),
            _ => Ok(summary),
        }
    }
}

async fn join_workers(pool: &mut JoinSet<WorkerStats>) -> WorkerStats {
    let mut total = WorkerStats::default();
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(stats) => total.merge(stats),
            Err(err) => error!(error = %err, "worker task failed"),
        }
    }
    total
}

/// Counts targets no worker claimed before the pool shut down.
async fn drain_unclaimed(queue: &worker::TargetQueue) -> usize {
    let mut rx = queue.lock().await;
    let mut skipped = 0;
    while rx.try_recv().is_ok() {
        skipped += 1;
    }
    skipped
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
