use sweepr_common::ports::{PipelineObserver, RecordSink};
use sweepr_common::record::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Counters shared with the pipeline, so they survive a panicking sink.
#[derive(Debug, Default)]
pub(crate) struct AggregatorStats {
    persisted: AtomicUsize,
    failures: AtomicUsize,
}

impl AggregatorStats {
    pub fn persisted(&self) -> usize {
        self.persisted.load(Ordering::Acquire)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Acquire)
    }
}

/// Drains the output queue into the sink, one record at a time.
///
/// Only returns once every sender is dropped and the queue is empty, so it
/// must never be tied to the run's cancellation token.
pub(crate) async fn run(
    mut sink: Box<dyn RecordSink>,
    mut records: mpsc::Receiver<Record>,
    observer: Arc<dyn PipelineObserver>,
    stats: Arc<AggregatorStats>,
) {
    while let Some(record) = records.recv().await {
        let subject = record.subject.clone();
        match sink.append(record).await {
            Ok(()) => {
                stats.persisted.fetch_add(1, Ordering::AcqRel);
                observer.record_persisted(&subject);
            }
            Err(err) => {
                stats.failures.fetch_add(1, Ordering::AcqRel);
                observer.persist_failed(&err);
            }
        }
    }

    debug!(persisted = stats.persisted(), failures = stats.failures(), "aggregator drained");
}
