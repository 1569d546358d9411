//! Structured-log implementation of the pipeline's observability channel.

use std::time::Duration;

use sweepr_common::error::{ScanError, SinkError};
use sweepr_common::network::target::Target;
use sweepr_common::ports::PipelineObserver;
use sweepr_common::summary::PipelineSummary;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn pipeline_started(&self, targets: usize, workers: usize) {
        info!(targets, workers, "scan pipeline started");
    }

    fn scan_finished(&self, target: &Target, elapsed: Duration, records: usize) {
        info!(host = %target, elapsed = ?elapsed, records, "scan finished");
    }

    fn scan_failed(&self, err: &ScanError, elapsed: Duration) {
        match err {
            ScanError::Cancelled { .. } => {
                warn!(host = %err.target(), elapsed = ?elapsed, "scan cancelled")
            }
            _ => error!(host = %err.target(), elapsed = ?elapsed, error = %err, "scan failed"),
        }
    }

    fn record_persisted(&self, subject: &str) {
        debug!(host = subject, "record saved");
    }

    fn persist_failed(&self, err: &SinkError) {
        error!(host = %err.subject, error = %err, "could not save record");
    }

    fn pipeline_finished(&self, summary: &PipelineSummary) {
        if summary.is_clean() {
            info!(%summary, "scan pipeline complete");
        } else {
            warn!(%summary, "scan pipeline complete with errors");
        }
    }
}
