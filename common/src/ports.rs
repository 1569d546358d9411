//! # Outbound Ports
//!
//! Contracts for everything the pipeline engine calls but does not own.
//!
//! ## Rules
//! 1. All items here must be `traits`.
//! 2. No concrete implementations allowed; those live in `sweepr-core` adapters
//!    or in test fakes.
//! 3. Collaborators are injected into the pipeline at construction, never
//!    reached through globals.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{EnumerationError, ScanError, SinkError};
use crate::network::target::Target;
use crate::record::Record;
use crate::scan::RawScanResult;
use crate::summary::PipelineSummary;

/// Supplies the initial, ordered list of targets.
pub trait TargetSource: Send + Sync {
    fn targets(&self) -> Result<Vec<Target>, EnumerationError>;
}

/// Probes one target.
///
/// May take minutes. Implementations must return promptly with
/// [`ScanError::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait ScanOperation: Send + Sync {
    async fn scan(
        &self,
        target: &Target,
        cancel: CancellationToken,
    ) -> Result<RawScanResult, ScanError>;
}

/// Durable destination for records.
///
/// `&mut self` makes the single-writer discipline part of the type: whoever
/// holds the sink is the only one appending to it.
#[async_trait]
pub trait RecordSink: Send {
    async fn append(&mut self, record: Record) -> Result<(), SinkError>;
}

/// Observability channel of the pipeline.
///
/// Every failure path of the engine is routed through here. All methods default
/// to doing nothing.
pub trait PipelineObserver: Send + Sync {
    fn pipeline_started(&self, _targets: usize, _workers: usize) {}

    fn scan_finished(&self, _target: &Target, _elapsed: Duration, _records: usize) {}

    fn scan_failed(&self, _error: &ScanError, _elapsed: Duration) {}

    fn record_persisted(&self, _subject: &str) {}

    fn persist_failed(&self, _error: &SinkError) {}

    fn pipeline_finished(&self, _summary: &PipelineSummary) {}
}
