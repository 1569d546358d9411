//! Error taxonomy of the scan pipeline.
//!
//! Failures scoped to one unit of work ([`ScanError`] for a target, [`SinkError`]
//! for a record) are reported and recovered from. Only [`EnumerationError`] stops
//! a run before it starts.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::network::target::Target;
use crate::summary::PipelineSummary;

/// A probe against one target did not produce a usable result.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan of {target} failed: {reason}")]
    Failed { target: Target, reason: String },

    #[error("could not launch scanner for {target}: {source}")]
    Spawn {
        target: Target,
        #[source]
        source: std::io::Error,
    },

    #[error("scanner returned malformed output for {target}: {reason}")]
    Malformed { target: Target, reason: String },

    #[error("scan of {target} exceeded its {timeout:?} deadline")]
    TimedOut { target: Target, timeout: Duration },

    #[error("scan of {target} was cancelled")]
    Cancelled { target: Target },
}

impl ScanError {
    pub fn target(&self) -> &Target {
        match self {
            ScanError::Failed { target, .. }
            | ScanError::Spawn { target, .. }
            | ScanError::Malformed { target, .. }
            | ScanError::TimedOut { target, .. }
            | ScanError::Cancelled { target } => target,
        }
    }
}

/// Persisting one record failed.
#[derive(Debug, Error)]
#[error("failed to persist record for {subject}: {source}")]
pub struct SinkError {
    pub subject: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl SinkError {
    pub fn new(
        subject: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            source: source.into(),
        }
    }
}

/// The initial target list could not be obtained.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("could not read targets from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("target document {origin} has an unexpected shape: {reason}")]
    InvalidDocument { origin: String, reason: String },

    #[error("invalid target expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    #[error("target source produced no targets")]
    Empty,
}

/// Outcome of a run that did not complete normally.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error("pipeline cancelled: {summary}")]
    Cancelled { summary: PipelineSummary },

    #[error("pipeline exceeded its {timeout:?} deadline: {summary}")]
    TimedOut {
        timeout: Duration,
        summary: PipelineSummary,
    },

    /// The aggregator died before draining the output queue. Records it never
    /// persisted are counted in `persist_failures`.
    #[error("record aggregator stopped before the run finished: {summary}")]
    Aggregator { summary: PipelineSummary },
}

impl PipelineError {
    /// Partial summary of an interrupted run, if the pipeline got that far.
    pub fn summary(&self) -> Option<&PipelineSummary> {
        match self {
            PipelineError::Enumeration(_) => None,
            PipelineError::Cancelled { summary }
            | PipelineError::TimedOut { summary, .. }
            | PipelineError::Aggregator { summary } => Some(summary),
        }
    }
}
