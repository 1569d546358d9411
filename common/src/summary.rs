use std::fmt;
use std::time::Duration;

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub targets: usize,
    pub scanned: usize,
    pub failed: usize,
    /// Targets never handed to a worker because the run was interrupted.
    pub skipped: usize,
    pub records: usize,
    pub persisted: usize,
    pub persist_failures: usize,
    pub elapsed: Duration,
}

impl PipelineSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.persist_failures == 0
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} targets scanned ({} failed, {} skipped), {}/{} records persisted in {:.2}s",
            self.scanned,
            self.targets,
            self.failed,
            self.skipped,
            self.persisted,
            self.records,
            self.elapsed.as_secs_f64()
        )
    }
}
