use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_RESULT_CAPACITY: usize = 1000;
pub const DEFAULT_SCANNER: &str = "nmap";
pub const DEFAULT_SCAN_FLAGS: &[&str] = &[
    "-Pn", "-sT", "-T4", "-p-", "-n", "--min-rate", "500", "--max-rate", "2500",
];
pub const DEFAULT_CATEGORIES: &[&str] = &["tcp", "udp"];
pub const DEFAULT_INTERESTING_STATE: &str = "open";

/// Sizing and deadlines of the scan pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent workers.
    ///
    /// Bounds how many scanner processes run at once. Zero is treated as one.
    pub workers: usize,
    /// Capacity of the queue between the workers and the sink.
    ///
    /// Bounds memory held by records that are produced but not yet persisted.
    /// When full, workers wait for the sink to catch up.
    pub result_capacity: usize,
    /// Deadline for a single target's scan.
    pub scan_timeout: Option<Duration>,
    /// Deadline for the whole run.
    pub pipeline_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            result_capacity: DEFAULT_RESULT_CAPACITY,
            scan_timeout: None,
            pipeline_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    pub fn queue_capacity(&self) -> usize {
        self.result_capacity.max(1)
    }
}

/// How the external scanner is invoked.
#[derive(Debug, Clone)]
pub struct ScanProfile {
    pub binary: PathBuf,
    pub flags: Vec<String>,
}

impl Default for ScanProfile {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_SCANNER),
            flags: DEFAULT_SCAN_FLAGS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Which observations survive normalization.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    /// Categories every record carries, empty or not.
    pub categories: Vec<String>,
    /// The only observation state that is kept.
    pub interesting_state: String,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            interesting_state: DEFAULT_INTERESTING_STATE.to_string(),
        }
    }
}
