pub mod scan;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use sweepr_common::config::{
    DEFAULT_CATEGORIES, DEFAULT_INTERESTING_STATE, DEFAULT_RESULT_CAPACITY, DEFAULT_SCANNER,
    DEFAULT_WORKERS, PipelineConfig, RecordFilter, ScanProfile,
};

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(version, about = "Concurrent port sweeps over many hosts.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan hosts and save their open ports as JSON lines
    #[command(alias = "s")]
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Addresses, hostnames, ranges (10.0.0.1-20) or CIDR blocks (10.0.0.0/24)
    #[arg(required_unless_present = "input", conflicts_with = "input")]
    pub targets: Vec<String>,

    /// JSON document listing targets: {"hosts": ["10.0.0.1", ...]}
    #[arg(short, long, env = "SWEEPR_INPUT")]
    pub input: Option<PathBuf>,

    /// Append records to this file instead of writing them to stdout
    #[arg(short, long, env = "SWEEPR_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Concurrent scanner processes
    #[arg(short, long, env = "SWEEPR_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Records buffered between the scanners and the output
    #[arg(long, env = "SWEEPR_QUEUE_CAPACITY", default_value_t = DEFAULT_RESULT_CAPACITY)]
    pub queue_capacity: usize,

    /// Give up on a single host after this long (e.g. 90s, 10m)
    #[arg(long, env = "SWEEPR_SCAN_TIMEOUT", value_parser = humantime::parse_duration)]
    pub scan_timeout: Option<Duration>,

    /// Stop the whole run after this long, keeping results gathered so far
    #[arg(long, env = "SWEEPR_TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Path of the nmap binary
    #[arg(long, env = "SWEEPR_NMAP", default_value = DEFAULT_SCANNER)]
    pub nmap: PathBuf,

    /// Replaces the default nmap flags; repeat once per argument
    #[arg(long = "nmap-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub nmap_args: Vec<String>,

    /// Protocols kept in each record; repeat for several [default: tcp, udp]
    #[arg(long = "category", value_name = "PROTO")]
    pub categories: Vec<String>,

    /// Port state worth keeping
    #[arg(long, default_value = DEFAULT_INTERESTING_STATE)]
    pub state: String,
}

impl ScanArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            result_capacity: self.queue_capacity,
            scan_timeout: self.scan_timeout,
            pipeline_timeout: self.timeout,
        }
    }

    pub fn scan_profile(&self) -> ScanProfile {
        let mut profile = ScanProfile {
            binary: self.nmap.clone(),
            ..Default::default()
        };
        if !self.nmap_args.is_empty() {
            profile.flags = self.nmap_args.clone();
        }
        profile
    }

    pub fn record_filter(&self) -> RecordFilter {
        let categories = if self.categories.is_empty() {
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
        } else {
            self.categories.clone()
        };
        RecordFilter {
            categories,
            interesting_state: self.state.clone(),
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
