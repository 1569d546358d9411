//! Concrete [`ScanOperation`](sweepr_common::ports::ScanOperation) adapters.
//!
//! High-level modules depend on the trait only; this module decides how a probe
//! is actually executed.

mod nmap;

pub use nmap::NmapScanner;
