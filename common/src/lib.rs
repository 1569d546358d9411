//! # Sweepr Common
//!
//! Shared vocabulary of the `sweepr` workspace.
//!
//! * **Models**: [`network::target::Target`], [`scan::RawScanResult`], [`record::Record`]
//!   and the [`summary::PipelineSummary`] of a finished run.
//! * **Contracts**: the collaborator traits in [`ports`] that the pipeline engine
//!   calls through (target enumeration, the scan operation, the record sink and
//!   the observability channel).
//! * **Errors** and **configuration** shared by every crate.

pub mod config;
pub mod error;
pub mod network;
pub mod ports;
pub mod record;
pub mod scan;
pub mod summary;
