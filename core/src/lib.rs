//! # Sweepr Core
//!
//! The scan engine: a bounded fan-out/fan-in pipeline that feeds targets to a
//! fixed pool of workers, normalizes what the scanner reports, and funnels the
//! resulting records through a single aggregator into a sink.
//!
//! ```text
//! targets ─▶ input queue ─▶ N workers ─▶ output queue ─▶ aggregator ─▶ sink
//! ```
//!
//! * **[`pipeline`]**: lifecycle and shutdown ordering of the three stages.
//! * **[`normalizer`]**: raw scanner output to canonical [`Record`]s.
//! * **[`scanner`]**, **[`sources`]**, **[`sink`]**, **[`observer`]**: concrete
//!   adapters for the ports defined in `sweepr-common`.
//!
//! [`Record`]: sweepr_common::record::Record

pub mod normalizer;
pub mod observer;
pub mod pipeline;
pub mod scanner;
pub mod sink;
pub mod sources;

pub use pipeline::Pipeline;
