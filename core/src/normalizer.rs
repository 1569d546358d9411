//! Converts raw scanner output into canonical records.
//!
//! The normalizer is a filter: only observations in the interesting state are
//! kept, and only for configured categories. Every configured category is
//! present on every record, empty or not.

use sweepr_common::config::RecordFilter;
use sweepr_common::record::{PortState, Record};
use sweepr_common::scan::{RawScanResult, ScannedHost};

#[derive(Debug, Clone)]
pub struct Normalizer {
    categories: Vec<String>,
    interesting_state: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(RecordFilter::default())
    }
}

impl Normalizer {
    pub fn new(filter: RecordFilter) -> Self {
        let mut categories: Vec<String> = Vec::with_capacity(filter.categories.len());
        for category in filter.categories {
            let category = category.trim().to_ascii_lowercase();
            if !category.is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }

        Self {
            categories,
            interesting_state: filter.interesting_state.trim().to_ascii_lowercase(),
        }
    }

    /// One record per scanned host, in the order the scanner reported them.
    ///
    /// Hosts without an address are skipped; this never fails.
    pub fn normalize(&self, raw: &RawScanResult) -> Vec<Record> {
        raw.hosts
            .iter()
            .filter(|host| !host.address.trim().is_empty())
            .map(|host| self.to_record(host))
            .collect()
    }

    fn to_record(&self, host: &ScannedHost) -> Record {
        let mut record = Record::new(host.address.trim(), &self.categories);

        for port in &host.ports {
            if !port.state.eq_ignore_ascii_case(&self.interesting_state) {
                continue;
            }
            let protocol = port.protocol.to_ascii_lowercase();
            // The state is stored as the scanner reported it; the first report wins.
            if let Some(bucket) = record.observations.get_mut(&protocol) {
                bucket
                    .entry(port.port.to_string())
                    .or_insert_with(|| PortState::new(port.state.as_str()));
            }
        }

        record
    }
}
