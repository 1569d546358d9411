//! # Canonical Record
//!
//! The unit the pipeline persists: one subject with its interesting observations
//! grouped by category (protocol) and keyed by observation (port number).
//!
//! Serialized as `{"host": "10.0.0.1", "tcp": {"80": {"state": "open"}}, "udp": {}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortState {
    pub state: String,
}

impl PortState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }
}

pub type Observations = BTreeMap<String, PortState>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "host")]
    pub subject: String,
    #[serde(flatten)]
    pub observations: BTreeMap<String, Observations>,
}

impl Record {
    /// Creates a record with an empty mapping for every category.
    pub fn new<I>(subject: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let observations = categories
            .into_iter()
            .map(|category| (category.as_ref().to_string(), Observations::new()))
            .collect();
        Self {
            subject: subject.into(),
            observations,
        }
    }

    pub fn category(&self, name: &str) -> Option<&Observations> {
        self.observations.get(name)
    }

    pub fn observation_count(&self) -> usize {
        self.observations.values().map(BTreeMap::len).sum()
    }
}
