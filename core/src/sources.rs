//! # Target Sources
//!
//! Adapters that produce the initial target list.
//!
//! * [`StaticSource`]: a list already in memory.
//! * [`ExpressionSource`]: operator expressions such as `10.0.0.1-20,db.lan`.
//! * [`JsonFileSource`]: an input document `{"hosts": ["10.0.0.1", ...]}`.
//!
//! Input documents are decoded against a typed schema, so a wrong shape fails
//! here with an [`EnumerationError`] instead of surfacing later in the pipeline.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sweepr_common::error::EnumerationError;
use sweepr_common::network::target::{self, Target};
use sweepr_common::ports::TargetSource;

pub struct StaticSource {
    targets: Vec<Target>,
}

impl StaticSource {
    pub fn new(targets: impl IntoIterator<Item = Target>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl TargetSource for StaticSource {
    fn targets(&self) -> Result<Vec<Target>, EnumerationError> {
        Ok(self.targets.clone())
    }
}

pub struct ExpressionSource {
    exprs: Vec<String>,
}

impl ExpressionSource {
    pub fn new(exprs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            exprs: exprs.into_iter().map(Into::into).collect(),
        }
    }
}

impl TargetSource for ExpressionSource {
    fn targets(&self) -> Result<Vec<Target>, EnumerationError> {
        target::expand(&self.exprs)
    }
}

#[derive(Debug, Deserialize)]
struct InputDocument {
    hosts: Vec<String>,
}

pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TargetSource for JsonFileSource {
    fn targets(&self) -> Result<Vec<Target>, EnumerationError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| EnumerationError::Io {
            path: self.path.clone(),
            source,
        })?;
        decode_document(&self.path.display().to_string(), &raw)
    }
}

/// Decodes an input document, rejecting blank host entries.
pub fn decode_document(origin: &str, raw: &str) -> Result<Vec<Target>, EnumerationError> {
    let invalid = |reason: String| EnumerationError::InvalidDocument {
        origin: origin.to_string(),
        reason,
    };

    let doc: InputDocument = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;

    let mut targets = Vec::with_capacity(doc.hosts.len());
    for (idx, host) in doc.hosts.into_iter().enumerate() {
        let host = host.trim();
        if host.is_empty() {
            return Err(invalid(format!("hosts[{idx}] is empty")));
        }
        targets.push(Target::new(host));
    }

    if targets.is_empty() {
        return Err(EnumerationError::Empty);
    }
    Ok(targets)
}
