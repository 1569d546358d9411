//! Raw output of one scan operation, before normalization.

/// Everything the scanner reported for one target.
///
/// A single target may resolve into several hosts; each carries every port the
/// scanner reported, whatever its state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawScanResult {
    pub hosts: Vec<ScannedHost>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedHost {
    pub address: String,
    pub ports: Vec<PortObservation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortObservation {
    pub port: u16,
    pub protocol: String,
    pub state: String,
}

impl ScannedHost {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16, protocol: &str, state: &str) -> Self {
        self.ports.push(PortObservation {
            port,
            protocol: protocol.to_string(),
            state: state.to_string(),
        });
        self
    }
}
