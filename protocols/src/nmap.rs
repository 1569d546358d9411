//! # Nmap grepable output
//!
//! Parses the `-oG` format into a [`RawScanResult`]:
//!
//! ```text
//! # Nmap 7.94 scan initiated ... as: nmap -Pn -sT -oG - 10.0.0.1
//! Host: 10.0.0.1 ()	Status: Up
//! Host: 10.0.0.1 ()	Ports: 22/open/tcp//ssh///, 81/closed/tcp//hosts2-ns///	Ignored State: filtered (65533)
//! # Nmap done at ... -- 1 IP address (1 host up) scanned in 2.35 seconds
//! ```
//!
//! Each port entry is `port/state/protocol/owner/service/rpc/version/`.
//! A host may span several lines; they are merged in first-seen order.

use std::collections::HashMap;

use sweepr_common::scan::{PortObservation, RawScanResult, ScannedHost};
use thiserror::Error;
use tracing::debug;

const HOST_PREFIX: &str = "Host:";
const SECTION_PORTS: &str = "Ports";
const SECTION_STATUS: &str = "Status";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrepableError {
    #[error("line {line}: host entry without an address")]
    MissingAddress { line: usize },

    #[error("line {line}: malformed port entry '{entry}'")]
    BadPort { line: usize, entry: String },
}

#[derive(Default)]
struct HostAccumulator {
    hosts: Vec<ScannedHost>,
    down: Vec<bool>,
    index: HashMap<String, usize>,
}

impl HostAccumulator {
    fn slot(&mut self, address: &str) -> usize {
        if let Some(&idx) = self.index.get(address) {
            return idx;
        }
        let idx = self.hosts.len();
        self.hosts.push(ScannedHost::new(address));
        self.down.push(false);
        self.index.insert(address.to_string(), idx);
        idx
    }

    fn finish(self) -> RawScanResult {
        let hosts = self
            .hosts
            .into_iter()
            .zip(self.down)
            .filter(|(host, down)| !*down || !host.ports.is_empty())
            .map(|(host, _)| host)
            .collect();
        RawScanResult { hosts }
    }
}

/// Parses the complete grepable output of one scanner run.
pub fn parse_grepable(output: &str) -> Result<RawScanResult, GrepableError> {
    let mut acc = HostAccumulator::default();

    for (idx, raw_line) in output.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(rest) = line.strip_prefix(HOST_PREFIX) else {
            debug!(line = line_no, "skipping unrecognised scanner output");
            continue;
        };

        let mut sections = rest.split('\t');
        let address = sections
            .next()
            .and_then(|head| head.split_whitespace().next())
            .ok_or(GrepableError::MissingAddress { line: line_no })?;

        let slot = acc.slot(address);

        for section in sections {
            let Some((key, value)) = section.split_once(':') else {
                continue;
            };
            match key.trim() {
                SECTION_STATUS => {
                    acc.down[slot] = value.trim().eq_ignore_ascii_case("down");
                }
                SECTION_PORTS => {
                    let ports = parse_ports(value, line_no)?;
                    acc.hosts[slot].ports.extend(ports);
                }
                _ => {}
            }
        }
    }

    Ok(acc.finish())
}

fn parse_ports(value: &str, line: usize) -> Result<Vec<PortObservation>, GrepableError> {
    let mut ports = Vec::new();
    // Set while the previous fragment ended inside a version field.
    let mut in_version = false;

    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        if let Some((port, has_version)) = parse_port_entry(entry) {
            ports.push(port);
            in_version = has_version;
            continue;
        }

        // Nmap writes `/` inside version text as `|`, so the tail of a version
        // split on its comma holds at most the closing slash.
        if in_version && entry.matches('/').count() <= 1 {
            continue;
        }

        return Err(GrepableError::BadPort {
            line,
            entry: entry.to_string(),
        });
    }

    Ok(ports)
}

/// Parses one `port/state/protocol/owner/service/rpc/version/` entry, also
/// reporting whether it carries version text.
fn parse_port_entry(entry: &str) -> Option<(PortObservation, bool)> {
    let mut fields = entry.split('/');
    let port = fields.next()?.trim().parse::<u16>().ok()?;
    let state = fields.next()?.trim();
    let protocol = fields.next()?.trim();

    if state.is_empty() || protocol.is_empty() {
        return None;
    }

    let has_version = fields.nth(3).is_some_and(|version| !version.trim().is_empty());

    Some((
        PortObservation {
            port,
            protocol: protocol.to_ascii_lowercase(),
            state: state.to_string(),
        },
        has_version,
    ))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
