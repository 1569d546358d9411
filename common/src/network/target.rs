//! # Scan Target Model
//!
//! A [`Target`] is the opaque identifier handed to the scan operation, usually a
//! host address. The pipeline never looks inside it.
//!
//! This module also parses target *expressions* typed by an operator, which can be:
//! * A single IP address or hostname (e.g., `10.0.0.5`, `::1`, `db.internal`).
//! * An IPv4 Range (e.g., `192.168.1.1-100`).
//! * A CIDR block (e.g., `192.168.1.0/24`).
//! * A comma-separated list of any of the above.
//!
//! Expressions expand into an ordered, de-duplicated list of targets.

use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EnumerationError;
use crate::network::range::{self, Ipv4Range};

/// Upper bound on how many targets a single expansion may produce.
pub const MAX_EXPANDED_TARGETS: u64 = 1 << 16;

/// One unit of work for the scan operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<IpAddr> for Target {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

/// A parsed, not yet expanded, target expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetExpr {
    /// A single IP address.
    Host { target_addr: IpAddr },
    /// A DNS name, passed through to the scanner untouched.
    Name { hostname: String },
    /// A range of IPv4 addresses.
    Range { ipv4_range: Ipv4Range },
    /// Holds a list of different expressions
    Multi { exprs: Vec<TargetExpr> },
}

impl FromStr for TargetExpr {
    type Err = String;

    /// Parses a string into a `TargetExpr`.
    ///
    /// Supported formats:
    /// * **Host**: Single IPv4/IPv6 address (e.g., "192.168.1.5").
    /// * **Range**: "Start-End" (e.g., "192.168.1.1-50", "192.168.1.1-192.168.1.50").
    /// * **CIDR**: "Network/Prefix" (e.g., "192.168.1.0/24").
    /// * **Hostname**: RFC 1123 style labels (e.g., "scanme.example.org").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.contains(',') {
            return parse_commas(s);
        }

        if let Some(expr) = parse_host(s) {
            return Ok(expr);
        }

        if let Some(expr) = parse_ip_range(s)? {
            return Ok(expr);
        }

        if let Some(expr) = parse_cidr_range(s)? {
            return Ok(expr);
        }

        if let Some(expr) = parse_hostname(s) {
            return Ok(expr);
        }

        Err(format!("invalid target: {s}"))
    }
}

impl TargetExpr {
    /// Upper bound of targets this expression expands to, duplicates included.
    fn size_hint(&self) -> u64 {
        match self {
            TargetExpr::Host { .. } | TargetExpr::Name { .. } => 1,
            TargetExpr::Range { ipv4_range } => ipv4_range.len(),
            TargetExpr::Multi { exprs } => exprs.iter().map(TargetExpr::size_hint).sum(),
        }
    }

    fn push_into(self, seen: &mut HashSet<Target>, out: &mut Vec<Target>) {
        match self {
            TargetExpr::Host { target_addr } => push_unique(seen, out, Target::from(target_addr)),
            TargetExpr::Name { hostname } => {
                push_unique(seen, out, Target::new(hostname.to_ascii_lowercase()))
            }
            TargetExpr::Range { ipv4_range } => {
                for ip in ipv4_range.to_iter() {
                    push_unique(seen, out, Target::from(ip));
                }
            }
            TargetExpr::Multi { exprs } => {
                for expr in exprs {
                    expr.push_into(seen, out);
                }
            }
        }
    }
}

fn push_unique(seen: &mut HashSet<Target>, out: &mut Vec<Target>, target: Target) {
    if seen.insert(target.clone()) {
        out.push(target);
    }
}

/// Parses and expands operator-supplied expressions, preserving first-seen order.
pub fn expand<I, S>(exprs: I) -> Result<Vec<Target>, EnumerationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Vec::new();
    let mut budget: u64 = 0;

    for raw in exprs {
        let raw = raw.as_ref();
        let expr = TargetExpr::from_str(raw).map_err(|reason| EnumerationError::InvalidExpression {
            expr: raw.to_string(),
            reason,
        })?;

        budget = budget.saturating_add(expr.size_hint());
        if budget > MAX_EXPANDED_TARGETS {
            return Err(EnumerationError::InvalidExpression {
                expr: raw.to_string(),
                reason: format!("expands past the limit of {MAX_EXPANDED_TARGETS} targets"),
            });
        }
        parsed.push(expr);
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for expr in parsed {
        expr.push_into(&mut seen, &mut targets);
    }

    if targets.is_empty() {
        return Err(EnumerationError::Empty);
    }
    Ok(targets)
}

/// Parses a comma-separated list of expressions (e.g., "192.168.1.5, 10.0.0.1-50").
fn parse_commas(s: &str) -> Result<TargetExpr, String> {
    let mut exprs = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let expr = TargetExpr::from_str(part)
            .map_err(|e| format!("failed to parse target '{part}': {e}"))?;

        exprs.push(expr);
    }

    Ok(TargetExpr::Multi { exprs })
}

/// Parses a single IP address.
fn parse_host(s: &str) -> Option<TargetExpr> {
    s.parse::<IpAddr>()
        .ok()
        .map(|target_addr| TargetExpr::Host { target_addr })
}

/// Parses a range string like "1.1.1.1-2.2.2.2" or "1.1.1.1-50".
///
/// Returns `Ok(None)` when the left side is not an IPv4 address so that
/// hyphenated hostnames fall through to [`parse_hostname`].
fn parse_ip_range(s: &str) -> Result<Option<TargetExpr>, String> {
    let Some((start_str, end_str)) = s.split_once('-') else {
        return Ok(None);
    };

    let Ok(start_addr) = start_str.parse::<Ipv4Addr>() else {
        return Ok(None);
    };

    let end_addr = parse_range_end_addr(end_str, &start_addr, s)?;
    if u32::from(end_addr) < u32::from(start_addr) {
        return Err(format!("range end {end_addr} precedes start {start_addr}"));
    }

    let ipv4_range = Ipv4Range::new(start_addr, end_addr);
    Ok(Some(TargetExpr::Range { ipv4_range }))
}

/// Helper to parse the end address of a range.
///
/// Handles abbreviated forms like "192.168.1.1-50" (implies 192.168.1.50)
/// and full forms like "192.168.1.1-192.168.1.255".
fn parse_range_end_addr(
    end_str: &str,
    start_addr: &Ipv4Addr,
    original_s: &str,
) -> Result<Ipv4Addr, String> {
    if let Ok(full_addr) = end_str.parse::<Ipv4Addr>() {
        return Ok(full_addr);
    }

    if end_str.is_empty() {
        return Err(format!("End range cannot be empty: {original_s}"));
    }

    let mut end_octets = start_addr.octets();
    let partial_octets: Vec<u8> = end_str
        .split('.')
        .map(|octet_str| octet_str.parse::<u8>())
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| format!("Invalid end range '{end_str}': {e}"))?;

    if partial_octets.len() > 4 {
        return Err(format!("End range has too many octets: {end_str}"));
    }

    let start_index = 4 - partial_octets.len();
    end_octets[start_index..].copy_from_slice(&partial_octets);

    Ok(Ipv4Addr::from(end_octets))
}

/// Parses CIDR notation like "192.168.1.0/24".
fn parse_cidr_range(s: &str) -> Result<Option<TargetExpr>, String> {
    let Some((ip_str, prefix_str)) = s.split_once('/') else {
        return Ok(None);
    };

    let ipv4_addr = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| format!("Invalid IP in CIDR '{ip_str}': {e}"))?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| format!("Invalid prefix in CIDR '{prefix_str}': {e}"))?;

    let ipv4_range = range::cidr_range(ipv4_addr, prefix)?;

    Ok(Some(TargetExpr::Range { ipv4_range }))
}

fn parse_hostname(s: &str) -> Option<TargetExpr> {
    if s.is_empty() || s.len() > 253 {
        return None;
    }
    // All-numeric dotted strings are malformed addresses, not names.
    if s.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let valid = s.trim_end_matches('.').split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    valid.then(|| TargetExpr::Name {
        hostname: s.to_string(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
