//! Parsers for the output formats of external scanners.

pub mod nmap;
