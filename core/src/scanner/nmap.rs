//! Runs the `nmap` binary once per target and parses its grepable output.
//!
//! The child process is killed when the scan future is dropped, which is how
//! cancellation and per-target deadlines reach the external process.

use std::process::Stdio;

use async_trait::async_trait;
use sweepr_common::config::ScanProfile;
use sweepr_common::error::ScanError;
use sweepr_common::network::target::Target;
use sweepr_common::ports::ScanOperation;
use sweepr_common::scan::RawScanResult;
use sweepr_protocols::nmap;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const GREPABLE_TO_STDOUT: [&str; 2] = ["-oG", "-"];

#[derive(Debug, Clone, Default)]
pub struct NmapScanner {
    profile: ScanProfile,
}

impl NmapScanner {
    pub fn new(profile: ScanProfile) -> Self {
        Self { profile }
    }

    fn command(&self, target: &Target) -> Command {
        let mut cmd = Command::new(&self.profile.binary);
        cmd.args(&self.profile.flags)
            .args(GREPABLE_TO_STDOUT)
            .arg(target.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ScanOperation for NmapScanner {
    async fn scan(
        &self,
        target: &Target,
        cancel: CancellationToken,
    ) -> Result<RawScanResult, ScanError> {
        // Anything starting with a dash would be read as a scanner option.
        if target.as_str().starts_with('-') {
            return Err(ScanError::Failed {
                target: target.clone(),
                reason: "target looks like a command-line option".into(),
            });
        }

        let child = self.command(target).spawn().map_err(|source| ScanError::Spawn {
            target: target.clone(),
            source,
        })?;
        debug!(host = %target, pid = child.id(), "scanner started");

        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(|e| ScanError::Failed {
                target: target.clone(),
                reason: e.to_string(),
            })?,
            _ = cancel.cancelled() => {
                return Err(ScanError::Cancelled { target: target.clone() });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::Failed {
                target: target.clone(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.profile.binary.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| ScanError::Malformed {
            target: target.clone(),
            reason: "output is not valid UTF-8".into(),
        })?;

        nmap::parse_grepable(&stdout).map_err(|e| ScanError::Malformed {
            target: target.clone(),
            reason: e.to_string(),
        })
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
