//! NARC archives, via an external helper.
//!
//! Nitro archives are unpacked and packed by a separate tool. The
//! [`ArchiveService`] trait is the seam: [`Narctool`] runs the real helper,
//! tests and drivers can substitute anything else.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// How long the helper may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const POLL: Duration = Duration::from_millis(25);

/// Unpacks and packs an archive format this crate does not implement.
pub trait ArchiveService {
    /// Extract every child of `archive` into `dir`.
    fn unpack(&self, archive: &Path, dir: &Path) -> Result<()>;

    /// Rebuild `archive` from the children in `dir`.
    fn pack(&self, dir: &Path, archive: &Path) -> Result<()>;
}

/// The `narctool` command-line helper.
#[derive(Debug, Clone)]
pub struct Narctool {
    pub program: PathBuf,
    pub timeout: Duration,
}

impl Default for Narctool {
    fn default() -> Self {
        Self {
            program: PathBuf::from("narctool"),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Narctool {
    fn run(&self, mode: &str, from: &Path, to: &Path) -> Result<()> {
        let mut child = Command::new(&self.program)
            .arg(mode)
            .arg(from)
            .arg(to)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::ArchiveService(format!("failed to start {}: {e}", self.program.display()))
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if start.elapsed() >= self.timeout {
                tracing::warn!(
                    program = %self.program.display(),
                    mode,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "archive helper timed out"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ArchiveService(format!(
                    "{} {mode} timed out after {:?}",
                    self.program.display(),
                    self.timeout
                )));
            }
            thread::sleep(POLL);
        };

        if !status.success() {
            return Err(Error::ArchiveService(format!(
                "{} {mode} failed: {status}",
                self.program.display()
            )));
        }
        tracing::debug!(
            mode,
            from = %from.display(),
            to = %to.display(),
            "archive helper finished"
        );
        Ok(())
    }
}

impl ArchiveService for Narctool {
    fn unpack(&self, archive: &Path, dir: &Path) -> Result<()> {
        self.run("u", archive, dir)
    }

    fn pack(&self, dir: &Path, archive: &Path) -> Result<()> {
        self.run("p", dir, archive)
    }
}
