// Interrupt cleanup for temporary archives.
//
// SIGINT, SIGTERM and SIGHUP do not unwind, so `TempDir`'s drop never runs
// when the user hits Ctrl-C mid-upload. Live archive directories are
// recorded in a process-wide registry; the signal handler removes whatever
// is recorded there and exits with the failure code.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

/// Exit status used when the run is interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 1;

static PENDING: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Install the Ctrl-C / termination handler. Call once, from `main`.
pub fn install() -> Result<()> {
    ctrlc::set_handler(|| {
        remove_pending();
        eprintln!("\nInterrupted.");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .context("Failed to install interrupt handler")
}

/// Registration of a directory to delete on interrupt. Unregisters on drop.
#[derive(Debug)]
pub struct PendingDir {
    dir: PathBuf,
}

impl Drop for PendingDir {
    fn drop(&mut self) {
        registry().retain(|d| d != &self.dir);
    }
}

/// Record `dir` as something to remove if the process is interrupted.
pub fn track(dir: &Path) -> PendingDir {
    let dir = dir.to_path_buf();
    registry().push(dir.clone());
    PendingDir { dir }
}

/// Remove every tracked directory. Returns how many were removed.
pub fn remove_pending() -> usize {
    let dirs = std::mem::take(&mut *registry());
    remove_dirs(dirs)
}

fn remove_dirs(dirs: Vec<PathBuf>) -> usize {
    let mut removed = 0;
    for dir in dirs {
        if std::fs::remove_dir_all(&dir).is_ok() {
            debug!(dir = %dir.display(), "removed temporary archive after interrupt");
            removed += 1;
        }
    }
    removed
}

fn registry() -> MutexGuard<'static, Vec<PathBuf>> {
    PENDING.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) fn is_tracked(dir: &Path) -> bool {
    registry().iter().any(|d| d == dir)
}
