//! Scoped working directory

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Records the working directory on creation and restores it on drop.
///
/// Restoration runs on every exit path, including early returns with `?`
/// and unwinding panics.
#[derive(Debug)]
pub struct WorkingDirGuard {
    saved: PathBuf,
}

impl WorkingDirGuard {
    pub fn acquire() -> std::io::Result<Self> {
        let saved = std::env::current_dir()?;
        debug!("Saved working directory {}", saved.display());
        Ok(Self { saved })
    }

    pub fn saved(&self) -> &Path {
        &self.saved
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let changed = std::env::current_dir()
            .map(|current| current != self.saved)
            .unwrap_or(true);
        if !changed {
            return;
        }
        match std::env::set_current_dir(&self.saved) {
            Ok(()) => debug!("Restored working directory {}", self.saved.display()),
            Err(e) => warn!(
                "Failed to restore working directory {}: {}",
                self.saved.display(),
                e
            ),
        }
    }
}
