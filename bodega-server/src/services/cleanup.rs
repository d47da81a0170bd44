//! Delayed temp file cleanup
//!
//! Rendered receipts stay on disk long enough for the mail channels to
//! finish with them, then get deleted. Deletion is fire-and-forget:
//! a failure is logged and the file is left for the OS temp reaper.

use std::path::PathBuf;
use std::time::Duration;

/// Schedules deferred deletion of temp files
#[derive(Debug, Clone)]
pub struct CleanupScheduler {
    delay: Duration,
}

impl CleanupScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delete `path` after the configured delay
    pub fn schedule_delete(&self, path: PathBuf) {
        self.schedule_delete_after(path, self.delay);
    }

    /// Delete `path` after an explicit delay
    pub fn schedule_delete_after(&self, path: PathBuf, delay: Duration) {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Temp file deleted");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "Temp file already gone");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete temp file");
                }
            }
        });
    }
}
