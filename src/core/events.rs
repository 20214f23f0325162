use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub use reelgrab_core::core::events::{DownloadProgress, EventEmitter, Phase};

const PROGRESS_STEP: u64 = 10;

/// Reports phases and download progress through `tracing`, for the terminal.
#[derive(Clone, Default)]
pub struct ConsoleEventEmitter {
    last_bucket: Arc<AtomicU64>,
}

impl ConsoleEventEmitter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventEmitter for ConsoleEventEmitter {
    fn emit_phase(&self, phase: &Phase) {
        match phase {
            Phase::Idle | Phase::Displaying => tracing::debug!("phase: {}", phase.name()),
            Phase::Validating => tracing::info!("Validating URL..."),
            Phase::Loading => tracing::info!("Fetching video information..."),
            Phase::Downloading { format } => {
                self.last_bucket.store(0, Ordering::Relaxed);
                tracing::info!("Downloading {}...", format);
            }
            Phase::Success { file_path } => tracing::info!("Saved to {}", file_path),
            Phase::Error { message } => tracing::debug!("phase: error ({})", message),
        }
    }

    fn emit_progress(&self, progress: &DownloadProgress) {
        let bucket = (progress.percent as u64) / PROGRESS_STEP;
        if self.last_bucket.fetch_max(bucket, Ordering::Relaxed) < bucket {
            tracing::info!(
                platform = %progress.platform,
                format = %progress.format,
                downloaded = progress.downloaded_bytes,
                "{:.0}%",
                progress.percent
            );
        }
    }
}
