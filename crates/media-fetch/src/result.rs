//! Download result and its release contract.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// A transcoded file handed to the caller.
///
/// The caller owns the file and must call [`DownloadResult::release`] once it
/// has finished with it. Dropping an unreleased result removes the file
/// synchronously, so early returns and panics do not leak it.
#[derive(Debug)]
pub struct DownloadResult {
    file_path: PathBuf,
    title: String,
    released: AtomicBool,
}

impl DownloadResult {
    pub fn new(file_path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            title: title.into(),
            released: AtomicBool::new(false),
        }
    }

    /// Absolute path of the produced file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// File name component of the path.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".into())
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Delete the file. Only the first call does any work; failures are logged.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        match tokio::fs::remove_file(&self.file_path).await {
            Ok(()) => info!("Deleted: {}", self.file_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Already gone: {}", self.file_path.display());
            }
            Err(e) => error!("Failed to delete {}: {}", self.file_path.display(), e),
        }
    }
}

impl Drop for DownloadResult {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.file_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!(
                    "Failed to delete unreleased {}: {}",
                    self.file_path.display(),
                    e
                );
            }
        }
    }
}
