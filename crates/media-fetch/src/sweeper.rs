//! Retention sweeper for the temporary storage area.
//!
//! Deletes artifacts older than a fixed age. Runs once on start and then on
//! every interval tick until stopped.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default artifact age limit.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Default time between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

const MAX_CONSECUTIVE_READ_ERRORS: usize = 8;

/// Result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files deleted.
    pub removed: usize,
    /// Entries that could not be inspected or deleted.
    pub failed: usize,
}

/// Periodically removes stale files from a directory.
pub struct RetentionSweeper {
    dir: PathBuf,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
            interval,
        }
    }

    /// Sweep using the current time.
    pub async fn sweep_once(&self) -> SweepReport {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweep, treating `now` as the current time.
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        debug!("Running retention sweep over {}", self.dir.display());

        let report = match self.list_entries().await {
            Ok(entries) => self.sweep_entries(entries, now).await,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Temp dir {} does not exist yet", self.dir.display());
                SweepReport::default()
            }
            Err(e) => {
                error!("Failed to list {}: {}", self.dir.display(), e);
                SweepReport {
                    removed: 0,
                    failed: 1,
                }
            }
        };

        if report.removed > 0 || report.failed > 0 {
            info!(
                "Retention sweep done: removed={}, failed={}",
                report.removed, report.failed
            );
        }
        report
    }

    /// Directory listing. Unreadable entries are kept as errors so the rest still gets swept.
    async fn list_entries(&self) -> io::Result<Vec<io::Result<PathBuf>>> {
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        let mut entries = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    consecutive_errors = 0;
                    entries.push(Ok(entry.path()));
                }
                Ok(None) => break,
                Err(e) => {
                    consecutive_errors += 1;
                    entries.push(Err(e));
                    // A directory that keeps failing will not recover mid-listing.
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        warn!(
                            "Giving up listing {} after {} read errors",
                            self.dir.display(),
                            consecutive_errors
                        );
                        break;
                    }
                }
            }
        }
        Ok(entries)
    }

    async fn sweep_entries(
        &self,
        entries: Vec<io::Result<PathBuf>>,
        now: SystemTime,
    ) -> SweepReport {
        let mut report = SweepReport::default();

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    error!("Failed to read entry in {}: {}", self.dir.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            let metadata = match tokio::fs::symlink_metadata(&path).await {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    warn!("No mtime for {}: {}", path.display(), e);
                    report.failed += 1;
                    continue;
                }
            };

            // Files stamped in the future count as fresh.
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= self.max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Auto-cleaned old file: {}", path.display());
                    report.removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} vanished before it could be swept", path.display());
                }
                Err(e) => {
                    error!("Failed to delete {}: {}", path.display(), e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Spawn the sweep loop. The first sweep runs immediately.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        info!(
            "Starting retention sweeper on {} (max_age={:?}, interval={:?})",
            self.dir.display(),
            self.max_age,
            self.interval
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.sweep_once().await;
                    }
                }
            }
            debug!("Retention sweeper stopped");
        });

        SweeperHandle { cancel, task }
    }
}

/// Running sweeper; stop it to end the background task.
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("Retention sweeper task ended abnormally: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
