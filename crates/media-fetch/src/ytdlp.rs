//! yt-dlp backed media source and search.

use crate::downloader::MediaSource;
use crate::error::{MediaError, MediaResult};
use crate::resolver::VideoSearch;
use crate::types::{
    MediaFormat, MediaInfo, MediaStream, SearchHit, YtDlpInfo, YtDlpSearchResult,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

const SEARCH_RESULTS: usize = 5;

/// Runs the `yt-dlp` binary for metadata, streams and search.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--no-warnings", "--no-playlist"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run yt-dlp to completion and parse its JSON output.
    async fn run_json<T: serde::de::DeserializeOwned>(
        &self,
        mut cmd: Command,
    ) -> Result<T, String> {
        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(clean_error(&stderr));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| format!("unreadable yt-dlp output: {}", e))
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaSource for YtDlp {
    #[instrument(skip(self))]
    async fn fetch_info(&self, locator: &str) -> MediaResult<MediaInfo> {
        let mut cmd = self.base_command();
        cmd.arg("-J").arg("--").arg(locator);

        let info: YtDlpInfo = self.run_json(cmd).await.map_err(MediaError::Retrieval)?;
        debug!("Fetched info for {:?} ({} formats)", info.title, info.formats.len());
        Ok(info.into())
    }

    #[instrument(skip(self, format), fields(format_id = %format.id))]
    async fn open_stream(&self, locator: &str, format: &MediaFormat) -> MediaResult<MediaStream> {
        let mut cmd = self.base_command();
        cmd.args(["--quiet", "-f", format.id.as_str(), "-o", "-", "--"])
            .arg(locator)
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| {
            MediaError::Retrieval(format!("failed to run {}: {}", self.binary.display(), e))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::Retrieval("yt-dlp stdout unavailable".into()))?;

        let completion = async move {
            let status = child
                .wait()
                .await
                .map_err(|e| MediaError::Transcode(format!("yt-dlp wait failed: {}", e)))?;
            if status.success() {
                Ok(())
            } else {
                warn!("yt-dlp stream exited with {}", status);
                Err(MediaError::Transcode(format!(
                    "download interrupted (yt-dlp exited with {})",
                    status
                )))
            }
        };

        Ok(MediaStream {
            reader: Box::pin(stdout),
            completion: Box::pin(completion),
        })
    }
}

#[async_trait]
impl VideoSearch for YtDlp {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> MediaResult<Vec<SearchHit>> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--no-warnings", "--flat-playlist", "-J", "--"])
            .arg(format!("ytsearch{}:{}", SEARCH_RESULTS, query))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let result: YtDlpSearchResult =
            self.run_json(cmd).await.map_err(MediaError::SearchFailed)?;

        let hits: Vec<SearchHit> = result
            .entries
            .into_iter()
            .filter_map(|e| e.into_hit())
            .collect();
        debug!("Search returned {} hits", hits.len());
        Ok(hits)
    }
}

/// Keep the `ERROR:` lines of yt-dlp stderr, or the last line if there are none.
fn clean_error(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .filter_map(|l| l.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .collect();

    if !errors.is_empty() {
        return errors.join("; ");
    }

    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "yt-dlp failed".into())
}
