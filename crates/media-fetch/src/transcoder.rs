//! Audio transcoding through ffmpeg.

use crate::error::{MediaError, MediaResult};
use crate::types::{ByteStream, EncodingProfile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, error, instrument};

/// Encodes an input byte stream to a file.
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Consume `input` and write the encoded result to `dest`.
    async fn transcode(
        &self,
        input: ByteStream,
        dest: &Path,
        profile: EncodingProfile,
    ) -> MediaResult<()>;
}

/// Transcoder backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, dest: &Path, profile: EncodingProfile) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y"])
            .args(["-i", "pipe:0", "-vn"])
            .args(["-codec:a", profile.codec])
            .arg("-b:a")
            .arg(format!("{}k", profile.bitrate_kbps))
            .args(["-f", profile.container])
            .arg(dest)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    #[instrument(skip(self, input))]
    async fn transcode(
        &self,
        mut input: ByteStream,
        dest: &Path,
        profile: EncodingProfile,
    ) -> MediaResult<()> {
        let mut child = self.command(dest, profile).spawn().map_err(|e| {
            MediaError::Transcode(format!("failed to start {}: {}", self.binary.display(), e))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MediaError::Transcode("ffmpeg stdin unavailable".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::Transcode("ffmpeg stderr unavailable".into()))?;

        // Drain stderr concurrently so a chatty encoder cannot stall on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let copied = tokio::io::copy(&mut input, &mut stdin).await;
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| MediaError::Transcode(format!("ffmpeg wait failed: {}", e)))?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let tail = stderr_tail(&stderr_text);
            error!("ffmpeg exited with {}: {}", status, tail);
            return Err(MediaError::Transcode(format!("ffmpeg exited with {}: {}", status, tail)));
        }

        match copied {
            Ok(bytes) => {
                debug!("Transcoded {} input bytes to {}", bytes, dest.display());
                Ok(())
            }
            Err(e) => {
                error!("Input stream failed mid-transcode: {}", e);
                Err(MediaError::Transcode(format!("input stream failed: {}", e)))
            }
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(3);
    lines[start..].join(" | ")
}
