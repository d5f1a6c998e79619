//! Media acquisition pipeline: resolve a query, download and transcode audio
//! under a size ceiling, and keep the temporary storage area tidy.

mod downloader;
mod error;
mod resolver;
mod result;
mod sweeper;
mod transcoder;
mod types;
mod ytdlp;

pub use downloader::{
    sanitize_title, select_audio_format, AudioDownloader, DownloaderService, MediaSource,
};
pub use error::{MediaError, MediaResult};
pub use resolver::{Resolver, VideoSearch};
pub use result::DownloadResult;
pub use sweeper::{RetentionSweeper, SweepReport, SweeperHandle, DEFAULT_INTERVAL, DEFAULT_MAX_AGE};
pub use transcoder::{AudioTranscoder, FfmpegTranscoder};
pub use types::{ByteStream, EncodingProfile, MediaFormat, MediaInfo, MediaStream, Resolution, SearchHit};
pub use ytdlp::YtDlp;
