//! Media pipeline types.

use crate::error::MediaResult;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Boxed byte stream produced by a media source.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Metadata for a remote media resource.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    /// Display title as reported by the source.
    pub title: String,
    /// Available encodings.
    pub formats: Vec<MediaFormat>,
}

/// A single encoding offered by a media source.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFormat {
    pub id: String,
    pub ext: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Average audio bitrate in kbps, when known.
    pub audio_bitrate_kbps: Option<f64>,
    /// Declared content length in bytes, when known.
    pub content_length: Option<u64>,
}

impl MediaFormat {
    /// Whether this encoding carries audio and nothing else.
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Declared size in megabytes (MiB).
    pub fn size_mb(&self) -> Option<f64> {
        self.content_length
            .map(|bytes| bytes as f64 / (1024.0 * 1024.0))
    }
}

/// One hit from a video search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
}

/// Outcome of resolving a user query.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A concrete locator to download from.
    Locator(String),
    /// The search ran but matched nothing.
    NoResults,
}

/// Output encoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfile {
    pub codec: &'static str,
    pub container: &'static str,
    pub extension: &'static str,
    pub bitrate_kbps: u32,
}

impl EncodingProfile {
    /// The only output the pipeline produces.
    pub const MP3_128K: EncodingProfile = EncodingProfile {
        codec: "libmp3lame",
        container: "mp3",
        extension: "mp3",
        bitrate_kbps: 128,
    };
}

/// An open retrieval stream.
///
/// `completion` resolves once the producer has finished; an error there
/// means the stream was cut short even if the reader saw a clean EOF.
pub struct MediaStream {
    pub reader: ByteStream,
    pub completion: BoxFuture<'static, MediaResult<()>>,
}

impl MediaStream {
    /// Wrap a reader whose end of stream is always a clean finish.
    pub fn from_reader(reader: impl AsyncRead + Send + 'static) -> Self {
        Self {
            reader: Box::pin(reader),
            completion: Box::pin(async { Ok(()) }),
        }
    }
}

/// `yt-dlp -J` output, reduced to the fields the pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YtDlpInfo {
    pub title: String,
    #[serde(default)]
    pub formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YtDlpFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<u64>,
}

impl From<YtDlpFormat> for MediaFormat {
    fn from(f: YtDlpFormat) -> Self {
        let present = |codec: &Option<String>| {
            codec
                .as_deref()
                .map(|c| !c.is_empty() && c != "none")
                .unwrap_or(false)
        };

        Self {
            has_audio: present(&f.acodec),
            has_video: present(&f.vcodec),
            ext: f.ext.unwrap_or_default(),
            audio_bitrate_kbps: f.abr,
            content_length: f.filesize.or(f.filesize_approx),
            id: f.format_id,
        }
    }
}

impl From<YtDlpInfo> for MediaInfo {
    fn from(info: YtDlpInfo) -> Self {
        Self {
            title: info.title,
            formats: info.formats.into_iter().map(MediaFormat::from).collect(),
        }
    }
}

/// `yt-dlp --flat-playlist -J ytsearchN:` output.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YtDlpSearchResult {
    #[serde(default)]
    pub entries: Vec<YtDlpSearchEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct YtDlpSearchEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl YtDlpSearchEntry {
    pub fn into_hit(self) -> Option<SearchHit> {
        let url = match (self.url, self.id) {
            (Some(url), _) if url.starts_with("http") => url,
            (_, Some(id)) => format!("https://www.youtube.com/watch?v={}", id),
            _ => return None,
        };
        Some(SearchHit {
            url,
            title: self.title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ytdlp_format_codec_detection() {
        let json = serde_json::json!({
            "title": "Song",
            "formats": [
                { "format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 160.0, "filesize": 4194304 },
                { "format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a.40.2", "filesize_approx": 10485760 },
                { "format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none" }
            ]
        });

        let info: MediaInfo = serde_json::from_value::<YtDlpInfo>(json).unwrap().into();
        assert_eq!(info.formats.len(), 3);

        assert!(info.formats[0].is_audio_only());
        assert_eq!(info.formats[0].size_mb(), Some(4.0));

        assert!(!info.formats[1].is_audio_only());
        assert_eq!(info.formats[1].content_length, Some(10_485_760));

        assert!(!info.formats[2].has_audio);
        assert!(info.formats[2].size_mb().is_none());
    }

    #[test]
    fn test_search_entry_builds_url_from_id() {
        let entry = YtDlpSearchEntry {
            id: Some("dQw4w9WgXcQ".into()),
            url: None,
            title: Some("Never Gonna Give You Up".into()),
        };
        let hit = entry.into_hit().unwrap();
        assert_eq!(hit.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");

        let empty = YtDlpSearchEntry {
            id: None,
            url: None,
            title: None,
        };
        assert!(empty.into_hit().is_none());
    }
}
