//! Size-gated streaming download into the temporary storage area.

use crate::error::{MediaError, MediaResult};
use crate::resolver::Resolver;
use crate::result::DownloadResult;
use crate::transcoder::AudioTranscoder;
use crate::types::{EncodingProfile, MediaFormat, MediaInfo, MediaStream};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use tracing::{error, info, instrument, warn};

static ILLEGAL_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]+"#).expect("valid filename regex"));

/// Provides metadata and raw streams for remote media.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch_info(&self, locator: &str) -> MediaResult<MediaInfo>;

    async fn open_stream(&self, locator: &str, format: &MediaFormat) -> MediaResult<MediaStream>;
}

/// Produces an audio file for a resolved locator.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn download_audio(&self, locator: &str, max_size_mb: f64) -> MediaResult<DownloadResult>;
}

/// Downloads media, transcodes it to MP3 and writes it to the temp dir.
pub struct DownloaderService {
    temp_dir: PathBuf,
    source: Arc<dyn MediaSource>,
    transcoder: Arc<dyn AudioTranscoder>,
    sequence: AtomicU64,
}

impl DownloaderService {
    /// Create the service, creating `temp_dir` if needed.
    pub fn new(
        temp_dir: impl AsRef<Path>,
        source: Arc<dyn MediaSource>,
        transcoder: Arc<dyn AudioTranscoder>,
    ) -> MediaResult<Self> {
        let temp_dir = temp_dir.as_ref();
        if !temp_dir.exists() {
            std::fs::create_dir_all(temp_dir)?;
            info!("Created temporary directory at: {}", temp_dir.display());
        }
        let temp_dir = std::fs::canonicalize(temp_dir)?;

        Ok(Self {
            temp_dir,
            source,
            transcoder,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    fn destination_for(&self, sanitized_title: &str, profile: EncodingProfile) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.temp_dir.join(format!(
            "{}-{}_{}.{}",
            millis, seq, sanitized_title, profile.extension
        ))
    }
}

#[async_trait]
impl AudioDownloader for DownloaderService {
    #[instrument(skip(self))]
    async fn download_audio(&self, locator: &str, max_size_mb: f64) -> MediaResult<DownloadResult> {
        info!("Starting download for: {}", locator);

        if !Resolver::is_media_url(locator) {
            return Err(MediaError::InvalidSource(locator.to_string()));
        }

        let info = self.source.fetch_info(locator).await?;
        let format = select_audio_format(&info.formats).ok_or(MediaError::NoSuitableFormat)?;

        match format.size_mb() {
            Some(size_mb) if size_mb > max_size_mb => {
                warn!("Rejecting {}: {:.2}MB > {}MB", locator, size_mb, max_size_mb);
                return Err(MediaError::TooLarge {
                    size_mb,
                    max_mb: max_size_mb,
                });
            }
            Some(_) => {}
            None => warn!(
                "Format {} of {} declares no size, skipping size check",
                format.id, locator
            ),
        }

        let profile = EncodingProfile::MP3_128K;
        let title = sanitize_title(&info.title);
        let dest = self.destination_for(&title, profile);

        let stream = self.source.open_stream(locator, format).await?;
        if let Err(e) = self.transcoder.transcode(stream.reader, &dest, profile).await {
            error!("Conversion failed for {}: {}", locator, e);
            return Err(match e {
                MediaError::Transcode(_) => e,
                other => MediaError::Transcode(other.to_string()),
            });
        }
        stream.completion.await?;

        info!("Created: {}", dest.display());
        Ok(DownloadResult::new(dest, title))
    }
}

/// Pick the audio-only format with the highest audio bitrate.
pub fn select_audio_format(formats: &[MediaFormat]) -> Option<&MediaFormat> {
    formats
        .iter()
        .filter(|f| f.is_audio_only())
        .max_by(|a, b| {
            let a = a.audio_bitrate_kbps.unwrap_or(0.0);
            let b = b.audio_bitrate_kbps.unwrap_or(0.0);
            a.total_cmp(&b)
        })
}

/// Strip characters that are illegal in file names.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(title, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "audio".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio_test::assert_ok;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn audio(id: &str, abr: f64, bytes: Option<u64>) -> MediaFormat {
        MediaFormat {
            id: id.into(),
            ext: "webm".into(),
            has_audio: true,
            has_video: false,
            audio_bitrate_kbps: Some(abr),
            content_length: bytes,
        }
    }

    fn muxed(id: &str, abr: f64) -> MediaFormat {
        MediaFormat {
            has_video: true,
            ..audio(id, abr, Some(1024))
        }
    }

    struct FakeSource {
        info: MediaInfo,
        payload: Vec<u8>,
        interrupted: bool,
        info_calls: AtomicUsize,
        opened: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(title: &str, formats: Vec<MediaFormat>) -> Self {
            Self {
                info: MediaInfo {
                    title: title.into(),
                    formats,
                },
                payload: b"fake-audio-payload".to_vec(),
                interrupted: false,
                info_calls: AtomicUsize::new(0),
                opened: Mutex::new(Vec::new()),
            }
        }

        fn opened(&self) -> Vec<String> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MediaSource for FakeSource {
        async fn fetch_info(&self, _locator: &str) -> MediaResult<MediaInfo> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.info.clone())
        }

        async fn open_stream(&self, _locator: &str, format: &MediaFormat) -> MediaResult<MediaStream> {
            self.opened.lock().unwrap().push(format.id.clone());
            let mut stream = MediaStream::from_reader(std::io::Cursor::new(self.payload.clone()));
            if self.interrupted {
                stream.completion =
                    Box::pin(async { Err(MediaError::Transcode("connection reset".into())) });
            }
            Ok(stream)
        }
    }

    /// Copies input bytes to the destination unchanged.
    struct CopyTranscoder {
        fail: bool,
    }

    #[async_trait]
    impl AudioTranscoder for CopyTranscoder {
        async fn transcode(
            &self,
            mut input: crate::types::ByteStream,
            dest: &Path,
            profile: EncodingProfile,
        ) -> MediaResult<()> {
            assert_eq!(profile.bitrate_kbps, 128);
            let mut bytes = Vec::new();
            input.read_to_end(&mut bytes).await?;
            tokio::fs::write(dest, &bytes).await?;
            if self.fail {
                return Err(MediaError::Transcode("encoder exploded".into()));
            }
            Ok(())
        }
    }

    fn service(dir: &TempDir, source: Arc<FakeSource>, fail: bool) -> DownloaderService {
        DownloaderService::new(dir.path(), source, Arc::new(CopyTranscoder { fail })).unwrap()
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn test_select_highest_audio_only() {
        let formats = vec![
            audio("139", 48.0, None),
            muxed("18", 320.0),
            audio("251", 160.0, None),
            audio("140", 128.0, None),
        ];
        assert_eq!(select_audio_format(&formats).unwrap().id, "251");
        assert!(select_audio_format(&[muxed("18", 96.0)]).is_none());
        assert!(select_audio_format(&[]).is_none());
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("AC/DC: Back In Black?"), "ACDC Back In Black");
        assert_eq!(sanitize_title(r#"a<>:"/\|?*b"#), "ab");
        assert_eq!(sanitize_title("Never Gonna Give You Up"), "Never Gonna Give You Up");
        assert_eq!(sanitize_title("???"), "audio");
    }

    #[test]
    fn test_new_creates_temp_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("temp");
        let source = Arc::new(FakeSource::new("x", vec![]));

        let service = DownloaderService::new(&nested, source, Arc::new(CopyTranscoder { fail: false }));

        assert_ok!(&service);
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_title_is_sanitized_for_display() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new(
            "AC/DC: Back In Black?",
            vec![audio("140", 128.0, Some(1024 * 1024))],
        ));
        let service = service(&dir, source, false);

        let result = service.download_audio(URL, 10.0).await.unwrap();

        assert_eq!(result.title(), "ACDC Back In Black");
        assert!(result.file_name().ends_with("_ACDC Back In Black.mp3"));
        result.release().await;
    }

    #[tokio::test]
    async fn test_successful_download() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new(
            "Rick Astley - Never Gonna Give You Up?",
            vec![audio("140", 128.0, Some(3 * 1024 * 1024)), audio("251", 160.0, Some(4 * 1024 * 1024))],
        ));
        let service = service(&dir, source.clone(), false);

        let result = service.download_audio(URL, 10.0).await.unwrap();

        assert_eq!(result.title(), "Rick Astley - Never Gonna Give You Up");
        assert_eq!(source.opened(), vec!["251".to_string()]);

        let path = result.file_path().to_path_buf();
        assert!(path.starts_with(service.temp_dir()));
        let name = result.file_name();
        assert!(name.ends_with("_Rick Astley - Never Gonna Give You Up.mp3"), "{name}");
        assert_eq!(std::fs::read(&path).unwrap(), b"fake-audio-payload");

        result.release().await;
        assert!(!path.exists());
        result.release().await;
    }

    #[tokio::test]
    async fn test_same_title_gets_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new("Song", vec![audio("251", 160.0, Some(1024))]));
        let service = service(&dir, source, false);

        let first = service.download_audio(URL, 10.0).await.unwrap();
        let second = service.download_audio(URL, 10.0).await.unwrap();

        assert_ne!(first.file_path(), second.file_path());
        assert_eq!(files_in(dir.path()).len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_source_makes_no_calls() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new("Song", vec![audio("251", 160.0, Some(1024))]));
        let service = service(&dir, source.clone(), false);

        let result = service.download_audio("https://vimeo.com/123", 10.0).await;

        assert!(matches!(result, Err(MediaError::InvalidSource(_))));
        assert_eq!(source.info_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_audio_only_format() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new("Song", vec![muxed("18", 96.0)]));
        let service = service(&dir, source.clone(), false);

        let result = service.download_audio(URL, 10.0).await;

        assert!(matches!(result, Err(MediaError::NoSuitableFormat)));
        assert!(source.opened().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_rejected_before_streaming() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new(
            "Long Mix",
            vec![audio("251", 160.0, Some(150 * 1024 * 1024))],
        ));
        let service = service(&dir, source.clone(), false);

        let result = service.download_audio(URL, 100.0).await;

        match result {
            Err(MediaError::TooLarge { size_mb, max_mb }) => {
                assert_eq!(size_mb, 150.0);
                assert_eq!(max_mb, 100.0);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
        assert!(source.opened().is_empty());
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_size_passes_gate() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new("Live", vec![audio("251", 160.0, None)]));
        let service = service(&dir, source, false);

        let result = service.download_audio(URL, 1.0).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_encoder_failure_is_transcode_error() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(FakeSource::new("Song", vec![audio("251", 160.0, Some(1024))]));
        let service = service(&dir, source, true);

        let result = service.download_audio(URL, 10.0).await;

        assert!(matches!(result, Err(MediaError::Transcode(_))));
        // Partial output is left for the retention sweeper.
        assert_eq!(files_in(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_interrupted_stream_is_transcode_error() {
        let dir = TempDir::new().unwrap();
        let mut fake = FakeSource::new("Song", vec![audio("251", 160.0, Some(1024))]);
        fake.interrupted = true;
        let service = service(&dir, Arc::new(fake), false);

        let result = service.download_audio(URL, 10.0).await;

        assert!(matches!(result, Err(MediaError::Transcode(_))));
    }
}
