//! Application configuration loaded from environment variables.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "fatal", "silent"];

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and command parsing
    #[serde(default)]
    pub bot: BotConfig,

    /// Download pipeline configuration
    #[serde(default)]
    pub media: MediaConfig,

    /// Signal configuration
    #[serde(default)]
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Display name used in help and status output
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Command prefix (e.g., "!")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Read commands from stdin instead of Signal
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub test_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Largest accepted download, in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,

    /// Temporary storage area for transcoded files
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Age after which leftover files are swept
    #[serde(default = "default_retention", with = "humantime_serde")]
    pub retention: Duration,

    /// Time between retention sweeps
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,

    /// yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Signal CLI REST API endpoint
    #[serde(default = "default_signal_service")]
    pub service_url: String,

    /// Bot account phone number
    #[serde(default)]
    pub phone_number: Option<String>,

    /// Poll interval for messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Wait after a failed poll before trying again
    #[serde(default = "default_error_backoff", with = "humantime_serde")]
    pub error_backoff: Duration,
}

// Default implementations
impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            prefix: default_prefix(),
            log_level: default_log_level(),
            test_mode: false,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            temp_dir: default_temp_dir(),
            retention: default_retention(),
            sweep_interval: default_sweep_interval(),
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            service_url: default_signal_service(),
            phone_number: None,
            poll_interval: default_poll_interval(),
            error_backoff: default_error_backoff(),
        }
    }
}

// Default value functions
fn default_bot_name() -> String {
    "Media Bot".into()
}

fn default_prefix() -> String {
    "!".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_max_file_size_mb() -> f64 {
    100.0
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_retention() -> Duration {
    media_fetch::DEFAULT_MAX_AGE
}

fn default_sweep_interval() -> Duration {
    media_fetch::DEFAULT_INTERVAL
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_signal_service() -> String {
    "http://signal-api:8080".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_error_backoff() -> Duration {
    Duration::from_secs(5)
}

/// Accepts `true`/`false` in any case; environment values arrive as strings.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

impl BotConfig {
    /// Tracing filter directive for the configured level.
    pub fn log_directive(&self) -> &str {
        match self.log_level.as_str() {
            "fatal" => "error",
            "silent" => "off",
            other => other,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `force_test_mode` comes from the `--test` flag and wins over the environment.
    pub fn load(force_test_mode: bool) -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Keep "+1555..." phone numbers as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        if force_test_mode {
            config.bot.test_mode = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot.prefix.trim().is_empty() {
            bail!("BOT__PREFIX must not be empty");
        }
        if self.bot.prefix.chars().any(char::is_whitespace) {
            bail!("BOT__PREFIX must not contain whitespace");
        }
        if !LOG_LEVELS.contains(&self.bot.log_level.as_str()) {
            bail!(
                "BOT__LOG_LEVEL must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.bot.log_level
            );
        }
        if !self.media.max_file_size_mb.is_finite() || self.media.max_file_size_mb <= 0.0 {
            bail!(
                "MEDIA__MAX_FILE_SIZE_MB must be a positive number, got {}",
                self.media.max_file_size_mb
            );
        }
        if self.media.temp_dir.as_os_str().is_empty() {
            bail!("MEDIA__TEMP_DIR must not be empty");
        }
        if self.media.retention.is_zero() || self.media.sweep_interval.is_zero() {
            bail!("MEDIA__RETENTION and MEDIA__SWEEP_INTERVAL must be non-zero");
        }
        if !self.bot.test_mode {
            if self.signal.poll_interval.is_zero() {
                bail!("SIGNAL__POLL_INTERVAL must be non-zero");
            }
            if self.signal.error_backoff.is_zero() {
                bail!("SIGNAL__ERROR_BACKOFF must be non-zero");
            }
            if self
                .signal
                .phone_number
                .as_deref()
                .map_or(true, |n| n.trim().is_empty())
            {
                bail!("SIGNAL__PHONE_NUMBER is required unless running with --test");
            }
        }
        Ok(())
    }

    /// Settings shown by the config command. The phone number is left out.
    pub fn display_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("BOT_NAME", self.bot.name.clone()),
            ("PREFIX", self.bot.prefix.clone()),
            ("LOG_LEVEL", self.bot.log_level.clone()),
            ("TEST_MODE", self.bot.test_mode.to_string()),
            ("MAX_FILE_SIZE_MB", self.media.max_file_size_mb.to_string()),
            ("TEMP_DIR", self.media.temp_dir.display().to_string()),
            (
                "RETENTION",
                humantime::format_duration(self.media.retention).to_string(),
            ),
            (
                "SWEEP_INTERVAL",
                humantime::format_duration(self.media.sweep_interval).to_string(),
            ),
            ("SIGNAL_SERVICE_URL", self.signal.service_url.clone()),
        ]
    }
}
