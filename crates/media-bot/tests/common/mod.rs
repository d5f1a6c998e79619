//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use media_bot::commands::default_groups;
use media_bot::config::{BotConfig, Config, MediaConfig, SignalConfig};
use media_bot::dispatcher::Dispatcher;
use media_bot::registry::CommandRegistry;
use media_bot::transport::{ChatTransport, MemoryTransport};
use media_fetch::{AudioDownloader, DownloadResult, MediaResult, Resolver, SearchHit, VideoSearch};
use mockall::mock;
use signal_client::BotMessage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SENDER: &str = "+14155551234";

mock! {
    pub Downloader {}

    #[async_trait]
    impl AudioDownloader for Downloader {
        async fn download_audio(&self, locator: &str, max_size_mb: f64) -> MediaResult<DownloadResult>;
    }
}

mock! {
    pub Search {}

    #[async_trait]
    impl VideoSearch for Search {
        async fn search(&self, query: &str) -> MediaResult<Vec<SearchHit>>;
    }
}

/// Test-mode configuration pointing at `temp_dir`.
pub fn test_config(temp_dir: &Path) -> Config {
    Config {
        bot: BotConfig {
            name: "Test Bot".into(),
            test_mode: true,
            ..BotConfig::default()
        },
        media: MediaConfig {
            temp_dir: temp_dir.to_path_buf(),
            ..MediaConfig::default()
        },
        signal: SignalConfig::default(),
    }
}

/// Dispatcher over the built-in commands, replying into a [`MemoryTransport`].
pub fn bot(
    config: &Config,
    search: MockSearch,
    downloader: MockDownloader,
) -> (Dispatcher, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let dispatcher = bot_with_transport(config, search, downloader, transport.clone());
    (dispatcher, transport)
}

pub fn bot_with_transport(
    config: &Config,
    search: MockSearch,
    downloader: MockDownloader,
    transport: Arc<dyn ChatTransport>,
) -> Dispatcher {
    let resolver = Resolver::new(Arc::new(search));
    let registry = CommandRegistry::load(default_groups(config, resolver, Arc::new(downloader)));
    Dispatcher::new(&config.bot.prefix, Arc::new(registry), transport)
}

/// A message from the test user.
pub fn message(text: &str) -> BotMessage {
    BotMessage::direct(SENDER, text, chrono::Utc::now().timestamp_millis())
}

/// Write a small stand-in for a transcoded file.
pub fn fake_mp3(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"ID3fake-mp3-bytes").unwrap();
    path
}
