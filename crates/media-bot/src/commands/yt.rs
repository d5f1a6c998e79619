//! YouTube audio command - resolves a URL or search term and sends back an MP3.

use crate::commands::{Command, CommandContext};
use crate::error::{AppError, AppResult};
use crate::transport::Reply;
use async_trait::async_trait;
use media_fetch::{AudioDownloader, DownloadResult, Resolution, Resolver};
use signal_client::BotMessage;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub struct YtHandler {
    resolver: Resolver,
    downloader: Arc<dyn AudioDownloader>,
    max_size_mb: f64,
}

impl YtHandler {
    pub fn new(resolver: Resolver, downloader: Arc<dyn AudioDownloader>, max_size_mb: f64) -> Self {
        Self {
            resolver,
            downloader,
            max_size_mb,
        }
    }

    /// Turn the query into a locator, replying for the search, no-hit and failure cases.
    async fn locate(
        &self,
        message: &BotMessage,
        query: &str,
        ctx: &CommandContext,
    ) -> AppResult<Option<String>> {
        if !Resolver::is_media_url(query) {
            ctx.reply(message, format!("Searching YouTube for \"{}\"...", query))
                .await?;
        }

        match self.resolver.resolve(query).await {
            Ok(Resolution::Locator(locator)) => Ok(Some(locator)),
            Ok(Resolution::NoResults) => {
                ctx.reply(message, format!("No results found for \"{}\".", query))
                    .await?;
                Ok(None)
            }
            Err(e) => {
                error!("YouTube search failed: {}", e);
                ctx.reply(message, "YouTube search failed.").await?;
                Ok(None)
            }
        }
    }

    /// Announce and send the file. The caller releases it afterwards.
    async fn deliver(
        &self,
        message: &BotMessage,
        download: &DownloadResult,
        ctx: &CommandContext,
    ) -> AppResult<()> {
        ctx.reply(message, format!("🎵 Found: {}", download.title()))
            .await?;
        ctx.send(message, Reply::document(download.file_path()))
            .await
    }
}

#[async_trait]
impl Command for YtHandler {
    fn name(&self) -> &str {
        "yt"
    }

    fn description(&self) -> Option<&str> {
        Some("Downloads audio from a YouTube video (URL or search term).")
    }

    #[instrument(skip(self, message, ctx))]
    async fn execute(
        &self,
        message: &BotMessage,
        args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()> {
        let query = args.join(" ");
        let query = query.trim();
        if query.is_empty() {
            return ctx
                .reply(message, "Please provide a YouTube URL or a search term.")
                .await;
        }

        let Some(locator) = self.locate(message, query, ctx).await? else {
            return Ok(());
        };

        ctx.reply(message, "Starting download... this may take a moment.")
            .await?;

        let download = match self.downloader.download_audio(&locator, self.max_size_mb).await {
            Ok(download) => download,
            Err(e) => return report_failure(message, ctx, &AppError::from(e)).await,
        };

        // Release runs whether or not delivery worked.
        let delivered = self.deliver(message, &download, ctx).await;
        download.release().await;

        match delivered {
            Ok(()) => {
                info!("Delivered {:?} from {}", download.title(), locator);
                Ok(())
            }
            Err(e) => report_failure(message, ctx, &e).await,
        }
    }
}

/// Log the failure and tell the user what went wrong.
async fn report_failure(
    message: &BotMessage,
    ctx: &CommandContext,
    err: &AppError,
) -> AppResult<()> {
    error!("Failed to process YouTube download: {}", err);
    ctx.reply(message, format!("Error: {}", user_facing(err))).await
}

fn user_facing(err: &AppError) -> String {
    match err {
        AppError::Media(media) => media.to_string(),
        other => other.to_string(),
    }
}
