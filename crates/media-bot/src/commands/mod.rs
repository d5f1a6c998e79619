//! Bot command handlers.

mod config;
mod help;
mod ping;
mod status;
mod yt;

pub use config::ConfigHandler;
pub use help::HelpHandler;
pub use ping::PingHandler;
pub use status::StatusHandler;
pub use yt::YtHandler;

use crate::config::Config;
use crate::error::AppResult;
use crate::registry::{CommandGroup, CommandRegistry};
use crate::transport::{ChatTransport, Reply};
use async_trait::async_trait;
use media_fetch::{AudioDownloader, Resolver};
use signal_client::BotMessage;
use std::sync::Arc;

/// Command handler trait.
#[async_trait]
pub trait Command: Send + Sync {
    /// Command name, used as the dispatch key (e.g., "help").
    fn name(&self) -> &str;

    /// One-line description for the help listing. Commands without one are hidden.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Execute the command. Replies go through `ctx`.
    async fn execute(
        &self,
        message: &BotMessage,
        args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()>;
}

/// Per-invocation handles given to a command.
#[derive(Clone)]
pub struct CommandContext {
    pub transport: Arc<dyn ChatTransport>,
    pub commands: Arc<CommandRegistry>,
}

impl CommandContext {
    pub fn new(transport: Arc<dyn ChatTransport>, commands: Arc<CommandRegistry>) -> Self {
        Self {
            transport,
            commands,
        }
    }

    /// Send a text reply to the sender of `message`.
    pub async fn reply(&self, message: &BotMessage, text: impl Into<String>) -> AppResult<()> {
        self.transport.reply(message, Reply::text(text)).await
    }

    pub async fn send(&self, message: &BotMessage, reply: Reply) -> AppResult<()> {
        self.transport.reply(message, reply).await
    }
}

/// Built-in command table: the primary group, then the legacy group.
pub fn default_groups(
    config: &Config,
    resolver: Resolver,
    downloader: Arc<dyn AudioDownloader>,
) -> Vec<CommandGroup> {
    let primary: Vec<Arc<dyn Command>> = vec![
        Arc::new(HelpHandler::new(&config.bot.name, &config.bot.prefix)),
        Arc::new(PingHandler::new()),
        Arc::new(StatusHandler::new(&config.bot.name)),
        Arc::new(YtHandler::new(
            resolver,
            downloader,
            config.media.max_file_size_mb,
        )),
    ];

    let legacy: Vec<Arc<dyn Command>> = vec![Arc::new(ConfigHandler::new(
        config.display_entries(),
    ))];

    vec![
        CommandGroup::new("primary", primary),
        CommandGroup::new("legacy", legacy),
    ]
}
