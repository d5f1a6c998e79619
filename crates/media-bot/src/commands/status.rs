//! Status command - shows host and bot information.

use crate::commands::{Command, CommandContext};
use crate::error::AppResult;
use crate::system_info::SystemInfo;
use async_trait::async_trait;
use signal_client::BotMessage;

pub struct StatusHandler {
    bot_name: String,
}

impl StatusHandler {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }

    pub fn render(&self, info: &SystemInfo) -> String {
        format!(
            "*{} - System Status*\n\n\
             *Hostname*: {}\n\
             *OS*: {}\n\
             *CPU*: {} ({} cores)\n\
             *RAM (Free/Total)*: {} / {}\n\
             *Uptime*: {}\n\
             *Version*: {}\n\
             *Runtime*: {}",
            self.bot_name,
            info.hostname,
            info.os,
            info.cpu,
            info.cpu_cores,
            info.free_ram,
            info.total_ram,
            info.uptime,
            info.version,
            info.runtime,
        )
    }
}

#[async_trait]
impl Command for StatusHandler {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> Option<&str> {
        Some("Shows system and bot information.")
    }

    async fn execute(
        &self,
        message: &BotMessage,
        _args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()> {
        // sysinfo blocks while it reads /proc.
        let info = tokio::task::spawn_blocking(SystemInfo::collect)
            .await
            .map_err(|e| crate::error::AppError::Command(format!("status probe failed: {}", e)))?;
        ctx.reply(message, self.render(&info)).await
    }
}
