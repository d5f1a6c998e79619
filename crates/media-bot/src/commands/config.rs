//! Config command - shows the running configuration.

use crate::commands::{Command, CommandContext};
use crate::error::AppResult;
use async_trait::async_trait;
use signal_client::BotMessage;

pub struct ConfigHandler {
    entries: Vec<(&'static str, String)>,
}

impl ConfigHandler {
    pub fn new(entries: Vec<(&'static str, String)>) -> Self {
        Self { entries }
    }

    pub fn render(&self) -> String {
        let mut text = String::from("*Current Bot Configuration*\n\n");
        for (key, value) in &self.entries {
            text.push_str(&format!("*{}*: ```{}```\n", key, value));
        }
        text.trim().to_string()
    }
}

#[async_trait]
impl Command for ConfigHandler {
    fn name(&self) -> &str {
        "config"
    }

    fn description(&self) -> Option<&str> {
        Some("Shows the current bot configuration.")
    }

    async fn execute(
        &self,
        message: &BotMessage,
        _args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()> {
        ctx.reply(message, self.render()).await
    }
}
