//! Help command - lists available commands.

use crate::commands::{Command, CommandContext};
use crate::error::AppResult;
use crate::registry::CommandRegistry;
use async_trait::async_trait;
use signal_client::BotMessage;

pub struct HelpHandler {
    bot_name: String,
    prefix: String,
}

impl HelpHandler {
    pub fn new(bot_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            prefix: prefix.into(),
        }
    }

    /// Render the listing for every command that has a description.
    pub fn render(&self, commands: &CommandRegistry) -> String {
        let mut help = format!("*{} - Available Commands*\n\n", self.bot_name);
        for (name, command) in commands.iter() {
            if let Some(description) = command.description() {
                help.push_str(&format!("*{}{}*: {}\n", self.prefix, name, description));
            }
        }
        help.trim().to_string()
    }
}

#[async_trait]
impl Command for HelpHandler {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> Option<&str> {
        Some("Lists all available commands.")
    }

    async fn execute(
        &self,
        message: &BotMessage,
        _args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()> {
        ctx.reply(message, self.render(&ctx.commands)).await
    }
}
