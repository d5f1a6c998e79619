//! Ping command - reports message latency.

use crate::commands::{Command, CommandContext};
use crate::error::AppResult;
use async_trait::async_trait;
use signal_client::BotMessage;

pub struct PingHandler;

impl PingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PingHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds between sending and `now_ms`. Clock skew never yields a negative value.
pub fn latency_ms(sent_at_ms: i64, now_ms: i64) -> i64 {
    (now_ms - sent_at_ms).max(0)
}

#[async_trait]
impl Command for PingHandler {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> Option<&str> {
        Some("Measures the bot's response time.")
    }

    async fn execute(
        &self,
        message: &BotMessage,
        _args: &[String],
        ctx: &CommandContext,
    ) -> AppResult<()> {
        let latency = latency_ms(message.timestamp, chrono::Utc::now().timestamp_millis());
        ctx.reply(message, format!("🏓 Pong! Latency: {}ms", latency))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandRegistry;
    use crate::transport::MemoryTransport;
    use std::sync::Arc;

    #[test]
    fn test_latency_never_negative() {
        assert_eq!(latency_ms(1_000, 3_500), 2_500);
        assert_eq!(latency_ms(5_000, 3_000), 0);
    }

    #[tokio::test]
    async fn test_pong_reports_latency() {
        let transport = Arc::new(MemoryTransport::new());
        let ctx = CommandContext::new(transport.clone(), Arc::new(CommandRegistry::default()));
        let sent_at = chrono::Utc::now().timestamp_millis() - 2_000;
        let message = BotMessage::direct("+1", "!ping", sent_at);

        PingHandler::new().execute(&message, &[], &ctx).await.unwrap();

        let texts = transport.texts();
        assert_eq!(texts.len(), 1);
        let latency: i64 = texts[0]
            .strip_prefix("🏓 Pong! Latency: ")
            .and_then(|rest| rest.strip_suffix("ms"))
            .unwrap()
            .parse()
            .unwrap();
        assert!(latency >= 2_000, "latency was {latency}");
    }
}
