//! Routes inbound messages to registered commands.

use crate::commands::CommandContext;
use crate::registry::CommandRegistry;
use crate::transport::ChatTransport;
use signal_client::BotMessage;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reply sent when a command returns an error.
pub const FAILURE_REPLY: &str = "An error occurred while executing that command.";

/// A prefixed message split into command name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Lower-cased first token. Empty when the message is just the prefix.
    pub name: String,
    pub args: Vec<String>,
}

/// Split `text` into an invocation, or `None` if it lacks the prefix.
pub fn parse_invocation(prefix: &str, text: &str) -> Option<Invocation> {
    let rest = text.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next().map(str::to_lowercase).unwrap_or_default();

    Some(Invocation {
        name,
        args: tokens.map(String::from).collect(),
    })
}

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Text did not start with the prefix.
    NotACommand,
    /// Prefix with nothing after it.
    Empty,
    Unknown(String),
    Completed(String),
    Failed(String),
}

#[derive(Clone)]
pub struct Dispatcher {
    prefix: String,
    registry: Arc<CommandRegistry>,
    transport: Arc<dyn ChatTransport>,
}

impl Dispatcher {
    pub fn new(
        prefix: impl Into<String>,
        registry: Arc<CommandRegistry>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            registry,
            transport,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Run the command named in `message`, if any.
    ///
    /// Handler errors are logged and answered with [`FAILURE_REPLY`]; they never propagate.
    pub async fn dispatch(&self, message: &BotMessage) -> DispatchOutcome {
        let Some(invocation) = parse_invocation(&self.prefix, &message.text) else {
            return DispatchOutcome::NotACommand;
        };
        if invocation.name.is_empty() {
            return DispatchOutcome::Empty;
        }

        let Some(command) = self.registry.get(&invocation.name) else {
            debug!("Ignoring unknown command: {}", invocation.name);
            return DispatchOutcome::Unknown(invocation.name);
        };

        info!(
            "Executing command: {} with args: {:?}",
            invocation.name, invocation.args
        );

        let ctx = CommandContext::new(self.transport.clone(), self.registry.clone());
        match command.execute(message, &invocation.args, &ctx).await {
            Ok(()) => DispatchOutcome::Completed(invocation.name),
            Err(e) => {
                error!(
                    "Error executing command {} with args {:?}: {}",
                    invocation.name, invocation.args, e
                );
                if let Err(e) = ctx.reply(message, FAILURE_REPLY).await {
                    error!("Failed to send error reply: {}", e);
                }
                DispatchOutcome::Failed(invocation.name)
            }
        }
    }
}
