//! Interactive console mode: stdin lines stand in for chat messages.

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::AppResult;
use crate::transport::ConsoleTransport;
use signal_client::BotMessage;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

/// Sender id used for console messages.
pub const CONSOLE_SENDER: &str = "console";

/// Read lines from `input` until EOF, dispatching each one inline.
pub async fn run_console<R>(
    dispatcher: &Dispatcher,
    console: Arc<ConsoleTransport>,
    input: R,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
{
    info!("Console mode: type commands, Ctrl-D to exit");
    let prompt = format!("{}> ", dispatcher.prefix());
    let mut lines = input.lines();

    loop {
        console.prompt(&prompt)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let message = BotMessage::direct(
            CONSOLE_SENDER,
            line,
            chrono::Utc::now().timestamp_millis(),
        );
        match dispatcher.dispatch(&message).await {
            DispatchOutcome::NotACommand => {
                console.print("Invalid command. Please start with the prefix.")?
            }
            DispatchOutcome::Unknown(_) => console.print("Unknown command.")?,
            DispatchOutcome::Empty
            | DispatchOutcome::Completed(_)
            | DispatchOutcome::Failed(_) => {}
        }
    }

    console.print("")?;
    info!("Console input closed");
    Ok(())
}
