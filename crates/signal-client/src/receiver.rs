//! Message receiver with polling.

use crate::client::SignalClient;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Message receiver that polls for new messages.
pub struct MessageReceiver {
    client: SignalClient,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl MessageReceiver {
    /// Create a new message receiver.
    pub fn new(client: SignalClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    /// Override how long to wait after a failed poll.
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Start receiving text messages as an async stream.
    ///
    /// Envelopes without text (receipts, typing indicators) are dropped.
    pub fn stream(self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            loop {
                match self.client.receive().await {
                    Ok(messages) => {
                        for msg in messages {
                            if let Some(bot_msg) = BotMessage::from_incoming(&msg) {
                                debug!("Received: {} from {}",
                                    bot_msg.text.chars().take(50).collect::<String>(),
                                    bot_msg.source
                                );
                                yield bot_msg;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        sleep(self.error_backoff).await;
                        continue;
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
