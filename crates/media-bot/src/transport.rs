//! Chat transport seam: the only way commands talk back to users.

use crate::error::AppResult;
use async_trait::async_trait;
use signal_client::{Attachment, BotMessage, SignalClient};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// Options for sending media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Send as a generic file rather than an inline player/preview.
    pub as_document: bool,
}

/// A file on disk to attach to a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub path: PathBuf,
    pub caption: Option<String>,
}

/// One outgoing reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Media {
        attachment: MediaAttachment,
        options: SendOptions,
    },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn document(path: impl Into<PathBuf>) -> Self {
        Reply::Media {
            attachment: MediaAttachment {
                path: path.into(),
                caption: None,
            },
            options: SendOptions { as_document: true },
        }
    }

    /// Text content, if this is a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            Reply::Media { .. } => None,
        }
    }
}

/// Sends replies to whoever sent `original`.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn reply(&self, original: &BotMessage, reply: Reply) -> AppResult<()>;
}

#[async_trait]
impl ChatTransport for SignalClient {
    async fn reply(&self, original: &BotMessage, reply: Reply) -> AppResult<()> {
        match reply {
            Reply::Text(text) => SignalClient::reply(self, original, &text).await?,
            // Signal delivers every attachment as a file, so `as_document` needs no mapping.
            Reply::Media { attachment, .. } => {
                let file = Attachment::from_path(&attachment.path).await?;
                let caption = attachment.caption.unwrap_or_default();
                self.reply_with_attachment(original, &caption, &file).await?;
            }
        }
        Ok(())
    }
}

/// Writes replies as console lines.
pub struct ConsoleTransport {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleTransport {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Write one line of console output.
    pub fn print(&self, line: &str) -> std::io::Result<()> {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "{}", line)?;
        out.flush()
    }

    /// Write a prompt without a trailing newline.
    pub fn prompt(&self, prompt: &str) -> std::io::Result<()> {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        write!(out, "{}", prompt)?;
        out.flush()
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn reply(&self, _original: &BotMessage, reply: Reply) -> AppResult<()> {
        let line = match reply {
            Reply::Text(text) => format!("[BOT REPLIED]: {}", text),
            Reply::Media { attachment, options } => format!(
                "[BOT SENT FILE]: {}{}",
                attachment.path.display(),
                if options.as_document { " (document)" } else { "" }
            ),
        };
        self.print(&line)?;
        Ok(())
    }
}

/// A reply captured by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub target: String,
    pub reply: Reply,
    /// For media replies: whether the file existed when it was sent.
    pub file_present: bool,
}

/// Keeps replies in memory instead of sending them.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentReply>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.sent().into_iter().map(|s| s.reply).collect()
    }

    /// Text replies only, in order.
    pub fn texts(&self) -> Vec<String> {
        self.replies()
            .iter()
            .filter_map(|r| r.as_text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn reply(&self, original: &BotMessage, reply: Reply) -> AppResult<()> {
        let file_present = match &reply {
            Reply::Media { attachment, .. } => attachment.path.exists(),
            Reply::Text(_) => false,
        };
        debug!("Captured reply to {}: {:?}", original.reply_target(), reply);
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentReply {
                target: original.reply_target().to_string(),
                reply,
                file_present,
            });
        Ok(())
    }
}
