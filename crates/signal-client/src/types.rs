//! Signal API types.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Incoming Signal message.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub envelope: Envelope,
    pub account: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub source: String,
    #[serde(rename = "sourceName")]
    pub source_name: Option<String>,
    /// Send time in milliseconds since the epoch.
    pub timestamp: i64,
    #[serde(rename = "dataMessage")]
    pub data_message: Option<DataMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataMessage {
    pub message: Option<String>,
    pub timestamp: i64,
    #[serde(rename = "groupInfo")]
    pub group_info: Option<GroupInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupInfo {
    #[serde(rename = "groupId")]
    pub group_id: String,
}

/// Outgoing message request for `POST /v2/send`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub number: String,
    pub recipients: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base64_attachments: Vec<String>,
}

/// A file to send alongside a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    /// Read a file from disk, guessing the content type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".into());
        let content_type = content_type_for(path).to_string();

        Ok(Self {
            filename,
            content_type,
            data,
        })
    }

    /// Encode as the data URI format signal-cli-rest-api expects.
    pub fn to_data_uri(&self) -> String {
        // `;` would end the filename parameter early.
        let filename = self.filename.replace(';', "_");
        format!(
            "data:{};filename={};base64,{}",
            self.content_type,
            filename,
            BASE64.encode(&self.data)
        )
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// The sender.
    pub source: String,
    /// The message text.
    pub text: String,
    /// Send time in milliseconds since the epoch.
    pub timestamp: i64,
    /// Group ID if this is a group message.
    pub group_id: Option<String>,
}

impl BotMessage {
    /// Build a direct message, as used by local drivers and tests.
    pub fn direct(source: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            timestamp,
            group_id: None,
        }
    }

    /// Extract bot message from incoming envelope.
    pub fn from_incoming(msg: &IncomingMessage) -> Option<Self> {
        let data = msg.envelope.data_message.as_ref()?;
        let text = data.message.clone()?;

        Some(Self {
            source: msg.envelope.source.clone(),
            text,
            timestamp: msg.envelope.timestamp,
            group_id: data.group_info.as_ref().map(|g| g.group_id.clone()),
        })
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Get the reply target (group ID or source number).
    pub fn reply_target(&self) -> &str {
        self.group_id.as_deref().unwrap_or(&self.source)
    }
}
