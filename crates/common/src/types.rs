// Message types exchanged with the chat transport.

use serde::{Deserialize, Serialize};

/// Command that asks the bot for its usage hint.
pub const START_COMMAND: &str = "/start";

/// One inbound chat message as delivered by the transport bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    /// Conversation the acknowledgment is sent back to.
    pub chat_id: i64,
    /// Sender identifier (user id or handle, transport-specific).
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Caption attached to a photo or document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl InboundMessage {
    pub fn text(chat_id: i64, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            sender: sender.into(),
            text: Some(text.into()),
            caption: None,
            attachment: None,
        }
    }

    /// True when the message is the `/start` command (optionally `/start@botname`).
    pub fn is_start_command(&self) -> bool {
        self.text
            .as_deref()
            .map(str::trim)
            .and_then(|text| text.split_whitespace().next())
            .is_some_and(|word| word == START_COMMAND || word.starts_with("/start@"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Document,
}

/// Binary payload of a photo or document. Bytes travel as base64 on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// Reply sent back to the conversation once a message has been handled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acknowledgment {
    pub chat_id: i64,
    pub ok: bool,
    pub text: String,
}

impl Acknowledgment {
    pub fn ok(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, ok: true, text: text.into() }
    }

    pub fn failed(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, ok: false, text: text.into() }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}
