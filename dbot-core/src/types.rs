//! Wire-level types: inbound updates from the long-poll, their classification, and outbound messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Chat identifier as accepted by the Bot API: a numeric id or an `@channel` username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl ChatId {
    /// Parses a configured chat id: numeric strings become [`ChatId::Id`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Username(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(raw: &str) -> Self {
        ChatId::parse(raw)
    }
}

/// Chat as carried inside an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Message part of an update. Only the fields the dispatcher reads; the rest is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Inline-keyboard button press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<IncomingMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One entry of a `getUpdates` result. Unknown update kinds deserialize with both options empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<IncomingMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

/// An update discriminated by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Text { chat_id: ChatId, text: String },
    Callback { chat_id: ChatId, data: String },
    /// Anything else; carries the chat when the update had one.
    Unsupported { chat_id: Option<ChatId> },
}

impl InboundEvent {
    pub fn chat_id(&self) -> Option<&ChatId> {
        match self {
            InboundEvent::Text { chat_id, .. } | InboundEvent::Callback { chat_id, .. } => {
                Some(chat_id)
            }
            InboundEvent::Unsupported { chat_id } => chat_id.as_ref(),
        }
    }
}

impl Update {
    /// An update that carries only its id; it classifies as [`InboundEvent::Unsupported`].
    pub fn bare(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
            callback_query: None,
        }
    }

    /// Text message, callback with an originating message, or unsupported.
    pub fn classify(&self) -> InboundEvent {
        if let Some(message) = &self.message {
            let chat_id = ChatId::Id(message.chat.id);
            return match &message.text {
                Some(text) => InboundEvent::Text {
                    chat_id,
                    text: text.clone(),
                },
                None => InboundEvent::Unsupported {
                    chat_id: Some(chat_id),
                },
            };
        }
        if let Some(query) = &self.callback_query {
            if let Some(message) = &query.message {
                return InboundEvent::Callback {
                    chat_id: ChatId::Id(message.chat.id),
                    data: query.data.clone().unwrap_or_default(),
                };
            }
        }
        InboundEvent::Unsupported { chat_id: None }
    }
}

/// One inline keyboard button; `callback_data` comes back in the callback query when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

/// Reply markup: ordered rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyMarkup {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl ReplyMarkup {
    /// One button per row.
    pub fn single_column(buttons: Vec<InlineButton>) -> Self {
        Self {
            inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn button_count(&self) -> usize {
        self.inline_keyboard.iter().map(Vec::len).sum()
    }
}

/// Outbound message body (`sendMessage` payload).
///
/// `text` and `chat_id` are optional while a handler builds the message; the processor fills
/// them in before delivery. Fields not modelled here are kept in `extra` and sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<ChatId>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_parse_mode(mut self, parse_mode: impl Into<String>) -> Self {
        self.parse_mode = Some(parse_mode.into());
        self
    }

    pub fn with_reply_markup(mut self, reply_markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(reply_markup);
        self
    }

    pub fn text_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Fills a missing chat id and text (empty) so the message is deliverable.
    pub fn complete(mut self, fallback_chat: &ChatId) -> Self {
        if self.chat_id.is_none() {
            self.chat_id = Some(fallback_chat.clone());
        }
        if self.text.is_none() {
            self.text = Some(String::new());
        }
        self
    }
}
