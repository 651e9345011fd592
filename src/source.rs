//! The boundary with whatever scrapes the chat page
//!
//! The page-side script answers a `getMessages` request with either
//! `{ "chatName": ..., "messages": [{ "meta": ..., "text": ... }] }` or
//! `{ "error": ... }`. Everything here deals with that reply; nothing queries a DOM.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use url::Url;

use crate::core::models::{RawMessage, ScrapedChat, UNKNOWN_CHAT_NAME};
use crate::errors::DigestError;

/// Pages the scraper knows how to read.
pub const SUPPORTED_PAGE_PREFIX: &str = "https://web.whatsapp.com/";

pub const NO_MESSAGES_MESSAGE: &str =
    "Could not find any messages. Please ensure the chat is visible.";

pub const UNSUPPORTED_PAGE_MESSAGE: &str = "This extension only works on web.whatsapp.com.";

/// Supplies the messages of the chat currently on screen.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Returns the chat, or [`DigestError::ScrapeError`] when no message could be
    /// found. An `Ok` chat always has at least one message.
    async fn fetch(&self) -> Result<ScrapedChat, DigestError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentReply {
    Messages {
        #[serde(rename = "chatName", default)]
        chat_name: Option<String>,
        messages: Vec<RawMessage>,
    },
    Failure {
        error: String,
    },
}

impl ScrapedChat {
    /// Decodes the page script's reply.
    ///
    /// Bubbles without text are dropped; a reply with no messages left, or an
    /// explicit `error`, becomes [`DigestError::ScrapeError`].
    pub fn from_content_reply(reply: Value) -> Result<Self, DigestError> {
        let reply: ContentReply = serde_json::from_value(reply).map_err(|e| {
            DigestError::ScrapeError(format!(
                "Failed to extract messages. Ensure a chat is open. ({e})"
            ))
        })?;

        match reply {
            ContentReply::Failure { error } => Err(DigestError::ScrapeError(error)),
            ContentReply::Messages {
                chat_name,
                messages,
            } => {
                let messages: Vec<RawMessage> = messages
                    .into_iter()
                    .filter(|m| !m.text.trim().is_empty())
                    .map(|m| RawMessage::new(m.meta, m.text.trim()))
                    .collect();

                if messages.is_empty() {
                    return Err(DigestError::ScrapeError(NO_MESSAGES_MESSAGE.to_string()));
                }

                let chat_name = chat_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_CHAT_NAME.to_string());

                Ok(ScrapedChat {
                    chat_name,
                    messages,
                })
            }
        }
    }
}

/// Whether `url` is a page the scraper can read.
#[must_use]
pub fn is_supported_page(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    parsed.as_str().starts_with(SUPPORTED_PAGE_PREFIX)
}

/// Reads a page-script reply previously saved to disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MessageSource for JsonFileSource {
    async fn fetch(&self) -> Result<ScrapedChat, DigestError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DigestError::ScrapeError(format!("read {}: {e}", self.path.display()))
        })?;
        let reply: Value = serde_json::from_str(&raw).map_err(|e| {
            DigestError::ScrapeError(format!("{} is not JSON: {e}", self.path.display()))
        })?;
        let chat = ScrapedChat::from_content_reply(reply)?;
        info!(
            "Loaded {} messages for chat {} from {}",
            chat.messages.len(),
            chat.chat_name,
            self.path.display()
        );
        Ok(chat)
    }
}
