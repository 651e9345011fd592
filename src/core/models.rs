use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat name used when the page header could not be read.
pub const UNKNOWN_CHAT_NAME: &str = "Unknown Chat";

/// A message bubble as scraped from the page.
///
/// `meta` is the bubble's metadata attribute verbatim, e.g.
/// `"[11:30, 17/08/2025] John Doe:"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub meta: String,
    pub text: String,
}

impl RawMessage {
    pub fn new(meta: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            meta: meta.into(),
            text: text.into(),
        }
    }
}

/// A message whose timestamp placed it inside a requested range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredMessage {
    pub message: RawMessage,
    pub timestamp: NaiveDateTime,
}

impl FilteredMessage {
    #[must_use]
    pub fn meta(&self) -> &str {
        &self.message.meta
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.message.text
    }
}

impl From<FilteredMessage> for RawMessage {
    fn from(filtered: FilteredMessage) -> Self {
        filtered.message
    }
}

/// Everything the scraping side hands over for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedChat {
    pub chat_name: String,
    pub messages: Vec<RawMessage>,
}

/// How the bounds of a summary request are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Hour,
    Day,
    Custom,
}

impl FilterKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Hour => "hour",
            FilterKind::Day => "day",
            FilterKind::Custom => "custom",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(FilterKind::Hour),
            "day" => Ok(FilterKind::Day),
            "custom" => Ok(FilterKind::Custom),
            other => Err(format!("unknown filter kind: {other}")),
        }
    }
}

/// The range a user picked. Custom bounds stay optional here so that a
/// half-filled picker reaches range resolution and is rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSelection {
    Hour,
    Day,
    Custom {
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    },
}

impl FilterSelection {
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSelection::Hour => FilterKind::Hour,
            FilterSelection::Day => FilterKind::Day,
            FilterSelection::Custom { .. } => FilterKind::Custom,
        }
    }
}

/// One user-initiated summary request. Carries everything the pipeline
/// needs so no UI state is read from anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryRequest {
    pub selection: FilterSelection,
    /// Skip the cache lookup and always call the summarizer.
    pub refresh: bool,
}

impl SummaryRequest {
    #[must_use]
    pub fn new(selection: FilterSelection) -> Self {
        Self {
            selection,
            refresh: false,
        }
    }

    #[must_use]
    pub fn refreshed(mut self) -> Self {
        self.refresh = true;
        self
    }
}
