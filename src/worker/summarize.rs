use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::ai::Summarizer;
use crate::cache::{CacheEntry, CacheKey, SummaryCache};
use crate::core::clock::Clock;
use crate::core::models::SummaryRequest;
use crate::errors::DigestError;
use crate::prompt::build_transcript;
use crate::source::MessageSource;
use crate::timestamp::TimestampParser;
use crate::utils::filters::{TimeRange, filter_messages};

use super::NO_MESSAGES_IN_RANGE_MESSAGE;

/// What one summary request ended with. Every variant is something to show
/// the user; none of them is retried.
#[derive(Debug)]
pub enum SummaryOutcome {
    Cached {
        chat_name: String,
        entry: CacheEntry,
    },
    Summarized {
        chat_name: String,
        summary: String,
        message_count: usize,
    },
    NoMessagesScraped {
        reason: String,
    },
    NoMessagesInRange {
        chat_name: String,
        scraped: usize,
    },
    InvalidInput {
        message: String,
    },
    Failed {
        chat_name: Option<String>,
        error: DigestError,
    },
}

impl SummaryOutcome {
    #[must_use]
    pub fn chat_name(&self) -> Option<&str> {
        match self {
            SummaryOutcome::Cached { chat_name, .. }
            | SummaryOutcome::Summarized { chat_name, .. }
            | SummaryOutcome::NoMessagesInRange { chat_name, .. } => Some(chat_name),
            SummaryOutcome::Failed { chat_name, .. } => chat_name.as_deref(),
            SummaryOutcome::NoMessagesScraped { .. } | SummaryOutcome::InvalidInput { .. } => {
                None
            }
        }
    }

    /// Heading for the result area, e.g. `Summary for: Family`.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.chat_name().map(|name| format!("Summary for: {name}"))
    }

    /// The text for the status/result area.
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            SummaryOutcome::Cached { entry, .. } => entry.display_text(),
            SummaryOutcome::Summarized { summary, .. } => summary.clone(),
            SummaryOutcome::NoMessagesScraped { reason } => format!("Error: {reason}"),
            SummaryOutcome::NoMessagesInRange { .. } => NO_MESSAGES_IN_RANGE_MESSAGE.to_string(),
            SummaryOutcome::InvalidInput { message } => message.clone(),
            SummaryOutcome::Failed { error, .. } => match error {
                DigestError::ApiError { .. } | DigestError::HttpError(_) => {
                    format!("Error calling Gemini API: {error}")
                }
                other => format!("An error occurred: {other}."),
            },
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SummaryOutcome::Cached { .. } | SummaryOutcome::Summarized { .. }
        )
    }
}

/// Sequences range resolution, scraping, cache lookup, filtering,
/// summarization and the cache write for one request.
pub struct SummaryPipeline {
    source: Arc<dyn MessageSource>,
    summarizer: Arc<dyn Summarizer>,
    cache: SummaryCache,
    parser: TimestampParser,
    clock: Arc<dyn Clock>,
}

impl SummaryPipeline {
    pub fn new(
        source: Arc<dyn MessageSource>,
        summarizer: Arc<dyn Summarizer>,
        cache: SummaryCache,
        parser: TimestampParser,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            summarizer,
            cache,
            parser,
            clock,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    pub async fn run(&self, request: &SummaryRequest) -> SummaryOutcome {
        let span = info_span!(
            "summary_request",
            correlation_id = %Uuid::new_v4(),
            filter = %request.selection.kind(),
            refresh = request.refresh,
        );
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &SummaryRequest) -> SummaryOutcome {
        let kind = request.selection.kind();
        let range = match TimeRange::resolve(&request.selection, self.clock.now_naive()) {
            Ok(range) => range,
            Err(e) => {
                info!("Rejected summary request: {}", e);
                return SummaryOutcome::InvalidInput {
                    message: match e {
                        DigestError::InputError(msg) => msg,
                        other => other.to_string(),
                    },
                };
            }
        };

        let chat = match self.source.fetch().await {
            Ok(chat) => chat,
            Err(DigestError::ScrapeError(reason)) => {
                info!("Scraper found no messages: {}", reason);
                return SummaryOutcome::NoMessagesScraped { reason };
            }
            Err(e) => {
                error!("Failed to fetch chat messages: {}", e);
                return SummaryOutcome::Failed {
                    chat_name: None,
                    error: e,
                };
            }
        };
        info!(
            "Fetched {} messages from chat {}",
            chat.messages.len(),
            chat.chat_name
        );

        let key = CacheKey::for_range(chat.chat_name.as_str(), kind, &range);
        if !request.refresh {
            match self.cache.get_key(&key).await {
                Ok(Some(entry)) => {
                    info!("Serving cached summary {}", key.storage_key());
                    return SummaryOutcome::Cached {
                        chat_name: chat.chat_name,
                        entry,
                    };
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup failed, continuing without it: {}", e),
            }
        }

        let filtered = filter_messages(&chat.messages, &range, &self.parser);
        if filtered.is_empty() {
            info!(
                "No messages between {} and {} out of {}",
                range.start(),
                range.end(),
                chat.messages.len()
            );
            return SummaryOutcome::NoMessagesInRange {
                chat_name: chat.chat_name,
                scraped: chat.messages.len(),
            };
        }

        let message_count = filtered.len();
        info!("Summarizing {} of {} messages", message_count, chat.messages.len());
        let transcript = build_transcript(&filtered);

        let summary = match self.summarizer.summarize(&transcript).await {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                return SummaryOutcome::Failed {
                    chat_name: Some(chat.chat_name),
                    error: DigestError::ApiError {
                        status: None,
                        message: "Summarizer returned an empty summary".to_string(),
                    },
                };
            }
            Err(e) => {
                error!("Failed to generate summary: {}", e);
                return SummaryOutcome::Failed {
                    chat_name: Some(chat.chat_name),
                    error: e,
                };
            }
        };

        if let Err(e) = self.cache.put_key(&key, &summary).await {
            warn!("Failed to cache summary {}: {}", key.storage_key(), e);
        }

        SummaryOutcome::Summarized {
            chat_name: chat.chat_name,
            summary,
            message_count,
        }
    }
}

