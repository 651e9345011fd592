use chrono::{DateTime, Duration, Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::store::KeyValueStore;
use crate::core::clock::Clock;
use crate::core::models::{FilterKind, UNKNOWN_CHAT_NAME};
use crate::errors::DigestError;
use crate::utils::filters::TimeRange;

/// How long a stored summary is served before it is treated as absent.
pub const FRESHNESS_WINDOW: Duration = Duration::minutes(10);

const KEY_PREFIX: &str = "summary_";
const BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Value layout under each key: `{ "summary": ..., "timestamp": <epoch millis> }`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSummary {
    summary: String,
    timestamp: i64,
}

/// Identifies one cached summary.
///
/// A key built with [`CacheKey::new`] is `summary_<chat>_<kind>`. Keys built with
/// [`CacheKey::for_range`] additionally carry the bounds of a custom range, so
/// two different custom ranges on the same chat do not share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    chat_identity: String,
    filter_kind: FilterKind,
    bounds: Option<TimeRange>,
}

impl CacheKey {
    pub fn new(chat_identity: impl Into<String>, filter_kind: FilterKind) -> Self {
        Self {
            chat_identity: chat_identity.into(),
            filter_kind,
            bounds: None,
        }
    }

    /// Presets roll with the clock, so only custom ranges keep their bounds.
    pub fn for_range(
        chat_identity: impl Into<String>,
        filter_kind: FilterKind,
        range: &TimeRange,
    ) -> Self {
        Self {
            chat_identity: chat_identity.into(),
            filter_kind,
            bounds: (filter_kind == FilterKind::Custom).then_some(*range),
        }
    }

    #[must_use]
    pub fn storage_key(&self) -> String {
        match &self.bounds {
            None => format!("{KEY_PREFIX}{}_{}", self.chat_identity, self.filter_kind),
            Some(range) => format!(
                "{KEY_PREFIX}{}_{}_{}_{}",
                self.chat_identity,
                self.filter_kind,
                range.start().format(BOUND_FORMAT),
                range.end().format(BOUND_FORMAT)
            ),
        }
    }

    /// Chats without a usable name are never cached.
    fn is_cacheable(&self) -> bool {
        let name = self.chat_identity.trim();
        !name.is_empty() && name != UNKNOWN_CHAT_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub chat_identity: String,
    pub filter_kind: FilterKind,
    pub summary_text: String,
    pub created_at: DateTime<Local>,
}

impl CacheEntry {
    /// The summary prefixed with the local time it was produced.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            "(Cached at {})\n\n{}",
            self.created_at.format("%H:%M:%S"),
            self.summary_text
        )
    }
}

/// Time-bounded summary cache over a [`KeyValueStore`].
///
/// Stale entries are never deleted; they are skipped on read and replaced by the
/// next write to the same key.
pub struct SummaryCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
}

impl SummaryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            freshness: FRESHNESS_WINDOW,
        }
    }

    /// Returns the live entry for `(chat_identity, filter_kind)`, if any.
    pub async fn get(
        &self,
        chat_identity: &str,
        filter_kind: FilterKind,
    ) -> Result<Option<CacheEntry>, DigestError> {
        self.get_key(&CacheKey::new(chat_identity, filter_kind)).await
    }

    /// Stores `summary_text` for `(chat_identity, filter_kind)`, stamped now.
    pub async fn put(
        &self,
        chat_identity: &str,
        filter_kind: FilterKind,
        summary_text: &str,
    ) -> Result<(), DigestError> {
        self.put_key(&CacheKey::new(chat_identity, filter_kind), summary_text)
            .await
    }

    pub async fn get_key(&self, key: &CacheKey) -> Result<Option<CacheEntry>, DigestError> {
        if !key.is_cacheable() {
            return Ok(None);
        }

        let storage_key = key.storage_key();
        let Some(value) = self.store.get(&storage_key).await? else {
            return Ok(None);
        };

        let stored: StoredSummary = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring malformed cache entry {}: {}", storage_key, e);
                return Ok(None);
            }
        };

        let Some(created_at) = Local.timestamp_millis_opt(stored.timestamp).single() else {
            warn!(
                "Ignoring cache entry {} with invalid timestamp {}",
                storage_key, stored.timestamp
            );
            return Ok(None);
        };

        let age = self.clock.now() - created_at;
        if age >= self.freshness {
            debug!(
                "Cache entry {} is stale ({}s old)",
                storage_key,
                age.num_seconds()
            );
            return Ok(None);
        }

        Ok(Some(CacheEntry {
            chat_identity: key.chat_identity.clone(),
            filter_kind: key.filter_kind,
            summary_text: stored.summary,
            created_at,
        }))
    }

    pub async fn put_key(&self, key: &CacheKey, summary_text: &str) -> Result<(), DigestError> {
        if !key.is_cacheable() {
            debug!("Not caching summary for unnamed chat");
            return Ok(());
        }

        let stored = StoredSummary {
            summary: summary_text.to_string(),
            timestamp: self.clock.now().timestamp_millis(),
        };
        self.store
            .set(&key.storage_key(), serde_json::to_value(stored)?)
            .await
    }
}
