use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chat_digest::ai::Summarizer;
use chat_digest::cache::{FRESHNESS_WINDOW, MemoryStore, SummaryCache};
use chat_digest::core::{
    FilterKind, FilterSelection, ManualClock, RawMessage, ScrapedChat, SummaryRequest,
};
use chat_digest::errors::DigestError;
use chat_digest::source::{MessageSource, NO_MESSAGES_MESSAGE};
use chat_digest::timestamp::TimestampParser;
use chat_digest::utils::filters::MISSING_BOUNDS_MESSAGE;
use chat_digest::worker::{NO_MESSAGES_IN_RANGE_MESSAGE, SummaryOutcome, SummaryPipeline};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};

struct FixedSource(Result<ScrapedChat, String>);

#[async_trait]
impl MessageSource for FixedSource {
    async fn fetch(&self) -> Result<ScrapedChat, DigestError> {
        self.0.clone().map_err(DigestError::ScrapeError)
    }
}

/// Records every transcript it is asked to summarize.
struct RecordingSummarizer {
    reply: Result<String, (u16, String)>,
    calls: AtomicUsize,
    transcripts: Mutex<Vec<String>>,
}

impl RecordingSummarizer {
    fn ok(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, DigestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().unwrap().push(transcript.to_string());
        self.reply
            .clone()
            .map_err(|(status, message)| DigestError::ApiError {
                status: Some(status),
                message,
            })
    }
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn chat() -> ScrapedChat {
    ScrapedChat {
        chat_name: "Family".to_string(),
        messages: vec![
            RawMessage::new("[09:00, 01/01/2025] Ann:", "hi"),
            RawMessage::new("[09:40, 01/01/2025] Bob:", "lunch?"),
            RawMessage::new("[23:00, 01/01/2025] Ann:", "bye"),
        ],
    }
}

struct Harness {
    pipeline: SummaryPipeline,
    summarizer: Arc<RecordingSummarizer>,
    clock: Arc<ManualClock>,
}

fn harness(source: FixedSource, summarizer: RecordingSummarizer) -> Harness {
    // "Now" is 10:00 on the day of the sample chat.
    let now = Local.from_local_datetime(&at(10, 0)).unwrap();
    let clock = Arc::new(ManualClock::new(now));
    let summarizer = Arc::new(summarizer);
    let cache = SummaryCache::new(Arc::new(MemoryStore::new()), clock.clone());
    let pipeline = SummaryPipeline::new(
        Arc::new(source),
        summarizer.clone(),
        cache,
        TimestampParser::default(),
        clock.clone(),
    );
    Harness {
        pipeline,
        summarizer,
        clock,
    }
}

#[tokio::test]
async fn test_summarizes_and_caches_on_miss() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("They said hi."));

    let outcome = h.pipeline.run(&SummaryRequest::new(FilterSelection::Hour)).await;
    match &outcome {
        SummaryOutcome::Summarized {
            chat_name,
            summary,
            message_count,
        } => {
            assert_eq!(chat_name, "Family");
            assert_eq!(summary, "They said hi.");
            assert_eq!(*message_count, 2);
        }
        other => panic!("expected Summarized, got {other:?}"),
    }
    assert_eq!(outcome.title().as_deref(), Some("Summary for: Family"));
    assert_eq!(
        h.summarizer.transcripts.lock().unwrap().as_slice(),
        ["[09:00, 01/01/2025] Ann: hi\n[09:40, 01/01/2025] Bob: lunch?"]
    );

    let cached = h.pipeline.cache().get("Family", FilterKind::Hour).await.unwrap();
    assert_eq!(cached.unwrap().summary_text, "They said hi.");
}

#[tokio::test]
async fn test_cache_hit_skips_summarizer() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let request = SummaryRequest::new(FilterSelection::Hour);

    h.pipeline.run(&request).await;
    let outcome = h.pipeline.run(&request).await;

    assert_eq!(h.summarizer.calls(), 1);
    match &outcome {
        SummaryOutcome::Cached { entry, .. } => assert_eq!(entry.summary_text, "S"),
        other => panic!("expected Cached, got {other:?}"),
    }
    assert!(outcome.status_text().starts_with("(Cached at "));
    assert!(outcome.status_text().ends_with("\n\nS"));
}

#[tokio::test]
async fn test_refresh_bypasses_cache() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let request = SummaryRequest::new(FilterSelection::Hour);

    h.pipeline.run(&request).await;
    let outcome = h.pipeline.run(&request.refreshed()).await;

    assert_eq!(h.summarizer.calls(), 2);
    assert!(matches!(outcome, SummaryOutcome::Summarized { .. }));
}

#[tokio::test]
async fn test_stale_cache_is_recomputed() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let request = SummaryRequest::new(FilterSelection::Day);

    h.pipeline.run(&request).await;
    h.clock.advance(FRESHNESS_WINDOW);
    let outcome = h.pipeline.run(&request).await;

    assert_eq!(h.summarizer.calls(), 2);
    assert!(matches!(outcome, SummaryOutcome::Summarized { .. }));
}

#[tokio::test]
async fn test_missing_custom_bound_never_reaches_summarizer() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let request = SummaryRequest::new(FilterSelection::Custom {
        start: Some(at(8, 0)),
        end: None,
    });

    let outcome = h.pipeline.run(&request).await;
    assert_eq!(h.summarizer.calls(), 0);
    match &outcome {
        SummaryOutcome::InvalidInput { message } => assert_eq!(message, MISSING_BOUNDS_MESSAGE),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_custom_ranges_do_not_share_cached_summaries() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let morning = SummaryRequest::new(FilterSelection::Custom {
        start: Some(at(8, 0)),
        end: Some(at(10, 0)),
    });
    let night = SummaryRequest::new(FilterSelection::Custom {
        start: Some(at(22, 0)),
        end: Some(at(23, 30)),
    });

    h.pipeline.run(&morning).await;
    let outcome = h.pipeline.run(&night).await;

    assert!(matches!(outcome, SummaryOutcome::Summarized { message_count: 1, .. }));
    assert_eq!(h.summarizer.calls(), 2);

    let again = h.pipeline.run(&morning).await;
    assert!(matches!(again, SummaryOutcome::Cached { .. }));
    assert_eq!(h.summarizer.calls(), 2);
}

#[tokio::test]
async fn test_no_messages_in_range_is_reported() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("S"));
    let request = SummaryRequest::new(FilterSelection::Custom {
        start: Some(at(12, 0)),
        end: Some(at(13, 0)),
    });

    let outcome = h.pipeline.run(&request).await;
    assert!(matches!(
        outcome,
        SummaryOutcome::NoMessagesInRange { scraped: 3, .. }
    ));
    assert_eq!(outcome.status_text(), NO_MESSAGES_IN_RANGE_MESSAGE);
    assert_eq!(h.summarizer.calls(), 0);
}

#[tokio::test]
async fn test_no_messages_scraped_is_reported() {
    let h = harness(
        FixedSource(Err(NO_MESSAGES_MESSAGE.to_string())),
        RecordingSummarizer::ok("S"),
    );

    let outcome = h.pipeline.run(&SummaryRequest::new(FilterSelection::Day)).await;
    assert!(matches!(outcome, SummaryOutcome::NoMessagesScraped { .. }));
    assert_eq!(outcome.status_text(), format!("Error: {NO_MESSAGES_MESSAGE}"));
    assert_eq!(outcome.title(), None);
}

#[tokio::test]
async fn test_upstream_failure_is_shown_and_not_cached() {
    let h = harness(
        FixedSource(Ok(chat())),
        RecordingSummarizer::failing(403, "API key not valid"),
    );

    let outcome = h.pipeline.run(&SummaryRequest::new(FilterSelection::Hour)).await;
    assert!(matches!(outcome, SummaryOutcome::Failed { .. }));
    assert_eq!(
        outcome.status_text(),
        "Error calling Gemini API: API Error (403): API key not valid"
    );
    assert!(
        h.pipeline
            .cache()
            .get("Family", FilterKind::Hour)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_empty_summary_is_a_failure() {
    let h = harness(FixedSource(Ok(chat())), RecordingSummarizer::ok("   "));

    let outcome = h.pipeline.run(&SummaryRequest::new(FilterSelection::Hour)).await;
    assert!(matches!(outcome, SummaryOutcome::Failed { .. }));
    assert!(!outcome.is_success());
}
