//! chat-digest - summarizes a window of a web chat with Gemini.
//!
//! The crate holds the logic behind a "summarize this chat" action:
//! 1. Parse the `[time, date]` metadata scraped from each message bubble
//! 2. Keep the messages inside the requested window (last hour, last day, custom)
//! 3. Send the resulting transcript to Gemini for a summary
//! 4. Cache the summary per chat and window for ten minutes
//!
//! Scraping the page itself is left to a [`source::MessageSource`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chat_digest::ai::GeminiClient;
//! use chat_digest::cache::{JsonFileStore, SummaryCache};
//! use chat_digest::core::{FilterSelection, SummaryRequest, SystemClock};
//! use chat_digest::core::config::AppConfig;
//! use chat_digest::source::JsonFileSource;
//! use chat_digest::timestamp::TimestampParser;
//! use chat_digest::worker::SummaryPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     chat_digest::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let clock = Arc::new(SystemClock);
//!     let cache = SummaryCache::new(Arc::new(JsonFileStore::new(&config.cache_path)), clock.clone());
//!
//!     let pipeline = SummaryPipeline::new(
//!         Arc::new(JsonFileSource::new("reply.json")),
//!         Arc::new(GeminiClient::from_config(&config)),
//!         cache,
//!         TimestampParser::with_order(config.date_order),
//!         clock,
//!     );
//!
//!     let outcome = pipeline.run(&SummaryRequest::new(FilterSelection::Hour)).await;
//!     println!("{}", outcome.status_text());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod cache;
pub mod core;
pub mod errors;
pub mod prompt;
pub mod source;
pub mod timestamp;
pub mod utils;
pub mod worker;

pub use errors::DigestError;

/// Configure structured JSON logging.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this more than
/// once is harmless; later calls leave the first subscriber in place.
///
/// # Example
///
/// ```
/// chat_digest::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
