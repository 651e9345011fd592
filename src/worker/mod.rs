//! Request orchestration: scrape, cache, filter, summarize

pub mod summarize;

pub use summarize::{SummaryOutcome, SummaryPipeline};

/// Shown when the chat had messages but none fell inside the requested range.
pub const NO_MESSAGES_IN_RANGE_MESSAGE: &str =
    "No messages found in the selected time range. Check the logs for parsing errors.";
