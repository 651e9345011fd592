//! Message filtering helpers

pub mod filters;

pub use filters::{TimeRange, filter_messages, parse_custom_bound};
