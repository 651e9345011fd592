//! Shared types, configuration and the time source

pub mod clock;
pub mod config;
pub mod models;

pub use clock::{Clock, ManualClock, SystemClock};
pub use models::{
    FilterKind, FilterSelection, FilteredMessage, RawMessage, ScrapedChat, SummaryRequest,
};
