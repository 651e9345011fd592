//! Summarization backends

pub mod client;

// Re-export main types for convenience
pub use client::{GeminiClient, Summarizer};
