use crate::core::models::FilteredMessage;

/// Instruction placed ahead of the transcript in every summarization request.
pub const SUMMARY_INSTRUCTION: &str = "Summarize this WhatsApp chat concisely...";

/// Maximum transcript length, in characters, sent to the summarizer.
pub const MAX_TRANSCRIPT_CHARS: usize = 15_000;

/// Renders filtered messages as one `"<meta> <text>"` line each.
#[must_use]
pub fn build_transcript(messages: &[FilteredMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{} {}", m.meta(), m.text()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keeps only the trailing `max_chars` characters of `transcript`.
///
/// The most recent messages are at the end, so the prefix is what gets dropped.
/// Counting is in `char`s so a multi-byte character is never split.
///
/// # Examples
///
/// ```
/// use chat_digest::prompt::truncate_transcript;
///
/// assert_eq!(truncate_transcript("abcdef", 3), "def");
/// assert_eq!(truncate_transcript("abc", 3), "abc");
/// ```
#[must_use]
pub fn truncate_transcript(transcript: &str, max_chars: usize) -> &str {
    let total = transcript.chars().count();
    if total <= max_chars {
        return transcript;
    }

    let skip = total - max_chars;
    match transcript.char_indices().nth(skip) {
        Some((idx, _)) => &transcript[idx..],
        None => "",
    }
}

/// The full text submitted to the model: instruction, blank line, transcript.
#[must_use]
pub fn build_prompt(transcript: &str) -> String {
    format!(
        "{SUMMARY_INSTRUCTION}\n\n{}",
        truncate_transcript(transcript, MAX_TRANSCRIPT_CHARS)
    )
}
