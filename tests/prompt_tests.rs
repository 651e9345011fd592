use chat_digest::core::{FilteredMessage, RawMessage};
use chat_digest::prompt::{
    MAX_TRANSCRIPT_CHARS, SUMMARY_INSTRUCTION, build_prompt, build_transcript,
    truncate_transcript,
};
use chrono::NaiveDate;

fn filtered(meta: &str, text: &str) -> FilteredMessage {
    FilteredMessage {
        message: RawMessage::new(meta, text),
        timestamp: NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    }
}

#[test]
fn test_long_transcript_keeps_the_tail() {
    let head = "h".repeat(5_000);
    let tail = "t".repeat(MAX_TRANSCRIPT_CHARS);
    let transcript = format!("{head}{tail}");
    assert_eq!(transcript.chars().count(), 20_000);

    let truncated = truncate_transcript(&transcript, MAX_TRANSCRIPT_CHARS);
    assert_eq!(truncated.chars().count(), 15_000);
    assert_eq!(truncated, tail);
}

#[test]
fn test_short_transcript_is_unchanged() {
    let transcript = "x".repeat(10_000);
    assert_eq!(truncate_transcript(&transcript, MAX_TRANSCRIPT_CHARS), transcript);

    let exact = "y".repeat(MAX_TRANSCRIPT_CHARS);
    assert_eq!(truncate_transcript(&exact, MAX_TRANSCRIPT_CHARS), exact);
}

#[test]
fn test_truncation_counts_characters_not_bytes() {
    let transcript = "é".repeat(MAX_TRANSCRIPT_CHARS + 10);
    let truncated = truncate_transcript(&transcript, MAX_TRANSCRIPT_CHARS);
    assert_eq!(truncated.chars().count(), MAX_TRANSCRIPT_CHARS);
    assert!(truncated.chars().all(|c| c == 'é'));
}

#[test]
fn test_transcript_joins_meta_and_text_per_line() {
    let transcript = build_transcript(&[
        filtered("[09:00, 01/01/2025] Ann:", "hi"),
        filtered("[09:05, 01/01/2025] Bob:", "hello"),
    ]);
    assert_eq!(
        transcript,
        "[09:00, 01/01/2025] Ann: hi\n[09:05, 01/01/2025] Bob: hello"
    );
    assert_eq!(build_transcript(&[]), "");
}

#[test]
fn test_prompt_wraps_truncated_transcript() {
    let prompt = build_prompt("line one");
    assert_eq!(prompt, format!("{SUMMARY_INSTRUCTION}\n\nline one"));

    let long = format!("{}{}", "a".repeat(100), "b".repeat(MAX_TRANSCRIPT_CHARS));
    assert_eq!(
        build_prompt(&long),
        format!("{SUMMARY_INSTRUCTION}\n\n{}", "b".repeat(MAX_TRANSCRIPT_CHARS))
    );
}
