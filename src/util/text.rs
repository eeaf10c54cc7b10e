use std::borrow::Cow;

use thiserror::Error;

/// Number of words kept in an article preview
pub const PREVIEW_WORDS: usize = 25;

/// Longest frontend log message accepted from a client, in bytes.
pub const MAX_LOG_MESSAGE_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogMessageError {
    #[error("message must not be empty")]
    Empty,
    #[error("message exceeds {MAX_LOG_MESSAGE_LEN} bytes")]
    TooLong,
}

/// Validates a client-submitted log message and strips control characters.
///
/// Messages longer than [`MAX_LOG_MESSAGE_LEN`] bytes, and messages that are
/// blank once control characters are removed, are rejected.
pub fn clean_log_message(message: &str) -> Result<String, LogMessageError> {
    if message.len() > MAX_LOG_MESSAGE_LEN {
        return Err(LogMessageError::TooLong);
    }
    let cleaned = strip_control_chars(message);
    if cleaned.trim().is_empty() {
        return Err(LogMessageError::Empty);
    }
    Ok(cleaned.into_owned())
}

/// Builds a preview from the first `word_limit` whitespace-separated words.
///
/// Runs of whitespace (including newlines) collapse to single spaces, so the
/// preview is always one line.
///
/// # Examples
///
/// ```
/// use newsdesk::util::generate_preview;
///
/// assert_eq!(generate_preview("one  two\nthree four", 3), "one two three");
/// assert_eq!(generate_preview("short", 25), "short");
/// ```
pub fn generate_preview(text: &str, word_limit: usize) -> String {
    text.split_whitespace()
        .take(word_limit)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_stripped(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

/// Removes control characters and ANSI escape sequences from client text.
///
/// Frontend log messages arrive from browsers and end up in the server's
/// console log; escape sequences in them could rewrite the operator's
/// terminal. Strips CSI (`\x1b[` ... final byte), OSC (`\x1b]` ... BEL/ST),
/// bare ESC, DEL and C0 controls other than tab, newline and carriage return.
///
/// Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| is_stripped(b)) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;
    let mut run_start = 0;

    while i < len {
        let b = bytes[i];
        if !is_stripped(b) {
            i += 1;
            continue;
        }

        // Only ASCII bytes end a run, so the slice is on a char boundary
        out.push_str(&s[run_start..i]);

        if b == 0x1b && bytes.get(i + 1) == Some(&b'[') {
            i += 2;
            while i < len {
                let c = bytes[i];
                i += 1;
                if (0x40..=0x7e).contains(&c) {
                    break;
                }
            }
        } else if b == 0x1b && bytes.get(i + 1) == Some(&b']') {
            i += 2;
            while i < len {
                if bytes[i] == 0x07 {
                    i += 1;
                    break;
                }
                if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                    i += 2;
                    break;
                }
                i += 1;
            }
        } else {
            i += 1;
        }
        run_start = i;
    }
    out.push_str(&s[run_start.min(len)..]);

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_preview_truncates_to_limit() {
        let text = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let preview = generate_preview(&text, PREVIEW_WORDS);
        assert_eq!(preview.split(' ').count(), 25);
        assert!(preview.ends_with("25"));
    }

    #[test]
    fn test_preview_of_empty_text() {
        assert_eq!(generate_preview("", 25), "");
        assert_eq!(generate_preview("   \n\t ", 25), "");
    }

    #[test]
    fn test_preview_zero_limit() {
        assert_eq!(generate_preview("some words here", 0), "");
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_removes_controls_and_del() {
        assert_eq!(strip_control_chars("he\x00ll\x07o\x7f!"), "hello!");
    }

    #[test]
    fn test_strip_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_control_chars("\x1b]0;title\x07safe"), "safe");
        assert_eq!(strip_control_chars("\x1b]0;title\x1b\\safe"), "safe");
        assert_eq!(strip_control_chars("before\x1bafter"), "beforeafter");
    }

    #[test]
    fn test_strip_unterminated_csi_at_end() {
        assert_eq!(strip_control_chars("tail\x1b[12"), "tail");
    }

    #[test]
    fn test_clean_log_message() {
        assert_eq!(clean_log_message("oops \x1b[31m!").unwrap(), "oops !");
        assert_eq!(clean_log_message("   "), Err(LogMessageError::Empty));
        assert_eq!(clean_log_message("\x07\x1b[0m"), Err(LogMessageError::Empty));

        let at_limit = "a".repeat(MAX_LOG_MESSAGE_LEN);
        assert_eq!(clean_log_message(&at_limit).unwrap().len(), MAX_LOG_MESSAGE_LEN);
        let over = "a".repeat(MAX_LOG_MESSAGE_LEN + 1);
        assert_eq!(clean_log_message(&over), Err(LogMessageError::TooLong));
    }

    #[test]
    fn test_strip_keeps_unicode() {
        assert_eq!(strip_control_chars("日本語 \x1b[1m太字\x1b[0m"), "日本語 太字");
    }

    proptest! {
        #[test]
        fn prop_preview_never_exceeds_limit(text in ".{0,400}", limit in 0usize..40) {
            let preview = generate_preview(&text, limit);
            prop_assert!(preview.split_whitespace().count() <= limit);
        }

        #[test]
        fn prop_preview_is_prefix_of_words(text in "[a-z ]{0,200}") {
            let preview = generate_preview(&text, PREVIEW_WORDS);
            let words: Vec<&str> = text.split_whitespace().collect();
            let preview_words: Vec<&str> = preview.split_whitespace().collect();
            prop_assert_eq!(&words[..preview_words.len()], &preview_words[..]);
        }

        #[test]
        fn prop_stripped_text_has_no_controls(text in "\\PC{0,100}|[\\x00-\\x1f\\x7f]{0,20}") {
            let out = strip_control_chars(&text);
            prop_assert!(!out.bytes().any(is_stripped));
        }
    }
}
