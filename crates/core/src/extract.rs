//! Code extraction from recognized text.
//!
//! A code is exactly six characters: three uppercase ASCII letters followed by
//! three ASCII digits (`ABC123`). OCR engines regularly read the letter `O` as
//! the digit `0`, so candidates whose prefix contains zeros are corrected
//! before being validated.
//!
//! # Example
//!
//! ```
//! use codeclip_core::extract::extract_code;
//!
//! let extraction = extract_code("  Party code: 0BC123\n");
//! assert_eq!(extraction.text, "Party code: 0BC123");
//! assert_eq!(extraction.code.unwrap().as_str(), "OBC123");
//! ```

use std::fmt;

/// Number of characters in a code.
pub const CODE_LEN: usize = 6;

/// Length of the letter prefix.
const PREFIX_LEN: usize = 3;

/// A validated six-character code.
///
/// The only way to obtain a `Code` is through [`Code::parse`] (or the
/// extractor, which uses it), so every value satisfies `[A-Z]{3}[0-9]{3}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code(String);

impl Code {
    /// Parses a string that must match the strict code pattern exactly.
    pub fn parse(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().collect();
        (chars.len() == CODE_LEN && is_strict(&chars)).then(|| Self(s.to_string()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of running the extractor over recognized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The recognized text, trimmed, for display.
    pub text: String,
    /// The first code found, if any.
    pub code: Option<Code>,
}

/// Extracts at most one code from OCR output.
///
/// Candidates matching `[A-Z0-9]{3}[0-9]{3}` are scanned left to right without
/// overlap; zeros in their prefix are turned into `O` and the first candidate
/// that then satisfies the strict pattern wins. If none does, the first strict
/// match in the uncorrected text is used. Never fails: no code is a normal
/// outcome.
pub fn extract_code(text: &str) -> Extraction {
    let chars: Vec<char> = text.chars().collect();

    let code = windows(&chars, is_loose)
        .map(correct_prefix)
        .find(|candidate| is_strict(candidate))
        .or_else(|| windows(&chars, is_strict).next().map(<[char]>::to_vec))
        .map(|candidate| Code(candidate.into_iter().collect()));

    Extraction {
        text: text.trim().to_string(),
        code,
    }
}

/// Leftmost-first, non-overlapping six-character windows accepted by `accept`.
fn windows<'a>(chars: &'a [char], accept: fn(&[char]) -> bool) -> impl Iterator<Item = &'a [char]> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos + CODE_LEN <= chars.len() {
            let window = &chars[pos..pos + CODE_LEN];
            if accept(window) {
                pos += CODE_LEN;
                return Some(window);
            }
            pos += 1;
        }
        None
    })
}

fn is_loose(window: &[char]) -> bool {
    let (prefix, digits) = window.split_at(PREFIX_LEN);
    prefix
        .iter()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        && digits.iter().all(char::is_ascii_digit)
}

fn is_strict(window: &[char]) -> bool {
    let (prefix, digits) = window.split_at(PREFIX_LEN);
    prefix.iter().all(char::is_ascii_uppercase) && digits.iter().all(char::is_ascii_digit)
}

fn correct_prefix(window: &[char]) -> Vec<char> {
    window
        .iter()
        .enumerate()
        .map(|(i, &c)| if i < PREFIX_LEN && c == '0' { 'O' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(text: &str) -> Option<String> {
        extract_code(text).code.map(|c| c.to_string())
    }

    #[test]
    fn returns_first_strict_code() {
        assert_eq!(code_of("XYZ012 foo ABC123"), Some("XYZ012".into()));
        assert_eq!(code_of("join ABC123 now"), Some("ABC123".into()));
    }

    #[test]
    fn corrects_zero_read_as_letter_o() {
        assert_eq!(code_of("0BC123"), Some("OBC123".into()));
        assert_eq!(code_of("code: A0C999"), Some("AOC999".into()));
        assert_eq!(code_of("000123"), Some("OOO123".into()));
    }

    #[test]
    fn only_prefix_zeros_are_corrected() {
        assert_eq!(code_of("F00100"), Some("FOO100".into()));
    }

    #[test]
    fn no_code_in_plain_text() {
        let extraction = extract_code("no code here");
        assert_eq!(extraction.code, None);
        assert_eq!(extraction.text, "no code here");
    }

    #[test]
    fn skips_candidates_with_other_digits_in_prefix() {
        assert_eq!(code_of("1AB234"), None);
        assert_eq!(code_of("1AB234 then XYZ789"), Some("XYZ789".into()));
    }

    #[test]
    fn lowercase_is_not_a_code() {
        assert_eq!(code_of("abc123"), None);
    }

    #[test]
    fn code_can_be_embedded_in_longer_tokens() {
        assert_eq!(code_of("xxABC1234"), Some("ABC123".into()));
    }

    #[test]
    fn text_is_trimmed_but_otherwise_unchanged() {
        let extraction = extract_code("\n  Lobby  QRS456 \n\n");
        assert_eq!(extraction.text, "Lobby  QRS456");
        assert_eq!(extraction.code.map(|c| c.to_string()), Some("QRS456".into()));
    }

    #[test]
    fn handles_multiline_and_non_ascii_text() {
        assert_eq!(code_of("código: ÄBC123\nQRS456"), Some("QRS456".into()));
        assert_eq!(code_of("ÖÖÖ"), None);
        assert_eq!(code_of(""), None);
    }

    #[test]
    fn parse_accepts_only_strict_codes() {
        assert!(Code::parse("ABC123").is_some());
        assert!(Code::parse("OBC123").is_some());
        assert!(Code::parse("0BC123").is_none());
        assert!(Code::parse("ABC12").is_none());
        assert!(Code::parse("ABC1234").is_none());
        assert!(Code::parse("ABCD12").is_none());
        assert!(Code::parse("abc123").is_none());
    }

    #[test]
    fn surfaced_codes_always_parse() {
        for text in ["0BC123", "XYZ012 foo", "00A000 B", "..Z0Z555.."] {
            let code = extract_code(text).code.expect("code");
            assert_eq!(Code::parse(code.as_str()), Some(code));
        }
    }
}
