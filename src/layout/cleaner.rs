//! Text normalization for extracted runs and table cells.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Normalize raw extracted text.
///
/// Unicode line separators become newlines, paragraph separators become
/// blank lines, every non-printable character other than `\n` and `\t`
/// becomes a space, and all whitespace runs (newlines included) collapse to
/// a single space. The result is trimmed; text with nothing printable left
/// yields an empty string.
///
/// `clean(&clean(s)) == clean(s)` holds for every input.
///
/// # Example
///
/// ```
/// use pagemark::layout::clean;
///
/// assert_eq!(clean("  Hello\u{0007}\u{2028}world  "), "Hello world");
/// assert_eq!(clean("\u{200B}\u{0000}"), "");
/// ```
pub fn clean(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\u{2028}' => buf.push('\n'),
            '\u{2029}' => buf.push_str("\n\n"),
            '\n' | '\t' => buf.push(c),
            c if is_printable(c) => buf.push(c),
            _ => buf.push(' '),
        }
    }

    buf.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize raw bytes, dropping invalid UTF-8 sequences first.
pub fn clean_bytes(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => clean(s),
        Err(_) => {
            log::warn!("Dropping invalid UTF-8 sequences from {} bytes of text", raw.len());
            clean(&decode_dropping_invalid(raw))
        }
    }
}

fn decode_dropping_invalid(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    None => break,
                }
            }
        }
    }
    out
}

/// Everything except control, format, surrogate, private-use and
/// unassigned code points, and separators other than the ASCII space.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(
        get_general_category(c),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::Surrogate
            | GeneralCategory::PrivateUse
            | GeneralCategory::Unassigned
            | GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
    )
}
